//! Error types for sessions and storage backends.

use crate::Mode;
use derive_more::{Display, Error};
use tracing::instrument;

/// Reasons a session cannot be created or restarted.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    /// The mode key is not one of the declared modes.
    #[display("Unknown game mode '{key}' (expected solo, dupla, quarteto or grupinho)")]
    UnknownMode {
        /// The rejected key.
        key: String,
    },

    /// Wrong number of answers for the mode's board count.
    #[display("Mode {mode} needs {expected} answers, got {actual}")]
    AnswerCount {
        /// Mode being started.
        mode: Mode,
        /// Board count of the mode.
        expected: usize,
        /// Answers supplied.
        actual: usize,
    },

    /// An answer is not a word of the mode's length made of ASCII letters.
    #[display("Answer '{answer}' must be exactly {expected} ASCII letters")]
    InvalidAnswer {
        /// The rejected answer.
        answer: String,
        /// Word length of the mode.
        expected: usize,
    },
}

/// Storage backend failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Storage error: {} at {}:{}", message, file, line)]
pub struct StorageError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StorageError {
    /// Creates a new storage error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
