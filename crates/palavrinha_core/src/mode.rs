//! Game modes and the board geometry each one declares.

use crate::SessionError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::{instrument, warn};

const DEFAULT_ANSWERS: [&str; 8] = [
    "termo", "vasco", "termo", "termo", "termo", "vasco", "termo", "termo",
];

/// Named configuration selecting board count, row count and word length.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mode {
    /// One board, six rows.
    Solo,
    /// Two boards, seven rows.
    Dupla,
    /// Four boards, nine rows.
    Quarteto,
    /// Eight boards, ten rows.
    Grupinho,
}

impl Mode {
    /// Parses a mode key, rejecting anything outside the fixed set.
    #[instrument]
    pub fn parse(key: &str) -> Result<Self, SessionError> {
        Mode::from_str(key.trim()).map_err(|_| {
            warn!(key, "Unknown mode requested");
            SessionError::UnknownMode {
                key: key.to_string(),
            }
        })
    }

    /// Key used in persisted documents and on the command line.
    pub fn key(self) -> &'static str {
        self.into()
    }

    /// Board geometry for this mode.
    pub const fn config(self) -> ModeConfig {
        match self {
            Mode::Solo => ModeConfig::new(1, 6, 5),
            Mode::Dupla => ModeConfig::new(2, 7, 5),
            Mode::Quarteto => ModeConfig::new(4, 9, 5),
            Mode::Grupinho => ModeConfig::new(8, 10, 5),
        }
    }

    /// Built-in answers, one per board.
    pub fn default_answers(self) -> Vec<String> {
        DEFAULT_ANSWERS
            .iter()
            .cycle()
            .take(self.config().board_count())
            .map(|answer| answer.to_string())
            .collect()
    }
}

/// Declared geometry of a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModeConfig {
    board_count: usize,
    total_rows: usize,
    word_length: usize,
}

impl ModeConfig {
    /// Creates a mode configuration.
    pub const fn new(board_count: usize, total_rows: usize, word_length: usize) -> Self {
        Self {
            board_count,
            total_rows,
            word_length,
        }
    }

    /// Number of boards played simultaneously.
    pub const fn board_count(&self) -> usize {
        self.board_count
    }

    /// Number of guess rows per board.
    pub const fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Letters per word.
    pub const fn word_length(&self) -> usize {
        self.word_length
    }
}
