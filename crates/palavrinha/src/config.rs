//! Game configuration loaded from TOML.
//!
//! ```toml
//! db_path = "palavrinha.db"
//!
//! [reveal]
//! stagger_ms = 300
//! flip_ms = 1000
//!
//! [answers]
//! dupla = ["termo", "vasco"]
//! ```

use derive_getters::Getters;
use derive_more::{Display, Error};
use palavrinha_core::{Mode, RevealTiming};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "palavrinha.toml";

/// Top-level game configuration.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct GameConfig {
    /// SQLite file holding saved games.
    #[serde(default = "default_db_path")]
    db_path: String,

    /// Reveal animation timing.
    #[serde(default)]
    reveal: RevealConfig,

    /// Answers per mode key, one per board.
    #[serde(default)]
    answers: BTreeMap<String, Vec<String>>,
}

/// Per-cell reveal timing in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Delay between consecutive cells starting to flip.
    #[serde(default = "default_stagger_ms")]
    stagger_ms: u64,

    /// Duration of one cell flip.
    #[serde(default = "default_flip_ms")]
    flip_ms: u64,
}

fn default_db_path() -> String {
    "palavrinha.db".to_string()
}

fn default_stagger_ms() -> u64 {
    300
}

fn default_flip_ms() -> u64 {
    1000
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            stagger_ms: default_stagger_ms(),
            flip_ms: default_flip_ms(),
        }
    }
}

impl RevealConfig {
    /// Timing handed to reveal sequences.
    pub fn timing(&self) -> RevealTiming {
        RevealTiming::new(
            Duration::from_millis(self.stagger_ms),
            Duration::from_millis(self.flip_ms),
        )
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            reveal: RevealConfig::default(),
            answers: BTreeMap::new(),
        }
    }
}

impl GameConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        let mut answers = BTreeMap::new();
        for (key, words) in std::mem::take(&mut config.answers) {
            let mode = Mode::parse(&key).map_err(|e| ConfigError::new(e.to_string()))?;
            answers.insert(mode.key().to_string(), words);
        }
        config.answers = answers;
        info!(
            db_path = %config.db_path,
            modes_with_answers = config.answers.len(),
            "Config loaded"
        );
        Ok(config)
    }

    /// Loads `path` if given, else [`DEFAULT_CONFIG_FILE`] if present, else
    /// the defaults.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => {
                debug!("No config file; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Overrides the database path.
    pub fn with_db_path(mut self, db_path: impl Into<String>) -> Self {
        self.db_path = db_path.into();
        self
    }

    /// Configured answers for `mode`, falling back to the built-in ones.
    pub fn answers_for(&self, mode: Mode) -> Vec<String> {
        self.answers
            .get(mode.key())
            .cloned()
            .unwrap_or_else(|| mode.default_answers())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
