//! Palavrinha - word-guessing game application
//!
//! Wires the game engine in `palavrinha_core` to durable SQLite storage, a
//! TOML configuration file and a line-oriented terminal front end.
//!
//! # Architecture
//!
//! - **Config**: TOML settings for the database path, reveal timing and answers
//! - **Db**: diesel-backed key-value storage implementing the core `Storage` trait
//! - **Console**: line commands, text rendering and the play loop
//! - **Cli**: clap command definitions

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod cli;
mod config;
mod console;
mod db;

// Crate-level exports - Command line
pub use cli::{Cli, Command};

// Crate-level exports - Configuration
pub use config::{ConfigError, DEFAULT_CONFIG_FILE, GameConfig, RevealConfig};

// Crate-level exports - Terminal front end
pub use console::{Console, HELP, LineCommand, UnknownCommand, describe, render};

// Crate-level exports - Storage
pub use db::{DbError, DbErrorKind, KvEntry, NewKvEntry, SqliteStorage};
