//! Command-line interface for palavrinha.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Palavrinha - guess the word on one or more boards at once
#[derive(Parser, Debug)]
#[command(name = "palavrinha")]
#[command(about = "Word-guessing game played on up to eight boards", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file (defaults to ./palavrinha.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database, overriding the config file
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a mode in the terminal, resuming saved progress
    Play {
        /// Mode to play (solo, dupla, quarteto, grupinho)
        #[arg(short, long, default_value = "solo")]
        mode: String,

        /// Skip reveal timing
        #[arg(long)]
        instant: bool,
    },

    /// Print the saved boards of a mode
    Show {
        /// Mode to show
        #[arg(short, long, default_value = "solo")]
        mode: String,
    },

    /// Discard saved progress for a mode
    Reset {
        /// Mode to reset
        #[arg(short, long)]
        mode: String,
    },

    /// List the available modes
    Modes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_defaults_to_solo() {
        let cli = Cli::parse_from(["palavrinha", "play"]);
        assert!(matches!(
            cli.command,
            Command::Play { ref mode, instant: false } if mode == "solo"
        ));
        assert!(cli.db.is_none());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["palavrinha", "reset", "--mode", "dupla", "--db", "x.db"]);
        assert_eq!(cli.db.as_deref(), Some("x.db"));
        assert!(matches!(cli.command, Command::Reset { ref mode } if mode == "dupla"));
    }
}
