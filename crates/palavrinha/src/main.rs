//! Palavrinha - command-line entry point.

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use palavrinha::{Cli, Command, Console, GameConfig, SqliteStorage, render};
use palavrinha_core::{Mode, PersistenceStore, SessionCoordinator};
use std::path::Path;
use strum::IntoEnumIterator;
use tokio::io::BufReader;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

const PLAY_LOG_FILE: &str = "palavrinha.log";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Command::Play { .. }))?;

    let mut config = GameConfig::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }

    match cli.command {
        Command::Play { mode, instant } => run_play(&config, &mode, instant).await,
        Command::Show { mode } => run_show(&config, &mode),
        Command::Reset { mode } => run_reset(&config, &mode),
        Command::Modes => {
            list_modes();
            Ok(())
        }
    }
}

/// Logs go to stderr, except during play where they would garble the boards.
fn init_tracing(to_file: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if to_file {
        let log_file = std::fs::File::create(Path::new(PLAY_LOG_FILE))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Arc::new(log_file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

/// Play a mode interactively on stdin/stdout.
#[instrument(skip(config))]
async fn run_play(config: &GameConfig, mode: &str, instant: bool) -> Result<()> {
    let mode = Mode::parse(mode)?;
    let storage = SqliteStorage::open(config.db_path())?;
    let answers = config.answers_for(mode);
    let session = SessionCoordinator::resume(mode, answers.clone(), storage)?;

    info!(%mode, instant, "Starting play");
    println!("palavrinha {} - type a word and press enter, :help for commands", mode);

    let mut console = Console::new(session, config.reveal().timing(), instant, answers);
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    console.run(stdin, &mut stdout).await
}

/// Print the saved boards of a mode.
#[instrument(skip(config))]
fn run_show(config: &GameConfig, mode: &str) -> Result<()> {
    let mode = Mode::parse(mode)?;
    let storage = SqliteStorage::open(config.db_path())?;
    let session = SessionCoordinator::resume(mode, config.answers_for(mode), storage)?;
    println!("{}", render(&session));
    Ok(())
}

/// Discard saved progress for a mode.
#[instrument(skip(config))]
fn run_reset(config: &GameConfig, mode: &str) -> Result<()> {
    let mode = Mode::parse(mode)?;
    let mut store = PersistenceStore::new(SqliteStorage::open(config.db_path())?);
    store.clear_mode(mode);
    info!(%mode, "Progress cleared");
    println!("Cleared saved {} game", mode);
    Ok(())
}

fn list_modes() {
    for mode in Mode::iter() {
        let config = mode.config();
        println!(
            "{:<9} {} board(s), {} rows, {}-letter words",
            mode.key(),
            config.board_count(),
            config.total_rows(),
            config.word_length()
        );
    }
}
