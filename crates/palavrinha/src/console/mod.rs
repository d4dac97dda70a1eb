//! Line-oriented terminal front end.
//!
//! Reads one command per line, feeds it to the session as key or pointer
//! events, lets the reveals play out and prints the boards again.

mod command;
mod render;

pub use command::{HELP, LineCommand, UnknownCommand};
pub use render::{describe, render};

use anyhow::Result;
use palavrinha_core::{
    Feedback, Key, PointerEvent, RevealTiming, SessionCoordinator, SessionError, Storage,
};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, instrument};

/// Interactive game over any storage backend.
#[derive(Debug)]
pub struct Console<S> {
    session: SessionCoordinator<S>,
    timing: RevealTiming,
    instant: bool,
    new_game_answers: Vec<String>,
}

impl<S: Storage> Console<S> {
    /// Wraps a session. `new_game_answers` are used by `:new`.
    pub fn new(
        session: SessionCoordinator<S>,
        timing: RevealTiming,
        instant: bool,
        new_game_answers: Vec<String>,
    ) -> Self {
        Self {
            session,
            timing,
            instant,
            new_game_answers,
        }
    }

    /// The wrapped session.
    pub fn session(&self) -> &SessionCoordinator<S> {
        &self.session
    }

    /// Reads commands until `:quit` or end of input.
    #[instrument(skip_all, fields(mode = %self.session.mode()))]
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        info!("Console started");
        writeln!(out, "{}", render(&self.session))?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let command = match line.parse::<LineCommand>() {
                Ok(LineCommand::Quit) => break,
                Ok(LineCommand::Help) => {
                    writeln!(out, "{HELP}")?;
                    continue;
                }
                Ok(command) => command,
                Err(e) => {
                    writeln!(out, "{e}")?;
                    continue;
                }
            };

            let feedback = self.apply(command).await?;
            let mut last = None;
            for message in feedback.iter().filter_map(|f| describe(f, &self.session)) {
                if last.as_ref() != Some(&message) {
                    writeln!(out, "{message}")?;
                }
                last = Some(message);
            }
            writeln!(out, "{}", render(&self.session))?;
            out.flush()?;
        }

        info!(status = %self.session.status(), "Console closed");
        Ok(())
    }

    /// Applies one command and waits for any reveal it started.
    #[instrument(skip(self))]
    pub async fn apply(&mut self, command: LineCommand) -> Result<Vec<Feedback>, SessionError> {
        let mut feedback = Vec::new();
        match command {
            LineCommand::Guess(word) => {
                feedback.extend(self.type_letters(&word));
                feedback.extend(self.session.handle_key(&Key::Enter));
            }
            LineCommand::Type(letters) => feedback.extend(self.type_letters(&letters)),
            LineCommand::Left => feedback.extend(self.session.handle_key(&Key::ArrowLeft)),
            LineCommand::Right => feedback.extend(self.session.handle_key(&Key::ArrowRight)),
            LineCommand::Back => feedback.extend(self.session.handle_key(&Key::Backspace)),
            LineCommand::Enter => feedback.extend(self.session.handle_key(&Key::Enter)),
            LineCommand::Tap(cell) => {
                if let Some(index) = cell.checked_sub(1) {
                    let event = PointerEvent::new(self.session.shared_active_row(), index);
                    feedback.extend(self.session.handle_pointer(event));
                }
            }
            LineCommand::New => {
                feedback.extend(self.session.new_game(self.new_game_answers.clone())?);
            }
            LineCommand::Show | LineCommand::Help | LineCommand::Quit => {}
        }

        if self.session.is_revealing() {
            debug!(instant = self.instant, "Waiting on reveals");
            let settled = if self.instant {
                self.session.complete_pending_reveals()
            } else {
                self.session.run_reveals(self.timing).await
            };
            feedback.extend(settled);
        }
        Ok(feedback)
    }

    fn type_letters(&mut self, letters: &str) -> Vec<Feedback> {
        letters
            .chars()
            .flat_map(|c| self.session.handle_key(&Key::Char(c)))
            .collect()
    }
}
