//! Line commands typed at the play prompt.

use derive_more::{Display, Error};
use std::str::FromStr;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    /// Type a word and submit it.
    Guess(String),
    /// Type letters without submitting.
    Type(String),
    /// Move the cursor left.
    Left,
    /// Move the cursor right.
    Right,
    /// Delete a letter.
    Back,
    /// Submit the current row.
    Enter,
    /// Put the cursor on a cell (1-based).
    Tap(usize),
    /// Start over with fresh boards.
    New,
    /// Reprint the boards.
    Show,
    /// Print the command list.
    Help,
    /// Leave the game.
    Quit,
}

/// Input line that is not a word or a known command.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Unknown command '{input}' (try :help)")]
pub struct UnknownCommand {
    /// The rejected line.
    pub input: String,
}

/// Help text printed by `:help`.
pub const HELP: &str = "\
  <word>      type the word and submit it
  :type <abc> type letters without submitting
  :left       move the cursor left
  :right      move the cursor right
  :back       delete a letter
  :enter      submit the row
  :tap <n>    move the cursor to cell n
  :new        start a new game
  :quit       leave";

impl FromStr for LineCommand {
    type Err = UnknownCommand;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let unknown = || UnknownCommand {
            input: line.to_string(),
        };

        let Some(command) = line.strip_prefix(':') else {
            if line.is_empty() {
                return Ok(LineCommand::Show);
            }
            if line.chars().all(|c| c.is_alphabetic()) {
                return Ok(LineCommand::Guess(line.to_string()));
            }
            return Err(unknown());
        };

        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(unknown());
        }

        match (name, arg) {
            ("left", None) => Ok(LineCommand::Left),
            ("right", None) => Ok(LineCommand::Right),
            ("back", None) => Ok(LineCommand::Back),
            ("enter", None) => Ok(LineCommand::Enter),
            ("new", None) => Ok(LineCommand::New),
            ("show", None) => Ok(LineCommand::Show),
            ("help", None) => Ok(LineCommand::Help),
            ("quit" | "q", None) => Ok(LineCommand::Quit),
            ("type", Some(letters)) => Ok(LineCommand::Type(letters.to_string())),
            ("tap", Some(n)) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Ok(LineCommand::Tap(n)),
                _ => Err(unknown()),
            },
            _ => Err(unknown()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_guesses() {
        assert_eq!(
            "  termo ".parse::<LineCommand>().unwrap(),
            LineCommand::Guess("termo".to_string())
        );
        assert_eq!("".parse::<LineCommand>().unwrap(), LineCommand::Show);
    }

    #[test]
    fn colon_commands() {
        assert_eq!(":left".parse::<LineCommand>().unwrap(), LineCommand::Left);
        assert_eq!(":tap 3".parse::<LineCommand>().unwrap(), LineCommand::Tap(3));
        assert_eq!(
            ":type te".parse::<LineCommand>().unwrap(),
            LineCommand::Type("te".to_string())
        );
        assert_eq!(":q".parse::<LineCommand>().unwrap(), LineCommand::Quit);
    }

    #[test]
    fn bad_lines_are_rejected() {
        for line in [":tap 0", ":tap x", ":jump", "ter mo", "t3rmo", ":left 2"] {
            assert!(line.parse::<LineCommand>().is_err(), "{line} parsed");
        }
    }
}
