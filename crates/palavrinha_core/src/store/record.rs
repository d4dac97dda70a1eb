//! Serialized shape of rows and boards.
//!
//! ```text
//! { kind, word: ["t", "e", "", ...], isRevealed?: bool, status?: [...] }
//! ```

use crate::{LetterStatus, ModeConfig, Row, RowKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RowRecord {
    kind: RowKind,
    word: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_revealed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<Vec<LetterStatus>>,
}

impl RowRecord {
    pub(super) fn from_row(row: &Row) -> Self {
        let word = row
            .letters()
            .into_iter()
            .map(|letter| letter.map(String::from).unwrap_or_default())
            .collect();
        let (is_revealed, status) = if row.is_revealed() {
            (Some(true), Some(row.statuses()))
        } else {
            (None, None)
        };
        Self {
            kind: row.kind(),
            word,
            is_revealed,
            status,
        }
    }

    /// Converts back to a row, or `None` if the record does not fit the mode.
    pub(super) fn into_row(self, word_length: usize) -> Option<Row> {
        if self.word.len() != word_length {
            return None;
        }

        let letters = self
            .word
            .iter()
            .map(|slot| {
                let mut chars = slot.chars();
                match (chars.next(), chars.next()) {
                    (None, _) => Some(None),
                    (Some(c), None) if c.is_ascii_alphabetic() => Some(Some(c.to_ascii_lowercase())),
                    _ => None,
                }
            })
            .collect::<Option<Vec<_>>>()?;

        let revealed = self.is_revealed.unwrap_or(false);
        if revealed {
            let status = self.status.as_deref()?;
            let complete = status.len() == word_length
                && status.iter().all(|&s| s != LetterStatus::Unknown)
                && letters.iter().all(Option::is_some);
            if !complete {
                return None;
            }
        }

        Some(Row::from_parts(
            self.kind,
            &letters,
            revealed,
            self.status.as_deref(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct BoardRecord {
    board: Vec<RowRecord>,
    #[serde(default)]
    winner: bool,
}

impl BoardRecord {
    pub(super) fn new(rows: &[Row], winner: bool) -> Self {
        Self {
            board: rows.iter().map(RowRecord::from_row).collect(),
            winner,
        }
    }

    /// Validates the record against the mode geometry.
    pub(super) fn into_parts(self, config: ModeConfig) -> Option<(Vec<Row>, bool)> {
        if self.board.len() != config.total_rows() {
            return None;
        }
        let rows = self
            .board
            .into_iter()
            .map(|record| record.into_row(config.word_length()))
            .collect::<Option<Vec<_>>>()?;
        Some((rows, self.winner))
    }
}
