//! Core domain types: cells, rows and board outcomes.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Index of a board within a session (0-based).
pub type BoardId = usize;

/// Score of a single letter against the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LetterStatus {
    /// Not scored yet.
    #[default]
    Unknown,
    /// Right letter, right position.
    Correct,
    /// Letter occurs elsewhere in the answer.
    Present,
    /// Letter is not in the answer (or all its occurrences are used up).
    Absent,
}

/// A single letter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    letter: Option<char>,
    status: LetterStatus,
}

impl Cell {
    /// Creates a cell with the given letter and status.
    pub fn new(letter: Option<char>, status: LetterStatus) -> Self {
        Self { letter, status }
    }

    /// Returns the typed letter, if any.
    pub fn letter(&self) -> Option<char> {
        self.letter
    }

    /// Returns the scored status.
    pub fn status(&self) -> LetterStatus {
        self.status
    }

    /// Returns true if no letter has been typed here.
    pub fn is_empty(&self) -> bool {
        self.letter.is_none()
    }
}

/// Presentation role of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RowKind {
    /// A future row that cannot be typed into yet.
    Pending,
    /// The row currently receiving input.
    Active,
    /// A row scored during this session.
    Revealed,
    /// A scored row restored from persistence (drawn without replaying the flip).
    Shown,
}

/// One guess attempt: a fixed-length sequence of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    kind: RowKind,
    cells: Vec<Cell>,
    revealed: bool,
}

impl Row {
    /// Creates an empty, unrevealed row.
    pub fn new(word_length: usize, kind: RowKind) -> Self {
        Self {
            kind,
            cells: vec![Cell::default(); word_length],
            revealed: false,
        }
    }

    /// Builds a row from stored parts.
    ///
    /// `statuses` is only applied when the row is revealed.
    pub fn from_parts(
        kind: RowKind,
        letters: &[Option<char>],
        revealed: bool,
        statuses: Option<&[LetterStatus]>,
    ) -> Self {
        let cells = letters
            .iter()
            .enumerate()
            .map(|(i, &letter)| {
                let status = match statuses {
                    Some(statuses) if revealed => statuses.get(i).copied().unwrap_or_default(),
                    _ => LetterStatus::Unknown,
                };
                Cell::new(letter, status)
            })
            .collect();
        Self {
            kind,
            cells,
            revealed,
        }
    }

    /// Returns the row kind.
    pub fn kind(&self) -> RowKind {
        self.kind
    }

    /// Returns the cells.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns true once the row has been scored.
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Number of cells holding a letter.
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_empty()).count()
    }

    /// Letters in order, `None` for empty cells.
    pub fn letters(&self) -> Vec<Option<char>> {
        self.cells.iter().map(Cell::letter).collect()
    }

    /// Concatenated letters, skipping empty cells.
    pub fn word(&self) -> String {
        self.cells.iter().filter_map(Cell::letter).collect()
    }

    /// Per-cell statuses.
    pub fn statuses(&self) -> Vec<LetterStatus> {
        self.cells.iter().map(Cell::status).collect()
    }

    /// True if the row is revealed and every letter is correct.
    pub fn is_solved(&self) -> bool {
        self.revealed
            && !self.cells.is_empty()
            && self
                .cells
                .iter()
                .all(|cell| cell.status == LetterStatus::Correct)
    }

    pub(crate) fn set_kind(&mut self, kind: RowKind) {
        self.kind = kind;
    }

    /// Overwrites letters from a buffer; extra buffer slots are ignored.
    pub(crate) fn set_letters(&mut self, letters: &[Option<char>]) {
        for (cell, &letter) in self.cells.iter_mut().zip(letters) {
            cell.letter = letter;
        }
    }

    pub(crate) fn reveal(&mut self, statuses: &[LetterStatus]) {
        for (cell, &status) in self.cells.iter_mut().zip(statuses) {
            cell.status = status;
        }
        self.revealed = true;
        self.kind = RowKind::Revealed;
    }
}

/// Builds the fresh grid a new board starts with: first row active, the rest pending.
pub fn default_rows(total_rows: usize, word_length: usize) -> Vec<Row> {
    (0..total_rows)
        .map(|i| {
            let kind = if i == 0 {
                RowKind::Active
            } else {
                RowKind::Pending
            };
            Row::new(word_length, kind)
        })
        .collect()
}

/// Outcome of a single board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
    /// Still playing.
    #[default]
    None,
    /// Guessed the answer.
    Won,
    /// Ran out of rows.
    Lost,
}

impl Outcome {
    /// Returns true while the board accepts input.
    pub fn is_active(self) -> bool {
        matches!(self, Outcome::None)
    }

    /// Returns true for the terminal outcomes.
    pub fn is_finished(self) -> bool {
        !self.is_active()
    }
}
