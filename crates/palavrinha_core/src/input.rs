//! Shared typing cursor and raw-input normalization.
//!
//! One [`InputDispatcher`] per session owns the cursor, the shared active row
//! and the in-progress row buffer. Every board mirrors this buffer; none of
//! them keep their own typing state.

use crate::ModeConfig;
use tracing::{debug, instrument, trace};

/// Normalized key event delivered by the input glue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// Move the cursor right.
    ArrowRight,
    /// Move the cursor left.
    ArrowLeft,
    /// Delete a letter.
    Backspace,
    /// Submit the row.
    Enter,
    /// Escape (currently does nothing).
    Escape,
    /// Any other named key.
    Other(String),
}

impl Key {
    /// Maps a DOM-style key name (`"a"`, `"Enter"`, `"ArrowLeft"`, ...) to a key.
    pub fn from_name(name: &str) -> Self {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Key::Char(c);
        }
        match name {
            "ArrowRight" => Key::ArrowRight,
            "ArrowLeft" => Key::ArrowLeft,
            "Backspace" => Key::Backspace,
            "Enter" => Key::Enter,
            "Escape" => Key::Escape,
            other => Key::Other(other.to_string()),
        }
    }
}

/// Tap or click on a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    /// Row the tapped cell belongs to.
    pub row: usize,
    /// Cell index within the row.
    pub cell: usize,
}

impl PointerEvent {
    /// Creates a pointer event.
    pub fn new(row: usize, cell: usize) -> Self {
        Self { row, cell }
    }
}

/// What a normalized input asks the boards to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    /// A letter was written into `cell`.
    Letter {
        /// Lower-cased letter.
        letter: char,
        /// Cell that received it.
        cell: usize,
    },
    /// Cursor moved by one step (+1 right, -1 left).
    MoveCursor(i8),
    /// A letter was erased.
    Backspace,
    /// Submit the active row.
    Submit,
    /// Cursor placed on a cell by a pointer.
    CellClick(usize),
}

/// Normalized input, stamped with the shared active row at emission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intent {
    kind: IntentKind,
    row_index: usize,
}

impl Intent {
    /// Creates an intent for `row_index`.
    pub fn new(kind: IntentKind, row_index: usize) -> Self {
        Self { kind, row_index }
    }

    /// What to do.
    pub fn kind(&self) -> IntentKind {
        self.kind
    }

    /// Shared active row when the intent was emitted.
    pub fn row_index(&self) -> usize {
        self.row_index
    }
}

/// Message fanned out to every board: the intent plus the shared typing state
/// after it was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    intent: Intent,
    buffer: Vec<Option<char>>,
    cursor: usize,
}

impl Dispatch {
    /// Creates a dispatch message.
    pub fn new(intent: Intent, buffer: Vec<Option<char>>, cursor: usize) -> Self {
        Self {
            intent,
            buffer,
            cursor,
        }
    }

    /// The intent.
    pub fn intent(&self) -> &Intent {
        &self.intent
    }

    /// Shared row buffer.
    pub fn buffer(&self) -> &[Option<char>] {
        &self.buffer
    }

    /// Shared cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

/// Owns the shared cursor, shared active row and current row buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDispatcher {
    word_length: usize,
    total_rows: usize,
    cursor: usize,
    active_row: usize,
    buffer: Vec<Option<char>>,
}

impl InputDispatcher {
    /// Starts at row 0 with an empty buffer.
    pub fn new(config: ModeConfig) -> Self {
        Self::resume(config, 0)
    }

    /// Starts at `active_row` (capped at the row count) with an empty buffer.
    pub fn resume(config: ModeConfig, active_row: usize) -> Self {
        Self {
            word_length: config.word_length(),
            total_rows: config.total_rows(),
            cursor: 0,
            active_row: active_row.min(config.total_rows()),
            buffer: vec![None; config.word_length()],
        }
    }

    /// Cursor position; `word_length` means the buffer is full.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Shared active row; `total_rows` means every row is used up.
    pub fn active_row(&self) -> usize {
        self.active_row
    }

    /// In-progress letters.
    pub fn buffer(&self) -> &[Option<char>] {
        &self.buffer
    }

    /// True once the shared row has run past the grid.
    pub fn is_exhausted(&self) -> bool {
        self.active_row >= self.total_rows
    }

    /// Applies a key and returns the intent it produces, if any.
    #[instrument(skip(self), fields(row = self.active_row, cursor = self.cursor))]
    pub fn handle_key(&mut self, key: &Key) -> Option<Intent> {
        if self.is_exhausted() {
            trace!("No rows left; key ignored");
            return None;
        }

        let kind = match key {
            Key::Char(c) if c.is_ascii_alphabetic() => self.write_letter(c.to_ascii_lowercase())?,
            Key::ArrowRight => {
                self.cursor = if self.cursor + 1 < self.word_length {
                    self.cursor + 1
                } else {
                    0
                };
                IntentKind::MoveCursor(1)
            }
            Key::ArrowLeft => {
                self.cursor = if self.cursor > 0 {
                    self.cursor - 1
                } else {
                    self.word_length - 1
                };
                IntentKind::MoveCursor(-1)
            }
            Key::Backspace => {
                self.erase();
                IntentKind::Backspace
            }
            Key::Enter => IntentKind::Submit,
            Key::Char(_) | Key::Escape | Key::Other(_) => {
                trace!("Key ignored");
                return None;
            }
        };

        debug!(?kind, cursor = self.cursor, "Key dispatched");
        Some(Intent::new(kind, self.active_row))
    }

    /// Places the cursor on a tapped cell of the active row.
    #[instrument(skip(self), fields(row = self.active_row))]
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<Intent> {
        if self.is_exhausted() || event.row != self.active_row || event.cell >= self.word_length {
            trace!(?event, "Tap outside the active row ignored");
            return None;
        }
        self.cursor = event.cell;
        Some(Intent::new(IntentKind::CellClick(event.cell), self.active_row))
    }

    /// Moves on to the next row after a committed submit.
    #[instrument(skip(self))]
    pub fn advance_row(&mut self) {
        self.active_row = (self.active_row + 1).min(self.total_rows);
        self.clear_buffer();
        debug!(row = self.active_row, "Shared row advanced");
    }

    /// Back to row 0 with an empty buffer.
    pub fn reset(&mut self) {
        self.active_row = 0;
        self.clear_buffer();
    }

    fn clear_buffer(&mut self) {
        self.buffer.iter_mut().for_each(|slot| *slot = None);
        self.cursor = 0;
    }

    fn write_letter(&mut self, letter: char) -> Option<IntentKind> {
        if self.cursor >= self.word_length {
            trace!("Row buffer full; letter ignored");
            return None;
        }
        let cell = self.cursor;
        self.buffer[cell] = Some(letter);

        self.cursor = (1..=self.word_length)
            .map(|offset| (cell + offset) % self.word_length)
            .find(|&i| self.buffer[i].is_none())
            .unwrap_or(self.word_length);

        Some(IntentKind::Letter { letter, cell })
    }

    fn erase(&mut self) {
        if self.cursor < self.word_length && self.buffer[self.cursor].is_some() {
            self.buffer[self.cursor] = None;
            return;
        }
        if self.cursor > 0 {
            self.buffer[self.cursor - 1] = None;
            self.cursor -= 1;
        }
    }
}
