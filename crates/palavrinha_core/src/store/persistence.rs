//! Mode-partitioned board snapshots.
//!
//! Everything lives in one JSON document under [`GAME_STATE_KEY`]:
//!
//! ```text
//! { "<mode>": { "rowActive": 2, "<boardId>": { "board": [..rows..], "winner": false } } }
//! ```
//!
//! Writes read the current document, upsert one board and write the whole
//! document back, so boards never clobber each other. A write is skipped when
//! the document cannot be read. Reads never fail: any missing, unreadable or
//! malformed piece degrades to a fresh grid.

use super::record::BoardRecord;
use super::storage::Storage;
use crate::{BoardId, Mode, Row, StorageError, default_rows};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

/// Storage key of the game-state document.
pub const GAME_STATE_KEY: &str = "palavrinha-game-state";

const ROW_ACTIVE: &str = "rowActive";

/// Rows and winner flag of one board as last persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    rows: Vec<Row>,
    winner: bool,
}

impl BoardSnapshot {
    /// Creates a snapshot.
    pub fn new(rows: Vec<Row>, winner: bool) -> Self {
        Self { rows, winner }
    }

    /// Fresh grid for `mode`.
    pub fn fresh(mode: Mode) -> Self {
        let config = mode.config();
        Self::new(
            default_rows(config.total_rows(), config.word_length()),
            false,
        )
    }

    /// Stored rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Stored winner flag.
    pub fn winner(&self) -> bool {
        self.winner
    }

    /// Splits into rows and winner flag.
    pub fn into_parts(self) -> (Vec<Row>, bool) {
        (self.rows, self.winner)
    }
}

/// Board snapshot store over any [`Storage`] backend.
#[derive(Debug)]
pub struct PersistenceStore<S> {
    storage: S,
}

impl<S: Storage> PersistenceStore<S> {
    /// Wraps a storage backend.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Unwraps the backend.
    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Upserts one board and, when given, the mode's shared active row.
    ///
    /// Other boards and modes are carried over untouched. Backend failures are
    /// logged; the previous document stays in place.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn save(
        &mut self,
        mode: Mode,
        board_id: BoardId,
        rows: &[Row],
        winner: bool,
        row_active: Option<usize>,
    ) {
        let record = match serde_json::to_value(BoardRecord::new(rows, winner)) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Failed to serialize board; not saved");
                return;
            }
        };

        let mut document = match self.read_document() {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "Failed to read game-state document; board not saved");
                return;
            }
        };
        let slot = document
            .entry(mode.key().to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            warn!("Mode entry was not an object; replacing it");
            *slot = Value::Object(Map::new());
        }
        if let Some(entries) = slot.as_object_mut() {
            entries.insert(board_id.to_string(), record);
            if let Some(row) = row_active {
                entries.insert(ROW_ACTIVE.to_string(), Value::from(row));
            }
        }

        self.write_document(document);
        debug!(winner, ?row_active, "Board saved");
    }

    /// Loads one board, falling back to a fresh grid.
    #[instrument(skip(self))]
    pub fn load(&self, mode: Mode, board_id: BoardId) -> BoardSnapshot {
        let document = self.read_document_or_empty();
        let Some(entry) = document
            .get(mode.key())
            .and_then(|entries| entries.get(board_id.to_string()))
        else {
            debug!("No stored board; starting fresh");
            return BoardSnapshot::fresh(mode);
        };

        let parts = serde_json::from_value::<BoardRecord>(entry.clone())
            .ok()
            .and_then(|record| record.into_parts(mode.config()));
        match parts {
            Some((rows, winner)) => {
                debug!(winner, "Board loaded");
                BoardSnapshot::new(rows, winner)
            }
            None => {
                warn!("Stored board is malformed; starting fresh");
                BoardSnapshot::fresh(mode)
            }
        }
    }

    /// Loads the mode's shared active row, or 0.
    #[instrument(skip(self))]
    pub fn load_shared_row_active(&self, mode: Mode) -> usize {
        let stored = self
            .read_document_or_empty()
            .get(mode.key())
            .and_then(|entries| entries.get(ROW_ACTIVE))
            .and_then(Value::as_u64)
            .and_then(|row| usize::try_from(row).ok());
        match stored {
            Some(row) if row <= mode.config().total_rows() => row,
            Some(row) => {
                warn!(row, "Stored active row out of range; using 0");
                0
            }
            None => 0,
        }
    }

    /// Drops everything stored for `mode`; other modes are kept.
    #[instrument(skip(self))]
    pub fn clear_mode(&mut self, mode: Mode) {
        let mut document = match self.read_document() {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "Failed to read game-state document; mode not cleared");
                return;
            }
        };
        if document.remove(mode.key()).is_some() {
            self.write_document(document);
            debug!("Mode progress cleared");
        }
    }

    /// Current document. Malformed content reads as empty; only a backend
    /// failure is an error.
    fn read_document(&self) -> Result<Map<String, Value>, StorageError> {
        let Some(raw) = self.storage.get(GAME_STATE_KEY)? else {
            return Ok(Map::new());
        };
        let document = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(document)) => document,
            Ok(_) => {
                warn!("Game-state document is not an object; ignoring it");
                Map::new()
            }
            Err(e) => {
                warn!(error = %e, "Game-state document is not valid JSON; ignoring it");
                Map::new()
            }
        };
        Ok(document)
    }

    fn read_document_or_empty(&self) -> Map<String, Value> {
        self.read_document().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read game-state document; starting fresh");
            Map::new()
        })
    }

    fn write_document(&mut self, document: Map<String, Value>) {
        let raw = match serde_json::to_string(&Value::Object(document)) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize game-state document");
                return;
            }
        };
        if let Err(e) = self.storage.set(GAME_STATE_KEY, raw) {
            warn!(error = %e, "Failed to write game-state document");
        }
    }
}
