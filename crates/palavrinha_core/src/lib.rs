//! Palavrinha core - word-guessing game logic
//!
//! Pure game engine for a Termo-style game played on one or more boards at
//! once. Every board receives the same guesses; each has its own answer.
//!
//! # Architecture
//!
//! - **Evaluation**: duplicate-aware letter scoring
//! - **Input**: shared cursor and row buffer, normalized into intents
//! - **Board**: per-board row state machine with cancelable reveals
//! - **Session**: fans intents out to boards and commits rows in lockstep
//! - **Store**: mode-partitioned snapshots over any key-value backend
//!
//! # Example
//!
//! ```
//! use palavrinha_core::{Key, MemoryStorage, SessionCoordinator, SessionStatus};
//!
//! let mut session =
//!     SessionCoordinator::open("solo", vec!["termo".to_string()], MemoryStorage::new())?;
//! for c in "termo".chars() {
//!     session.handle_key(&Key::Char(c));
//! }
//! session.handle_key(&Key::Enter);
//! session.complete_pending_reveals();
//!
//! assert_eq!(session.status(), SessionStatus::Won);
//! # Ok::<(), palavrinha_core::SessionError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod board;
mod error;
mod evaluation;
mod input;
mod mode;
mod reveal;
mod session;
mod store;
mod types;

// Crate-level exports - Domain types
pub use types::{BoardId, Cell, LetterStatus, Outcome, Row, RowKind, default_rows};

// Crate-level exports - Modes
pub use mode::{Mode, ModeConfig};

// Crate-level exports - Errors
pub use error::{SessionError, StorageError};

// Crate-level exports - Scoring
pub use evaluation::evaluate;

// Crate-level exports - Input
pub use input::{Dispatch, InputDispatcher, Intent, IntentKind, Key, PointerEvent};

// Crate-level exports - Reveal sequencing
pub use reveal::{RevealCancelled, RevealGuard, RevealSequence, RevealTicket, RevealTiming};

// Crate-level exports - Boards
pub use board::{BoardEngine, BoardEvent, SubmitOutcome};

// Crate-level exports - Sessions
pub use session::{Feedback, SessionCoordinator, SessionStatus, validate_answers};

// Crate-level exports - Persistence
pub use store::{BoardSnapshot, GAME_STATE_KEY, MemoryStorage, PersistenceStore, Storage};
