//! Durable board snapshots on top of a key-value storage backend.

mod persistence;
mod record;
mod storage;

pub use persistence::{BoardSnapshot, GAME_STATE_KEY, PersistenceStore};
pub use storage::{MemoryStorage, Storage};
