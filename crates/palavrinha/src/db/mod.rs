//! SQLite key-value persistence for saved games.

mod error;
mod models;
mod repository;
mod schema;

pub use error::{DbError, DbErrorKind};
pub use models::{KvEntry, NewKvEntry};
pub use repository::SqliteStorage;
