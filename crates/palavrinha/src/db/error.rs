//! Database error types.

use derive_more::{Display, Error};
use palavrinha_core::StorageError;
use tracing::instrument;

/// Which step of a storage call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DbErrorKind {
    /// Opening the SQLite file.
    #[display("connect")]
    Connect,
    /// Applying embedded migrations.
    #[display("migrate")]
    Migrate,
    /// Running a query or statement.
    #[display("query")]
    Query,
}

/// SQLite failure, tagged with the step that failed and the call site.
#[derive(Debug, Clone, Display, Error)]
#[display("Database {kind} failed: {detail} at {file}:{line}")]
pub struct DbError {
    /// Failing step.
    pub kind: DbErrorKind,
    /// Backend message.
    pub detail: String,
    /// Line of the call site.
    pub line: u32,
    /// File of the call site.
    pub file: &'static str,
}

impl DbError {
    /// Records a failure at the caller's location.
    #[track_caller]
    #[instrument(skip(detail))]
    pub fn new(kind: DbErrorKind, detail: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            detail: detail.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(DbErrorKind::Query, err.to_string())
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(DbErrorKind::Connect, err.to_string())
    }
}

impl From<DbError> for StorageError {
    #[track_caller]
    fn from(err: DbError) -> Self {
        StorageError::new(format!("sqlite {}: {}", err.kind, err.detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_keeps_the_failing_step() {
        let err = DbError::from(diesel::result::Error::NotFound);
        assert_eq!(err.kind, DbErrorKind::Query);

        let storage = StorageError::from(err);
        assert!(storage.message.starts_with("sqlite query: "));
    }
}
