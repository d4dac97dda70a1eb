//! SQLite-backed storage for saved games.

use chrono::Utc;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use palavrinha_core::{Storage, StorageError};
use tracing::{debug, info, instrument, warn};

use crate::db::{DbError, DbErrorKind, KvEntry, NewKvEntry, schema};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Key-value storage in a SQLite file.
///
/// Each call opens its own connection, so the value is cheap to clone and
/// holds no open handles between moves.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db_path: String,
}

impl SqliteStorage {
    /// Opens the database at `db_path`, creating it and its schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the file cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path.as_ref()))]
    pub fn open(db_path: impl AsRef<str>) -> Result<Self, DbError> {
        let storage = Self {
            db_path: db_path.as_ref().to_string(),
        };
        let mut conn = storage.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(DbErrorKind::Migrate, e.to_string()))?;
        info!(
            path = %storage.db_path,
            migrations = applied.len(),
            "SQLite storage ready"
        );
        Ok(storage)
    }

    /// Path of the database file.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(DbErrorKind::Connect, format!("'{}': {}", self.db_path, e)))
    }

    /// Looks up one entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_entry(&self, key: &str) -> Result<Option<KvEntry>, DbError> {
        let mut conn = self.connection()?;
        let entry = schema::kv_entries::table
            .filter(schema::kv_entries::key.eq(key))
            .select(KvEntry::as_select())
            .first(&mut conn)
            .optional()?;
        debug!(found = entry.is_some(), "Entry lookup");
        Ok(entry)
    }

    /// Inserts or replaces one entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, value), fields(bytes = value.len()))]
    pub fn put_entry(&self, key: &str, value: String) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let entry = NewKvEntry::new(key.to_string(), value, Utc::now().naive_utc());
        diesel::replace_into(schema::kv_entries::table)
            .values(&entry)
            .execute(&mut conn)?;
        debug!("Entry stored");
        Ok(())
    }

    /// Deletes one entry; returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn delete_entry(&self, key: &str) -> Result<bool, DbError> {
        let mut conn = self.connection()?;
        let deleted = diesel::delete(schema::kv_entries::table)
            .filter(schema::kv_entries::key.eq(key))
            .execute(&mut conn)?;
        debug!(deleted, "Entry deleted");
        Ok(deleted > 0)
    }

    /// Lists stored keys in order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_keys(&self) -> Result<Vec<String>, DbError> {
        let mut conn = self.connection()?;
        let keys = schema::kv_entries::table
            .select(schema::kv_entries::key)
            .order(schema::kv_entries::key.asc())
            .load::<String>(&mut conn)?;
        Ok(keys)
    }
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entry = self.get_entry(key).map_err(|e| {
            warn!(error = %e, key, "Read failed");
            StorageError::from(e)
        })?;
        Ok(entry.map(|entry| entry.value().clone()))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.put_entry(key, value).map_err(StorageError::from)
    }
}
