//! Tests for the SQLite storage backend and saved-game persistence on disk.

use palavrinha::SqliteStorage;
use palavrinha_core::{
    GAME_STATE_KEY, Key, Mode, Outcome, PersistenceStore, RowKind, SessionCoordinator,
    SessionStatus, Storage,
};
use tempfile::NamedTempFile;

/// Creates a temporary database file with schema applied, returns the file
/// handle (must stay in scope to keep the file alive) and a ready storage.
fn setup_test_db() -> (NamedTempFile, SqliteStorage) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let storage = SqliteStorage::open(db_path).expect("Failed to open storage");
    (db_file, storage)
}

fn answers(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn guess(session: &mut SessionCoordinator<SqliteStorage>, word: &str) {
    for c in word.chars() {
        session.handle_key(&Key::Char(c));
    }
    session.handle_key(&Key::Enter);
    session.complete_pending_reveals();
}

#[test]
fn test_missing_key_reads_as_none() {
    let (_db, storage) = setup_test_db();
    assert!(storage.get("nope").expect("Read failed").is_none());
    assert!(storage.list_keys().expect("List failed").is_empty());
}

#[test]
fn test_set_replaces_previous_value() {
    let (_db, mut storage) = setup_test_db();
    storage.set("k", "first".to_string()).expect("Set failed");
    storage.set("k", "second".to_string()).expect("Set failed");

    assert_eq!(storage.get("k").expect("Read failed").as_deref(), Some("second"));
    assert_eq!(storage.list_keys().expect("List failed"), vec!["k"]);

    let entry = storage
        .get_entry("k")
        .expect("Query failed")
        .expect("Entry missing");
    assert_eq!(entry.value(), "second");
}

#[test]
fn test_delete_entry() {
    let (_db, mut storage) = setup_test_db();
    storage.set("k", "v".to_string()).expect("Set failed");
    assert!(storage.delete_entry("k").expect("Delete failed"));
    assert!(!storage.delete_entry("k").expect("Delete failed"));
    assert!(storage.get("k").expect("Read failed").is_none());
}

#[test]
fn test_reopen_keeps_data() {
    let (db, mut storage) = setup_test_db();
    storage.set("k", "v".to_string()).expect("Set failed");

    let reopened = SqliteStorage::open(db.path().to_str().expect("Invalid path"))
        .expect("Reopen failed");
    assert_eq!(reopened.get("k").expect("Read failed").as_deref(), Some("v"));
}

#[test]
fn test_unreachable_database_fails_to_open() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("missing").join("game.db");
    let result = SqliteStorage::open(path.to_str().expect("Invalid path"));
    assert!(result.is_err(), "Opening under a missing directory should fail");
}

#[test]
fn test_session_survives_restart() {
    let (db, storage) = setup_test_db();
    let mut session =
        SessionCoordinator::resume(Mode::Dupla, answers(&["termo", "vasco"]), storage)
            .expect("Session failed");
    guess(&mut session, "mrote");
    guess(&mut session, "vasco");
    drop(session);

    let storage = SqliteStorage::open(db.path().to_str().expect("Invalid path"))
        .expect("Reopen failed");
    assert_eq!(storage.list_keys().expect("List failed"), vec![GAME_STATE_KEY]);
    let session = SessionCoordinator::resume(Mode::Dupla, answers(&["termo", "vasco"]), storage)
        .expect("Resume failed");

    assert_eq!(session.shared_active_row(), 2);
    assert_eq!(session.status(), SessionStatus::InProgress);
    assert_eq!(session.boards()[0].rows()[1].kind(), RowKind::Shown);
    assert_eq!(session.boards()[1].outcome(), Outcome::Won);
}

#[test]
fn test_clear_mode_on_disk() {
    let (_db, storage) = setup_test_db();
    let mut session =
        SessionCoordinator::resume(Mode::Solo, answers(&["termo"]), storage.clone())
            .expect("Session failed");
    guess(&mut session, "mrote");

    let mut store = PersistenceStore::new(storage.clone());
    assert_eq!(store.load_shared_row_active(Mode::Solo), 1);
    store.clear_mode(Mode::Solo);

    let store = PersistenceStore::new(storage);
    assert_eq!(store.load_shared_row_active(Mode::Solo), 0);
    assert!(!store.load(Mode::Solo, 0).rows()[0].is_revealed());
}
