//! Integration tests for the secdir-store crate.
//!
//! These tests drive [`FileRecordStore`] against real files in a temporary
//! directory and check that [`MemoryRecordStore`] behaves the same way.

use std::fs;
use std::sync::Arc;

use secdir_store::{
    ArchiveEntry, FileRecordStore, MemoryRecordStore, RecordStore, Table, TablePaths,
};
use secdir_types::{DirectoryError, ErrorCode, RoleSet, UserRole};

fn open_store() -> (tempfile::TempDir, FileRecordStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = FileRecordStore::open(TablePaths::in_dir(dir.path())).unwrap();
    (dir, store)
}

fn roles(indices: &[u8]) -> RoleSet {
    RoleSet::new(indices.iter().filter_map(|&i| UserRole::from_index(i))).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════
//  Account lifecycle on disk
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn added_user_is_found_in_both_tables() {
    let (_dir, store) = open_store();
    store.add_user("alice", "h1", &roles(&[0, 2])).unwrap();

    let record = store.active_record("alice").unwrap();
    assert_eq!(record.login, "alice");
    assert_eq!(record.roles, roles(&[0, 2]));
    assert_eq!(
        store.archive_entry("alice").unwrap(),
        ArchiveEntry::new("alice", "h1")
    );
}

#[test]
fn second_add_leaves_tables_unchanged() {
    let (_dir, store) = open_store();
    store.add_user("alice", "h1", &roles(&[0])).unwrap();
    let active = fs::read_to_string(&store.paths().active).unwrap();
    let archive = fs::read_to_string(&store.paths().archive).unwrap();

    let err = store.add_user("alice", "h2", &roles(&[1])).unwrap_err();

    assert_eq!(err.code(), ErrorCode::LoginAlreadyExists);
    assert_eq!(fs::read_to_string(&store.paths().active).unwrap(), active);
    assert_eq!(fs::read_to_string(&store.paths().archive).unwrap(), archive);
}

#[test]
fn removed_user_stays_in_archive() {
    let (_dir, store) = open_store();
    store.add_user("alice", "h1", &roles(&[0])).unwrap();
    store.add_user("bob", "b1", &roles(&[1])).unwrap();

    store.remove_user("alice").unwrap();

    assert_eq!(
        store.lookup(Table::Active, "alice").unwrap_err().code(),
        ErrorCode::LoginNotFound
    );
    assert!(store.lookup(Table::Archive, "alice").is_ok());
    assert!(store.lookup(Table::Active, "bob").is_ok());
    assert_eq!(
        store.add_user("alice", "h9", &roles(&[0])).unwrap_err().code(),
        ErrorCode::LoginAlreadyExists
    );
}

#[test]
fn history_is_bounded_by_depth() {
    let (_dir, store) = open_store();
    store.add_user("alice", "h1", &roles(&[0])).unwrap();

    store.update_password("alice", "h2", 2).unwrap();
    assert_eq!(store.archive_entry("alice").unwrap().history, ["h1", "h2"]);

    store.update_password("alice", "h3", 2).unwrap();
    assert_eq!(store.archive_entry("alice").unwrap().history, ["h2", "h3"]);

    store.update_password("alice", "h4", 3).unwrap();
    assert_eq!(
        store.archive_entry("alice").unwrap().history,
        ["h2", "h3", "h4"]
    );
}

#[test]
fn scratch_file_does_not_linger() {
    let (_dir, store) = open_store();
    store.add_user("alice", "h1", &roles(&[0])).unwrap();
    store.update_roles("alice", &roles(&[3])).unwrap();
    store.update_password("alice", "h2", 5).unwrap();
    store.remove_user("alice").unwrap();
    assert!(!store.paths().scratch.exists());
}

// ═══════════════════════════════════════════════════════════════════════
//  Scans
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn scan_on_empty_table_is_end_of_table() {
    let (_dir, store) = open_store();
    for table in [Table::Active, Table::Archive] {
        let err = store.scan_first(table).unwrap_err();
        assert_eq!(err, DirectoryError::EndOfTable);
    }
}

#[test]
fn list_returns_lines_in_order() {
    let (_dir, store) = open_store();
    for login in ["carol", "alice", "bob"] {
        store.add_user(login, "h", &roles(&[0])).unwrap();
    }
    assert_eq!(
        store.list(Table::Archive).unwrap(),
        ["carol h", "alice h", "bob h"]
    );
}

#[test]
fn lookup_ignores_open_scan() {
    let (_dir, store) = open_store();
    store.add_user("alice", "h1", &roles(&[0])).unwrap();
    store.add_user("bob", "b1", &roles(&[0])).unwrap();

    let (mut cursor, first) = store.scan_first(Table::Archive).unwrap();
    assert_eq!(first, "alice h1");
    assert_eq!(store.lookup(Table::Archive, "bob").unwrap(), "bob b1");
    assert_eq!(cursor.next_line().unwrap(), "bob b1");
}

// ═══════════════════════════════════════════════════════════════════════
//  Unreadable tables
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn every_operation_on_missing_tables_is_database_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileRecordStore::new(TablePaths::in_dir(dir.path().join("missing")));
    let r = roles(&[0]);

    let codes = [
        store.scan_first(Table::Active).map(|_| ()).unwrap_err().code(),
        store.scan_first(Table::Archive).map(|_| ()).unwrap_err().code(),
        store.lookup(Table::Active, "alice").map(|_| ()).unwrap_err().code(),
        store.lookup(Table::Archive, "alice").map(|_| ()).unwrap_err().code(),
        store.add_user("alice", "h1", &r).unwrap_err().code(),
        store.remove_user("alice").unwrap_err().code(),
        store.update_password("alice", "h2", 3).unwrap_err().code(),
        store.update_roles("alice", &r).unwrap_err().code(),
    ];
    assert!(codes.iter().all(|&c| c == ErrorCode::DatabaseError), "{codes:?}");
}

#[test]
fn malformed_active_line_is_database_error() {
    let (_dir, store) = open_store();
    fs::write(&store.paths().active, "alice onlyhash\n").unwrap();

    assert_eq!(
        store.active_record("alice").unwrap_err().code(),
        ErrorCode::DatabaseError
    );
    assert_eq!(
        store.update_roles("alice", &roles(&[1])).unwrap_err().code(),
        ErrorCode::DatabaseError
    );
    assert_eq!(
        fs::read_to_string(&store.paths().active).unwrap(),
        "alice onlyhash\n"
    );
}

#[test]
fn logins_that_break_the_line_format_are_refused() {
    let (_dir, file) = open_store();
    let memory = MemoryRecordStore::new();
    let stores: [&dyn RecordStore; 2] = [&file, &memory];

    for store in stores {
        for login in ["al ice", "", " alice", "alice\n"] {
            let err = store.add_user(login, "h1", &roles(&[0])).unwrap_err();
            assert_eq!(err.code(), ErrorCode::DatabaseError, "login {login:?}");
        }
        assert!(store.list(Table::Active).unwrap().is_empty());
        assert!(store.list(Table::Archive).unwrap().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  File and memory stores agree
// ═══════════════════════════════════════════════════════════════════════

fn exercise(store: &dyn RecordStore) -> (Vec<String>, Vec<String>) {
    store.add_user("alice", "a1", &roles(&[0])).unwrap();
    store.add_user("bob", "b1", &roles(&[1, 2])).unwrap();
    store.update_password("alice", "a2", 2).unwrap();
    store.update_password("alice", "a3", 2).unwrap();
    store.update_roles("bob", &roles(&[3])).unwrap();
    store.remove_user("alice").unwrap();
    (
        store.list(Table::Active).unwrap(),
        store.list(Table::Archive).unwrap(),
    )
}

#[test]
fn file_and_memory_stores_agree() {
    let (_dir, file) = open_store();
    let file: Arc<dyn RecordStore> = Arc::new(file);
    let memory: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());

    let from_file = exercise(file.as_ref());
    let from_memory = exercise(memory.as_ref());

    assert_eq!(from_file, from_memory);
    assert_eq!(from_file.1, ["alice a2 a3", "bob b1"]);
}
