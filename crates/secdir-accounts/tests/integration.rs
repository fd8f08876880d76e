//! Integration tests for the secdir-accounts crate.
//!
//! The engine runs here against the real file stores and the PBKDF2 hasher
//! (with a low iteration count to keep the suite fast).

use std::sync::Arc;

use secdir_accounts::AccountsEditor;
use secdir_store::{FileRecordStore, RecordStore, Table, TablePaths};
use secdir_types::{DirectoryError, ErrorCode, RoleSet, UserRole};
use secdir_vault::{FilePolicyStore, PasswordHasher, Pbkdf2Hasher, PolicySetting, PolicyStore};

struct Directory {
    _dir: tempfile::TempDir,
    store: Arc<FileRecordStore>,
    hasher: Arc<Pbkdf2Hasher>,
    editor: AccountsEditor,
}

fn directory(history_depth: u32) -> Directory {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("configDb");

    let store = Arc::new(FileRecordStore::open(TablePaths::in_dir(&db)).unwrap());
    let policy = Arc::new(FilePolicyStore::open(db.join("config.txt")).unwrap());
    for setting in PolicySetting::ALL {
        policy.set(setting, setting.recommended()).unwrap();
    }
    policy
        .set(PolicySetting::PasswordHistoryDepth, history_depth)
        .unwrap();
    let hasher = Arc::new(Pbkdf2Hasher::with_iterations(1_000).unwrap());

    let editor = AccountsEditor::new(store.clone(), policy, hasher.clone());
    Directory {
        _dir: dir,
        store,
        hasher,
        editor,
    }
}

fn roles() -> RoleSet {
    RoleSet::new([UserRole::Role1, UserRole::Role3]).unwrap()
}

fn history(d: &Directory) -> Vec<String> {
    d.store.archive_entry("alice").unwrap().history
}

// ═══════════════════════════════════════════════════════════════════════
//  Password history
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn alice_with_history_depth_two() {
    let d = directory(2);

    d.editor.create_account("alice", "Passw0rd1", &roles()).unwrap();
    let h = history(&d);
    assert_eq!(h.len(), 1);
    let h1 = h[0].clone();
    assert!(d.hasher.verify("Passw0rd1", &h1).is_ok());

    d.editor.edit_password("alice", "Passw0rd2").unwrap();
    let h = history(&d);
    assert_eq!(h.len(), 2);
    assert_eq!(h[0], h1);
    let h2 = h[1].clone();

    d.editor.edit_password("alice", "Passw0rd3").unwrap();
    let h = history(&d);
    assert_eq!(h.len(), 2);
    assert_eq!(h[0], h2);
    assert!(!h.contains(&h1));

    // h1 was evicted, so the first password may be used again.
    d.editor.edit_password("alice", "Passw0rd1").unwrap();
    let record = d.store.active_record("alice").unwrap();
    assert!(d.hasher.verify("Passw0rd1", &record.password_hash).is_ok());
    assert_eq!(record.roles, roles());
}

#[test]
fn history_length_never_exceeds_depth() {
    let d = directory(3);
    d.editor.create_account("alice", "Passw0rd0", &roles()).unwrap();
    let first = history(&d)[0].clone();

    for i in 1..=4 {
        d.editor
            .edit_password("alice", &format!("Passw0rd{i}"))
            .unwrap();
        assert!(history(&d).len() <= 3);
    }
    assert_eq!(history(&d).len(), 3);
    assert!(!history(&d).contains(&first));
}

#[test]
fn recent_password_is_reused() {
    let d = directory(3);
    d.editor.create_account("alice", "Passw0rd1", &roles()).unwrap();
    d.editor.edit_password("alice", "Passw0rd2").unwrap();

    for recent in ["Passw0rd1", "Passw0rd2"] {
        assert_eq!(
            d.editor.edit_password("alice", recent).unwrap_err(),
            DirectoryError::PasswordReused
        );
    }
    d.editor.edit_password("alice", "Fresh_pass9").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════
//  Policy and uniqueness
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn invalid_chars_rejected_on_disk() {
    let d = directory(2);
    let err = d
        .editor
        .create_account("alice", "Abc$23456", &roles())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PasswordInvalidChars);
    assert!(d.store.list(Table::Active).unwrap().is_empty());
    assert!(d.store.list(Table::Archive).unwrap().is_empty());
}

#[test]
fn full_lifecycle_on_disk() {
    let d = directory(5);
    d.editor.create_account("alice", "Passw0rd1", &roles()).unwrap();
    d.editor.create_account("bob", "B0bsecret", &roles()).unwrap();

    d.editor
        .edit_roles("bob", &RoleSet::single(UserRole::Role4))
        .unwrap();
    d.editor.delete_account("alice").unwrap();

    assert_eq!(d.store.list(Table::Active).unwrap().len(), 1);
    assert_eq!(d.store.list(Table::Archive).unwrap().len(), 2);
    assert_eq!(
        d.editor
            .create_account("alice", "Passw0rd2", &roles())
            .unwrap_err()
            .code(),
        ErrorCode::LoginAlreadyExists
    );
    assert_eq!(
        d.editor.delete_account("alice").unwrap_err().code(),
        ErrorCode::LoginNotFound
    );
}

#[test]
fn login_with_whitespace_is_never_archived() {
    let d = directory(2);
    for password in ["Passw0rd1", "Passw0rd2"] {
        let err = d
            .editor
            .create_account("al ice", password, &roles())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }
    assert_eq!(
        d.editor
            .create_account("", "Passw0rd3", &roles())
            .unwrap_err()
            .code(),
        ErrorCode::DatabaseError
    );
    assert!(d.store.list(Table::Archive).unwrap().is_empty());
}

#[test]
fn tampered_iteration_count_in_history_is_skipped() {
    let d = directory(5);
    d.editor.create_account("alice", "Passw0rd1", &roles()).unwrap();

    let genuine = history(&d).remove(0);
    let (_, salt_and_key) = genuine.split_once(':').unwrap();
    std::fs::write(
        &d.store.paths().archive,
        format!("alice 4294967295:{salt_and_key} {genuine}\n"),
    )
    .unwrap();

    // Finishes promptly: the oversized count is rejected, not computed.
    assert_eq!(
        d.editor.edit_password("alice", "Passw0rd1").unwrap_err(),
        DirectoryError::PasswordReused
    );
    d.editor.edit_password("alice", "Passw0rd2").unwrap();
    assert_eq!(history(&d).len(), 3);
}
