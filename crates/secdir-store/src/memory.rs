//! In-memory record store for tests and dry runs.

use std::io::Cursor;
use std::sync::{Mutex, MutexGuard};

use secdir_types::{DirectoryError, DirectoryResult, RoleSet};

use crate::cursor::{Table, TableCursor};
use crate::edit::{self, LineEdit, apply_edits};
use crate::record::{ActiveRecord, ArchiveEntry, check_login, leading_token, today};
use crate::store::RecordStore;

/// [`RecordStore`] holding both tables as line vectors.
///
/// Lines are stored in exactly the on-disk format, and every mutation runs
/// through the same line transforms as [`FileRecordStore`], so the two
/// stores are interchangeable.
///
/// [`FileRecordStore`]: crate::FileRecordStore
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    active: Mutex<Vec<String>>,
    archive: Mutex<Vec<String>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with raw table lines.
    pub fn with_lines<A, R>(active: A, archive: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            active: Mutex::new(active.into_iter().map(Into::into).collect()),
            archive: Mutex::new(archive.into_iter().map(Into::into).collect()),
        }
    }

    /// Snapshot of the raw lines of `table`.
    pub fn lines(&self, table: Table) -> DirectoryResult<Vec<String>> {
        Ok(self.table(table)?.clone())
    }

    fn table(&self, table: Table) -> DirectoryResult<MutexGuard<'_, Vec<String>>> {
        let lock = match table {
            Table::Active => &self.active,
            Table::Archive => &self.archive,
        };
        lock.lock()
            .map_err(|_| DirectoryError::database(format!("{table} table lock poisoned")))
    }

    fn rewrite<F>(&self, table: Table, edit: F) -> DirectoryResult<usize>
    where
        F: FnMut(&str) -> DirectoryResult<LineEdit>,
    {
        let mut lines = self.table(table)?;
        let (rewritten, edited) = apply_edits(&lines, edit)?;
        *lines = rewritten;
        Ok(edited)
    }
}

impl RecordStore for MemoryRecordStore {
    fn scan_first(&self, table: Table) -> DirectoryResult<(TableCursor, String)> {
        let mut snapshot = String::new();
        for line in self.table(table)?.iter() {
            snapshot.push_str(line);
            snapshot.push('\n');
        }
        let mut cursor = TableCursor::new(table, Box::new(Cursor::new(snapshot.into_bytes())));
        let first = cursor.next_line()?;
        Ok((cursor, first))
    }

    fn lookup(&self, table: Table, login: &str) -> DirectoryResult<String> {
        self.table(table)?
            .iter()
            .find(|line| leading_token(line) == login)
            .cloned()
            .ok_or_else(|| DirectoryError::login_not_found(login))
    }

    fn add_user(&self, login: &str, password_hash: &str, roles: &RoleSet) -> DirectoryResult<()> {
        check_login(login)?;
        match self.lookup(Table::Archive, login) {
            Ok(_) => {
                return Err(DirectoryError::LoginAlreadyExists {
                    login: login.to_string(),
                });
            }
            Err(DirectoryError::LoginNotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let record = ActiveRecord {
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            password_set: today(),
            roles: roles.clone(),
        };
        self.table(Table::Active)?.push(record.to_line());
        self.table(Table::Archive)?
            .push(ArchiveEntry::new(login, password_hash).to_line());

        tracing::info!(%login, roles = %roles, "user added");
        Ok(())
    }

    fn remove_user(&self, login: &str) -> DirectoryResult<()> {
        if self.rewrite(Table::Active, edit::remove_login(login))? == 0 {
            return Err(DirectoryError::login_not_found(login));
        }
        tracing::info!(%login, "user removed");
        Ok(())
    }

    fn update_password(
        &self,
        login: &str,
        password_hash: &str,
        history_depth: u32,
    ) -> DirectoryResult<()> {
        let edited = self.rewrite(
            Table::Active,
            edit::replace_password(login, password_hash, today()),
        )?;
        if edited == 0 {
            return Err(DirectoryError::login_not_found(login));
        }

        let edited = self.rewrite(
            Table::Archive,
            edit::append_history(login, password_hash, history_depth),
        )?;
        if edited == 0 {
            tracing::warn!(%login, "active record updated but login missing from archive");
            return Err(DirectoryError::login_not_found(login));
        }

        tracing::info!(%login, history_depth, "password updated");
        Ok(())
    }

    fn update_roles(&self, login: &str, roles: &RoleSet) -> DirectoryResult<()> {
        if self.rewrite(Table::Active, edit::replace_roles(login, roles))? == 0 {
            return Err(DirectoryError::login_not_found(login));
        }
        tracing::info!(%login, roles = %roles, "roles updated");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
