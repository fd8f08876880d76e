//! Flat-file record store.
//!
//! Both tables are plain text files, one record per line. Appends go
//! straight to the end of a table; every other mutation goes through the
//! rewrite protocol in [`crate::rewrite`], which reuses a single scratch file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use secdir_types::{DirectoryError, DirectoryResult, RoleSet};

use crate::cursor::{Table, TableCursor};
use crate::edit;
use crate::record::{ActiveRecord, ArchiveEntry, check_login, leading_token, today};
use crate::rewrite::rewrite_table;
use crate::store::RecordStore;

/// Default active table file name.
pub const ACTIVE_FILE: &str = "active_users.txt";
/// Default archive table file name.
pub const ARCHIVE_FILE: &str = "archive.txt";
/// Default scratch file name.
pub const SCRATCH_FILE: &str = "tmp_file.txt";

/// Locations of the two tables and the shared scratch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    pub active: PathBuf,
    pub archive: PathBuf,
    pub scratch: PathBuf,
}

impl TablePaths {
    /// The default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            active: dir.join(ACTIVE_FILE),
            archive: dir.join(ARCHIVE_FILE),
            scratch: dir.join(SCRATCH_FILE),
        }
    }
}

/// [`RecordStore`] backed by two text files.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    paths: TablePaths,
}

impl FileRecordStore {
    /// Store over `paths`. Performs no I/O; missing files surface as
    /// [`DirectoryError::Database`] on first read.
    pub fn new(paths: TablePaths) -> Self {
        Self { paths }
    }

    /// Store over `paths`, creating parent directories and empty tables
    /// where they do not exist yet.
    pub fn open(paths: TablePaths) -> DirectoryResult<Self> {
        for path in [&paths.active, &paths.archive, &paths.scratch] {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).map_err(|e| {
                    DirectoryError::database(format!("cannot create {}: {e}", parent.display()))
                })?;
            }
        }
        for path in [&paths.active, &paths.archive] {
            open_append(path)?;
        }
        tracing::debug!(
            active = %paths.active.display(),
            archive = %paths.archive.display(),
            "record store opened"
        );
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &TablePaths {
        &self.paths
    }

    fn table_path(&self, table: Table) -> &Path {
        match table {
            Table::Active => &self.paths.active,
            Table::Archive => &self.paths.archive,
        }
    }

    fn open_table(&self, table: Table) -> DirectoryResult<File> {
        let path = self.table_path(table);
        File::open(path).map_err(|e| {
            DirectoryError::database(format!("cannot open {table} table {}: {e}", path.display()))
        })
    }

    fn append(&self, table: Table, line: &str) -> DirectoryResult<()> {
        let mut file = open_append(self.table_path(table))?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn rewrite<F>(&self, table: Table, edit: F) -> DirectoryResult<usize>
    where
        F: FnMut(&str) -> DirectoryResult<edit::LineEdit>,
    {
        rewrite_table(self.table_path(table), &self.paths.scratch, edit)
    }
}

fn open_append(path: &Path) -> DirectoryResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DirectoryError::database(format!("cannot open {}: {e}", path.display())))
}

impl RecordStore for FileRecordStore {
    fn scan_first(&self, table: Table) -> DirectoryResult<(TableCursor, String)> {
        let file = self.open_table(table)?;
        let mut cursor = TableCursor::new(table, Box::new(BufReader::new(file)));
        let first = cursor.next_line()?;
        Ok((cursor, first))
    }

    fn lookup(&self, table: Table, login: &str) -> DirectoryResult<String> {
        let file = self.open_table(table)?;
        for line in BufReader::new(file).lines() {
            let line = line?;
            if leading_token(&line) == login {
                return Ok(line);
            }
        }
        Err(DirectoryError::login_not_found(login))
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
        self.append(Table::Active, &record.to_line())?;

        if let Err(e) = self.append(Table::Archive, &ArchiveEntry::new(login, password_hash).to_line())
        {
            tracing::error!(%login, error = %e, "active record written but archive append failed");
            return Err(e);
        }

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
