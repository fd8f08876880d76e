//! The record store capability.

use secdir_types::{DirectoryError, DirectoryResult, RoleSet};

use crate::cursor::{Table, TableCursor};
use crate::record::{ActiveRecord, ArchiveEntry};

/// Owner of the active and archive tables.
///
/// The archive is the uniqueness authority: a login that has ever been
/// created stays in the archive forever, so it can never be created again.
/// Implementations must be `Send + Sync` so the store can be shared behind
/// an `Arc`.
pub trait RecordStore: Send + Sync {
    /// Open a fresh scan over `table` and return it with its first line.
    ///
    /// Returns [`DirectoryError::EndOfTable`] if the table is empty and
    /// [`DirectoryError::Database`] if it cannot be opened.
    fn scan_first(&self, table: Table) -> DirectoryResult<(TableCursor, String)>;

    /// The first line of `table` whose leading token equals `login`.
    ///
    /// Independent of any open scan. Returns
    /// [`DirectoryError::LoginNotFound`] if no line matches.
    fn lookup(&self, table: Table, login: &str) -> DirectoryResult<String>;

    /// Append an active line dated today and an archive line holding
    /// `password_hash` as the first history entry.
    ///
    /// Returns [`DirectoryError::LoginAlreadyExists`] if `login` is already
    /// in the archive, and [`DirectoryError::Database`] if `login` is empty
    /// or contains whitespace. The two appends are not atomic as a pair.
    fn add_user(&self, login: &str, password_hash: &str, roles: &RoleSet) -> DirectoryResult<()>;

    /// Delete `login`'s active line. The archive is untouched.
    fn remove_user(&self, login: &str) -> DirectoryResult<()>;

    /// Replace `login`'s active hash and date, then push `password_hash`
    /// onto its archive history bounded by `history_depth`.
    fn update_password(
        &self,
        login: &str,
        password_hash: &str,
        history_depth: u32,
    ) -> DirectoryResult<()>;

    /// Replace only the role field of `login`'s active line.
    fn update_roles(&self, login: &str, roles: &RoleSet) -> DirectoryResult<()>;

    // -- Provided -----------------------------------------------------------

    /// Look up and parse `login`'s active record.
    fn active_record(&self, login: &str) -> DirectoryResult<ActiveRecord> {
        ActiveRecord::parse(&self.lookup(Table::Active, login)?)
    }

    /// Look up and parse `login`'s archive entry.
    fn archive_entry(&self, login: &str) -> DirectoryResult<ArchiveEntry> {
        ArchiveEntry::parse(&self.lookup(Table::Archive, login)?)
    }

    /// Every line of `table`, in order.
    fn list(&self, table: Table) -> DirectoryResult<Vec<String>> {
        let (cursor, first) = match self.scan_first(table) {
            Ok(scan) => scan,
            Err(DirectoryError::EndOfTable) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        std::iter::once(Ok(first)).chain(cursor).collect()
    }
}
