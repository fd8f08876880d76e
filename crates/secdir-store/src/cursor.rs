//! Forward-only table scans.
//!
//! A [`TableCursor`] owns its own reader, so any number of scans can be open
//! at once and restarting a scan is simply asking the store for a new cursor.

use std::fmt;
use std::io::BufRead;

use secdir_types::{DirectoryError, DirectoryResult};

/// The two tables owned by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// One line per currently enabled account.
    Active,
    /// One line per login ever created, with its password history.
    Archive,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archive => "archive",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open scan over one table.
///
/// [`next_line`](Self::next_line) yields lines in file order and
/// [`DirectoryError::EndOfTable`] once the table is exhausted. After a read
/// failure the cursor is dead and every call returns
/// [`DirectoryError::Database`].
pub struct TableCursor {
    table: Table,
    reader: Box<dyn BufRead + Send>,
    failed: bool,
}

impl TableCursor {
    pub(crate) fn new(table: Table, reader: Box<dyn BufRead + Send>) -> Self {
        Self {
            table,
            reader,
            failed: false,
        }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// Advance to the next line.
    pub fn next_line(&mut self) -> DirectoryResult<String> {
        if self.failed {
            return Err(DirectoryError::database(format!(
                "{} scan aborted by an earlier read failure",
                self.table
            )));
        }

        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => Err(DirectoryError::EndOfTable),
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Ok(line)
            }
            Err(e) => {
                self.failed = true;
                tracing::warn!(table = %self.table, error = %e, "table scan failed");
                Err(e.into())
            }
        }
    }
}

impl Iterator for TableCursor {
    type Item = DirectoryResult<String>;

    /// Lines until the end of the table; a read failure is yielded once.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_line() {
            Err(DirectoryError::EndOfTable) => None,
            other => Some(other),
        }
    }
}

impl fmt::Debug for TableCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableCursor")
            .field("table", &self.table)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
