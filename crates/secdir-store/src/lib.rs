//! # secdir-store
//!
//! Record store for the secdir account directory.
//!
//! Two line-oriented tables live side by side:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Active   login hash DD.MM.YYYY 0,2     one per account   │
//! │  Archive  login hash0 hash1 ... hashN   one per login ever│
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The archive is append-mostly and never loses a login, which makes it the
//! authority on login uniqueness. Mutations other than appends stream the
//! table through a scratch file and rename it back (see [`rewrite`]).
//!
//! ## Quick start
//!
//! ```ignore
//! use secdir_store::{FileRecordStore, RecordStore, Table, TablePaths};
//!
//! let store = FileRecordStore::open(TablePaths::in_dir("configDb"))?;
//! store.add_user("alice", &hash, &roles)?;
//! for line in store.list(Table::Active)? {
//!     println!("{line}");
//! }
//! ```

pub mod cursor;
pub mod edit;
pub mod file;
pub mod memory;
pub mod record;
pub mod rewrite;
pub mod store;

// ── re-exports ───────────────────────────────────────────────────────

pub use cursor::{Table, TableCursor};
pub use edit::LineEdit;
pub use file::{FileRecordStore, TablePaths};
pub use memory::MemoryRecordStore;
pub use record::{
    ActiveRecord, ArchiveEntry, check_login, format_date, leading_token, parse_date, today,
};
pub use store::RecordStore;
