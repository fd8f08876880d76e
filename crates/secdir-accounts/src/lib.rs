//! # secdir-accounts
//!
//! Account lifecycle engine for the secdir directory.
//!
//! [`AccountsEditor`] enforces login uniqueness and the password policy on
//! top of an injected [`RecordStore`](secdir_store::RecordStore),
//! [`PolicyStore`](secdir_vault::PolicyStore) and
//! [`PasswordHasher`](secdir_vault::PasswordHasher).
//!
//! ## Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use secdir_accounts::AccountsEditor;
//!
//! let editor = AccountsEditor::new(Arc::new(store), Arc::new(policy), Arc::new(hasher));
//! editor.create_account("alice", "Passw0rd1", &roles)?;
//! editor.edit_password("alice", "Passw0rd2")?;
//! ```

pub mod editor;
pub mod password;

pub use editor::AccountsEditor;
pub use password::{SPECIAL_CHARS, first_invalid_char, is_valid_char};
