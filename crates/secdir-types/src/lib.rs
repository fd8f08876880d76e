//! Shared types for the secdir security directory.
//!
//! - [`error`]: the flat error taxonomy every crate reports through.
//! - [`role`]: account roles and non-empty role sets.

pub mod error;
pub mod role;

pub use error::{DirectoryError, DirectoryResult, ErrorCode};
pub use role::{RoleSet, UserRole};
