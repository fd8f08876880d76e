//! Directory error types.
//!
//! Every layer of the directory (record store, lifecycle engine, policy
//! store, hashing capability) reports failures through [`DirectoryError`].
//! Success is `Ok(..)`; each variant maps onto exactly one code of the flat
//! [`ErrorCode`] taxonomy, which is what callers render to the user.
//!
//! Errors are forwarded unchanged from layer to layer. Nothing in the
//! workspace retries or recovers locally.

use std::fmt;

use serde::Serialize;

/// Unified error type for the security directory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    // -- Login errors -------------------------------------------------------
    /// The login is already recorded in the archive (it may have been
    /// deleted from the active table, but logins are never reused).
    #[error("login already exists: {login}")]
    LoginAlreadyExists { login: String },

    /// The login is not present in the table that was consulted.
    #[error("login not found: {login}")]
    LoginNotFound { login: String },

    // -- Password policy errors ---------------------------------------------
    /// The password is shorter than the configured minimum.
    #[error("password too short: {actual} characters, minimum is {min}")]
    PasswordTooShort { min: u32, actual: usize },

    /// The password contains a character outside the permitted alphabet.
    #[error("password contains invalid character {ch:?}")]
    PasswordInvalidChars { ch: char },

    /// The password matches one of the hashes kept in the login's history.
    #[error("password was used recently")]
    PasswordReused,

    // -- Role errors --------------------------------------------------------
    /// A role identifier could not be resolved.
    #[error("role not found: {role}")]
    RoleNotFound { role: String },

    // -- Storage errors -----------------------------------------------------
    /// Any failure to open, read, write, rename, or parse a backing file,
    /// and any missing policy setting.
    #[error("database error: {reason}")]
    Database { reason: String },

    /// A table scan has no more lines.
    #[error("end of table")]
    EndOfTable,

    // -- Hashing errors -----------------------------------------------------
    /// The hashing primitive failed or a stored hash is malformed.
    #[error("hashing error: {reason}")]
    Hashing { reason: String },

    /// The password does not match the stored hash.
    #[error("passwords don't match")]
    PasswordsDontMatch,
}

impl DirectoryError {
    /// Shorthand for a [`DirectoryError::Database`] with the given reason.
    pub fn database(reason: impl Into<String>) -> Self {
        Self::Database {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`DirectoryError::LoginNotFound`].
    pub fn login_not_found(login: &str) -> Self {
        Self::LoginNotFound {
            login: login.to_string(),
        }
    }

    /// The flat taxonomy code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::LoginAlreadyExists { .. } => ErrorCode::LoginAlreadyExists,
            Self::LoginNotFound { .. } => ErrorCode::LoginNotFound,
            Self::PasswordTooShort { .. } => ErrorCode::PasswordTooShort,
            Self::PasswordInvalidChars { .. } => ErrorCode::PasswordInvalidChars,
            Self::PasswordReused => ErrorCode::PasswordReused,
            Self::RoleNotFound { .. } => ErrorCode::RoleNotFound,
            Self::Database { .. } => ErrorCode::DatabaseError,
            Self::EndOfTable => ErrorCode::EndOfTable,
            Self::Hashing { .. } => ErrorCode::HashingError,
            Self::PasswordsDontMatch => ErrorCode::PasswordsDontMatch,
        }
    }
}

impl From<std::io::Error> for DirectoryError {
    fn from(err: std::io::Error) -> Self {
        Self::Database {
            reason: err.to_string(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

// ---------------------------------------------------------------------------
// Flat taxonomy
// ---------------------------------------------------------------------------

/// The flat result taxonomy shared by the store and the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Success,
    LoginAlreadyExists,
    LoginNotFound,
    PasswordTooShort,
    PasswordInvalidChars,
    PasswordReused,
    RoleNotFound,
    DatabaseError,
    EndOfTable,
    HashingError,
    PasswordsDontMatch,
}

impl ErrorCode {
    /// Collapse a result into its taxonomy code.
    pub fn of<T>(result: &DirectoryResult<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(e) => e.code(),
        }
    }

    /// The message shown to an operator.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::LoginAlreadyExists => "Login already exists",
            Self::LoginNotFound => "Login not found",
            Self::PasswordTooShort => "Password too short",
            Self::PasswordInvalidChars => "Password contains invalid chars",
            Self::PasswordReused => "Reused password",
            Self::RoleNotFound => "Role not found",
            Self::DatabaseError => "Database error",
            Self::EndOfTable => "End of table",
            Self::HashingError => "Hashing error",
            Self::PasswordsDontMatch => "Passwords don't match",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
