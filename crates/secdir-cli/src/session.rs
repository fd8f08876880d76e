//! Login session checker.
//!
//! The user-facing side of the directory: read a login, find the active
//! record, give the user `maxFailedAttempts` tries at the password, then
//! refuse access if the password is older than `passwordExpirationDays`.

use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;

use chrono::NaiveDate;
use secdir_store::{ActiveRecord, RecordStore, Table};
use secdir_types::DirectoryError;
use secdir_vault::{PasswordHasher, PolicyStore};

use crate::helpers;

const LOGIN_PROMPT: &str = "Enter your login: ";
const FIRST_PASSWORD_PROMPT: &str = "Enter your password:";
const RETRY_PASSWORD_PROMPT: &str = "Wrong password, try again:";

/// Why a login attempt was refused. Displays as the message shown to the
/// user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("Error entering login")]
    LoginEntering,

    #[error("Error entering password")]
    PasswordEntering,

    #[error("There is no user with this username")]
    LoginNotExists,

    /// The record or a policy setting could not be read.
    #[error("Database error")]
    Data { reason: String },

    #[error("Incorrect password was entered.")]
    WrongPassword,

    #[error("The password has expired")]
    PasswordHasExpired,
}

impl From<DirectoryError> for LoginError {
    fn from(err: DirectoryError) -> Self {
        Self::Data {
            reason: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Where the checker reads the login and passwords from.
///
/// `Ok(None)` means the input ended.
pub trait LoginInput {
    fn login(&mut self, prompt: &str) -> io::Result<Option<String>>;
    fn password(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Reads the login from `input` and passwords without echo when stdin is
/// a terminal.
pub struct TerminalInput<R, W> {
    input: R,
    out: W,
    hide_passwords: bool,
}

impl<R: BufRead, W: Write> TerminalInput<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self {
            input,
            out,
            hide_passwords: io::stdin().is_terminal(),
        }
    }
}

impl<R: BufRead, W: Write> LoginInput for TerminalInput<R, W> {
    fn login(&mut self, prompt: &str) -> io::Result<Option<String>> {
        writeln!(self.out, "{prompt}")?;
        self.out.flush()?;
        helpers::read_line(&mut self.input)
    }

    fn password(&mut self, prompt: &str) -> io::Result<Option<String>> {
        writeln!(self.out, "{prompt}")?;
        self.out.flush()?;
        if self.hide_passwords {
            rpassword::read_password().map(Some)
        } else {
            helpers::read_line(&mut self.input)
        }
    }
}

// ---------------------------------------------------------------------------
// LoginSession
// ---------------------------------------------------------------------------

/// Checks one login attempt against the directory.
pub struct LoginSession {
    store: Arc<dyn RecordStore>,
    policy: Arc<dyn PolicyStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl LoginSession {
    pub fn new(
        store: Arc<dyn RecordStore>,
        policy: Arc<dyn PolicyStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            store,
            policy,
            hasher,
        }
    }

    /// Run the check, returning the user's record when access is allowed.
    ///
    /// `today` is the local date the password age is measured against.
    pub fn check(
        &self,
        input: &mut dyn LoginInput,
        today: NaiveDate,
    ) -> Result<ActiveRecord, LoginError> {
        let login = match input.login(LOGIN_PROMPT) {
            Ok(Some(login)) if !login.is_empty() => login,
            _ => return Err(LoginError::LoginEntering),
        };

        let line = self
            .store
            .lookup(Table::Active, &login)
            .map_err(|e| match e {
                DirectoryError::LoginNotFound { .. } => LoginError::LoginNotExists,
                other => other.into(),
            })?;
        let record = ActiveRecord::parse(&line)?;

        self.verify_password(input, &record)?;
        self.check_expiration(&record, today)?;

        tracing::info!(login = %record.login, "access allowed");
        Ok(record)
    }

    fn verify_password(
        &self,
        input: &mut dyn LoginInput,
        record: &ActiveRecord,
    ) -> Result<(), LoginError> {
        let max_attempts = self.policy.max_failed_attempts()?;

        for attempt in 0..max_attempts {
            let prompt = if attempt == 0 {
                FIRST_PASSWORD_PROMPT
            } else {
                RETRY_PASSWORD_PROMPT
            };
            let password = match input.password(prompt) {
                Ok(Some(password)) if !password.is_empty() => password,
                _ => return Err(LoginError::PasswordEntering),
            };

            match self.hasher.verify(&password, &record.password_hash) {
                Ok(()) => return Ok(()),
                Err(DirectoryError::PasswordsDontMatch) => {}
                Err(e) => {
                    tracing::warn!(login = %record.login, error = %e, "stored hash unusable");
                }
            }
        }

        tracing::warn!(login = %record.login, max_attempts, "too many wrong passwords");
        Err(LoginError::WrongPassword)
    }

    fn check_expiration(&self, record: &ActiveRecord, today: NaiveDate) -> Result<(), LoginError> {
        let expiration_days = self.policy.password_expiration_days()?;

        let age = (today - record.password_set).num_days();
        if age < 0 {
            return Err(LoginError::Data {
                reason: format!(
                    "password of {} set in the future ({})",
                    record.login, record.password_set
                ),
            });
        }
        if age > i64::from(expiration_days) {
            return Err(LoginError::PasswordHasExpired);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
