//! The account lifecycle engine.
//!
//! [`AccountsEditor`] is a stateless orchestrator over three capabilities:
//! the record store, the policy store, and the password hasher. It owns no
//! data of its own and mutates the tables only through [`RecordStore`].
//! Every failure is forwarded unchanged; nothing is retried.

use std::sync::Arc;

use secdir_store::{RecordStore, Table};
use secdir_types::{DirectoryError, DirectoryResult, RoleSet};
use secdir_vault::{PasswordHasher, PolicyStore};
use tracing::instrument;

use crate::password::first_invalid_char;

// ---------------------------------------------------------------------------
// AccountsEditor
// ---------------------------------------------------------------------------

/// Creates, deletes and edits accounts under the configured policy.
pub struct AccountsEditor {
    store: Arc<dyn RecordStore>,
    policy: Arc<dyn PolicyStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AccountsEditor {
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

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn policy(&self) -> &Arc<dyn PolicyStore> {
        &self.policy
    }

    /// Create an account.
    ///
    /// The login must never have been used before, i.e. it must be absent
    /// from the archive, and the password must satisfy the policy.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::LoginAlreadyExists`], any password policy error,
    /// [`DirectoryError::Hashing`], or a store error.
    #[instrument(skip(self, password, roles))]
    pub fn create_account(
        &self,
        login: &str,
        password: &str,
        roles: &RoleSet,
    ) -> DirectoryResult<()> {
        match self.store.lookup(Table::Archive, login) {
            Ok(_) => {
                return Err(DirectoryError::LoginAlreadyExists {
                    login: login.to_string(),
                });
            }
            Err(DirectoryError::LoginNotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        self.check_password(login, password)?;
        let hash = self.hasher.make(password)?;
        self.store.add_user(login, &hash, roles)?;

        tracing::info!(%login, roles = %roles, "account created");
        Ok(())
    }

    /// Disable an account. Its login stays reserved in the archive.
    #[instrument(skip(self))]
    pub fn delete_account(&self, login: &str) -> DirectoryResult<()> {
        self.require_active(login)?;
        self.store.remove_user(login)?;

        tracing::info!(%login, "account deleted");
        Ok(())
    }

    /// Set a new password, pushing it onto the login's history.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::LoginNotFound`] if the account is not active,
    /// [`DirectoryError::PasswordReused`] if the password matches a hash
    /// still kept in the history, any other policy error, or a store error.
    #[instrument(skip(self, new_password))]
    pub fn edit_password(&self, login: &str, new_password: &str) -> DirectoryResult<()> {
        self.require_active(login)?;
        self.check_password(login, new_password)?;

        let depth = self.policy.password_history_depth()?;
        let hash = self.hasher.make(new_password)?;
        self.store.update_password(login, &hash, depth)?;

        tracing::info!(%login, history_depth = depth, "password changed");
        Ok(())
    }

    /// Replace the roles of an active account.
    #[instrument(skip(self, new_roles))]
    pub fn edit_roles(&self, login: &str, new_roles: &RoleSet) -> DirectoryResult<()> {
        self.require_active(login)?;
        self.store.update_roles(login, new_roles)?;

        tracing::info!(%login, roles = %new_roles, "roles changed");
        Ok(())
    }

    fn require_active(&self, login: &str) -> DirectoryResult<()> {
        self.store.lookup(Table::Active, login).map(|_| ())
    }

    /// Apply the password policy, in order: reuse against the archived
    /// history, minimum length, permitted characters.
    fn check_password(&self, login: &str, password: &str) -> DirectoryResult<()> {
        match self.store.archive_entry(login) {
            Ok(entry) => {
                for hash in &entry.history {
                    match self.hasher.verify(password, hash) {
                        Ok(()) => return Err(DirectoryError::PasswordReused),
                        Err(DirectoryError::PasswordsDontMatch) => {}
                        Err(DirectoryError::Hashing { reason }) => {
                            tracing::warn!(%login, %reason, "skipping unreadable history hash");
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
            Err(DirectoryError::LoginNotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let min = self.policy.min_password_length()?;
        let actual = password.chars().count();
        if actual < usize::try_from(min).unwrap_or(usize::MAX) {
            return Err(DirectoryError::PasswordTooShort { min, actual });
        }

        if let Some(ch) = first_invalid_char(password) {
            return Err(DirectoryError::PasswordInvalidChars { ch });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
