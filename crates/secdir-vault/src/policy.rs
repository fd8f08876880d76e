//! Security policy settings.
//!
//! Six independent unsigned settings govern passwords and login sessions.
//! They are read and written one at a time through [`PolicyStore`]; the
//! engine never enforces relations between them.
//!
//! [`FilePolicyStore`] persists the settings as `<key> <value>` lines,
//! rewriting the whole file on every change:
//!
//! ```text
//! lockoutTimeMin 15
//! maxFailedAttempts 3
//! minPasswordLength 8
//! passwordHistoryDepth 5
//! ```
//!
//! A setting that has never been written is not an implicit zero: reading it
//! fails with [`DirectoryError::Database`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use secdir_types::{DirectoryError, DirectoryResult};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// One of the six policy settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicySetting {
    /// Minimum password length, in characters.
    MinPasswordLength,
    /// How many past password hashes are kept per login.
    PasswordHistoryDepth,
    /// Days after which a password expires.
    PasswordExpirationDays,
    /// Minutes of inactivity before a session is closed.
    MaxInactiveTimeMin,
    /// Wrong passwords accepted before a login attempt is refused.
    MaxFailedAttempts,
    /// Minutes an account stays locked after too many failures.
    LockoutTimeMin,
}

impl PolicySetting {
    /// Every setting, in menu order.
    pub const ALL: [PolicySetting; 6] = [
        Self::MinPasswordLength,
        Self::PasswordHistoryDepth,
        Self::PasswordExpirationDays,
        Self::MaxInactiveTimeMin,
        Self::MaxFailedAttempts,
        Self::LockoutTimeMin,
    ];

    /// The key written to the policy file.
    pub fn key(&self) -> &'static str {
        match self {
            Self::MinPasswordLength => "minPasswordLength",
            Self::PasswordHistoryDepth => "passwordHistoryDepth",
            Self::PasswordExpirationDays => "passwordExpirationDays",
            Self::MaxInactiveTimeMin => "maxInactiveTimeMin",
            Self::MaxFailedAttempts => "maxFailedAttempts",
            Self::LockoutTimeMin => "lockoutTimeMin",
        }
    }

    /// Resolve a policy-file key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    /// Human-readable label used by the CLI.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MinPasswordLength => "Minimum Password Length",
            Self::PasswordHistoryDepth => "Password History Depth",
            Self::PasswordExpirationDays => "Password Expiration Days",
            Self::MaxInactiveTimeMin => "Max Inactive Time (minutes)",
            Self::MaxFailedAttempts => "Max Failed Attempts",
            Self::LockoutTimeMin => "Lockout Time (minutes)",
        }
    }

    /// Value written by `settings init` for a fresh installation.
    pub fn recommended(&self) -> u32 {
        match self {
            Self::MinPasswordLength => 8,
            Self::PasswordHistoryDepth => 5,
            Self::PasswordExpirationDays => 90,
            Self::MaxInactiveTimeMin => 15,
            Self::MaxFailedAttempts => 3,
            Self::LockoutTimeMin => 30,
        }
    }
}

impl fmt::Display for PolicySetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// All settings at a point in time; `None` marks a setting never written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySnapshot {
    pub min_password_length: Option<u32>,
    pub password_history_depth: Option<u32>,
    pub password_expiration_days: Option<u32>,
    pub max_inactive_time_min: Option<u32>,
    pub max_failed_attempts: Option<u32>,
    pub lockout_time_min: Option<u32>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Read/write access to the policy settings, one setting at a time.
pub trait PolicyStore: Send + Sync {
    /// Read a setting.
    ///
    /// Returns [`DirectoryError::Database`] if the setting has never been
    /// written.
    fn get(&self, setting: PolicySetting) -> DirectoryResult<u32>;

    /// Write a setting and persist the change.
    fn set(&self, setting: PolicySetting, value: u32) -> DirectoryResult<()>;

    fn min_password_length(&self) -> DirectoryResult<u32> {
        self.get(PolicySetting::MinPasswordLength)
    }

    fn password_history_depth(&self) -> DirectoryResult<u32> {
        self.get(PolicySetting::PasswordHistoryDepth)
    }

    fn password_expiration_days(&self) -> DirectoryResult<u32> {
        self.get(PolicySetting::PasswordExpirationDays)
    }

    fn max_inactive_time_min(&self) -> DirectoryResult<u32> {
        self.get(PolicySetting::MaxInactiveTimeMin)
    }

    fn max_failed_attempts(&self) -> DirectoryResult<u32> {
        self.get(PolicySetting::MaxFailedAttempts)
    }

    fn lockout_time_min(&self) -> DirectoryResult<u32> {
        self.get(PolicySetting::LockoutTimeMin)
    }

    /// Read every setting, tolerating missing ones.
    fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            min_password_length: self.min_password_length().ok(),
            password_history_depth: self.password_history_depth().ok(),
            password_expiration_days: self.password_expiration_days().ok(),
            max_inactive_time_min: self.max_inactive_time_min().ok(),
            max_failed_attempts: self.max_failed_attempts().ok(),
            lockout_time_min: self.lockout_time_min().ok(),
        }
    }
}

type SettingMap = BTreeMap<PolicySetting, u32>;

fn lock(data: &Mutex<SettingMap>) -> DirectoryResult<MutexGuard<'_, SettingMap>> {
    data.lock()
        .map_err(|_| DirectoryError::database("policy settings lock poisoned"))
}

fn missing(setting: PolicySetting) -> DirectoryError {
    DirectoryError::database(format!("policy setting {setting} is not configured"))
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Policy store persisted as `<key> <value>` lines.
pub struct FilePolicyStore {
    path: PathBuf,
    data: Mutex<SettingMap>,
}

impl FilePolicyStore {
    /// Load the policy file at `path`.
    ///
    /// A missing file loads as an empty store (every `get` fails until the
    /// setting is written). Unknown keys and unparsable lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Database`] if the file exists but cannot be
    /// read.
    pub fn open(path: impl Into<PathBuf>) -> DirectoryResult<Self> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => parse_policy_file(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "policy file not found, starting empty");
                SettingMap::new()
            }
            Err(e) => {
                return Err(DirectoryError::database(format!(
                    "cannot read policy file {}: {e}",
                    path.display()
                )));
            }
        };

        tracing::debug!(path = %path.display(), settings = data.len(), "loaded policy settings");

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, data: &SettingMap) -> DirectoryResult<()> {
        let mut lines: Vec<(&'static str, u32)> =
            data.iter().map(|(setting, value)| (setting.key(), *value)).collect();
        lines.sort_by_key(|(key, _)| *key);

        let mut content = String::new();
        for (key, value) in lines {
            content.push_str(&format!("{key} {value}\n"));
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content).map_err(|e| {
            DirectoryError::database(format!(
                "cannot write policy file {}: {e}",
                self.path.display()
            ))
        })
    }
}

impl PolicyStore for FilePolicyStore {
    fn get(&self, setting: PolicySetting) -> DirectoryResult<u32> {
        lock(&self.data)?
            .get(&setting)
            .copied()
            .ok_or_else(|| missing(setting))
    }

    fn set(&self, setting: PolicySetting, value: u32) -> DirectoryResult<()> {
        let mut data = lock(&self.data)?;
        let previous = data.insert(setting, value);

        if let Err(e) = self.save(&data) {
            // Keep memory consistent with the file that is still on disk.
            match previous {
                Some(old) => data.insert(setting, old),
                None => data.remove(&setting),
            };
            return Err(e);
        }

        tracing::info!(setting = %setting, value, "policy setting updated");
        Ok(())
    }
}

/// Parse the `<key> <value>` policy format.
fn parse_policy_file(content: &str) -> SettingMap {
    let mut data = SettingMap::new();
    for (lineno, line) in content.lines().enumerate() {
        let mut fields = line.split_whitespace();
        let (Some(key), Some(value)) = (fields.next(), fields.next()) else {
            continue;
        };
        let Some(setting) = PolicySetting::from_key(key) else {
            tracing::debug!(line = lineno + 1, key, "ignoring unknown policy key");
            continue;
        };
        match value.parse::<u32>() {
            Ok(value) => {
                data.insert(setting, value);
            }
            Err(_) => {
                tracing::warn!(line = lineno + 1, key, value, "ignoring unparsable policy value");
            }
        }
    }
    data
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Policy store held entirely in memory.
#[derive(Default)]
pub struct MemoryPolicyStore {
    data: Mutex<SettingMap>,
}

impl MemoryPolicyStore {
    /// An empty store: every `get` fails until the setting is written.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with the given settings.
    pub fn with(settings: impl IntoIterator<Item = (PolicySetting, u32)>) -> Self {
        Self {
            data: Mutex::new(settings.into_iter().collect()),
        }
    }

    /// A store holding every [`PolicySetting::recommended`] value.
    pub fn recommended() -> Self {
        Self::with(PolicySetting::ALL.map(|s| (s, s.recommended())))
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn get(&self, setting: PolicySetting) -> DirectoryResult<u32> {
        lock(&self.data)?
            .get(&setting)
            .copied()
            .ok_or_else(|| missing(setting))
    }

    fn set(&self, setting: PolicySetting, value: u32) -> DirectoryResult<()> {
        lock(&self.data)?.insert(setting, value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
