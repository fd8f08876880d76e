//! Directory configuration.
//!
//! Reads file locations and hashing parameters from a TOML file (by default
//! `config/secdir.toml`). Every key is optional:
//!
//! ```toml
//! [storage]
//! active_file = "./configDb/active_users.txt"
//! archive_file = "./configDb/archive.txt"
//! scratch_file = "./configDb/tmp_file.txt"
//! policy_file = "./configDb/config.txt"
//!
//! [hashing]
//! pbkdf2_iterations = 600000
//! ```
//!
//! `SECDIR_DATA_DIR` (from the environment or `.env`) moves all four files
//! into one directory and takes precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use secdir_store::TablePaths;
use secdir_store::file::{ACTIVE_FILE, ARCHIVE_FILE, SCRATCH_FILE};
use secdir_vault::hashing::DEFAULT_ITERATIONS;
use serde::Deserialize;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/secdir.toml";

/// Environment variable relocating every data file.
pub const DATA_DIR_ENV: &str = "SECDIR_DATA_DIR";

/// Directory holding the data files when nothing else is configured.
const DEFAULT_DATA_DIR: &str = "./configDb";

/// Policy file name inside the data directory.
const POLICY_FILE: &str = "config.txt";

// ---------------------------------------------------------------------------
// DirectoryConfig
// ---------------------------------------------------------------------------

/// Resolved configuration for one run of the binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub storage: StorageConfig,
    pub hashing: HashingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub active_file: PathBuf,
    pub archive_file: PathBuf,
    pub scratch_file: PathBuf,
    pub policy_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    pub pbkdf2_iterations: u32,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::in_dir(DEFAULT_DATA_DIR),
            hashing: HashingConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::in_dir(DEFAULT_DATA_DIR)
    }
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: DEFAULT_ITERATIONS.get(),
        }
    }
}

impl StorageConfig {
    /// All four files under `dir` with their default names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            active_file: dir.join(ACTIVE_FILE),
            archive_file: dir.join(ARCHIVE_FILE),
            scratch_file: dir.join(SCRATCH_FILE),
            policy_file: dir.join(POLICY_FILE),
        }
    }

    pub fn table_paths(&self) -> TablePaths {
        TablePaths {
            active: self.active_file.clone(),
            archive: self.archive_file.clone(),
            scratch: self.scratch_file.clone(),
        }
    }
}

impl DirectoryConfig {
    /// Load configuration from `path`, then apply `SECDIR_DATA_DIR`.
    pub fn load(path: &Path) -> Result<Self> {
        let config = Self::from_file(path)?;
        Ok(config.with_data_dir(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from)))
    }

    /// Parse the TOML file at `path`. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read config file {}", path.display()));
            }
        };
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Relocate every data file into `dir`, if given.
    pub fn with_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir.filter(|d| !d.as_os_str().is_empty()) {
            self.storage = StorageConfig::in_dir(dir);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_live_in_config_db() {
        let config = DirectoryConfig::default();
        assert_eq!(
            config.storage.active_file,
            Path::new("./configDb").join("active_users.txt")
        );
        assert_eq!(
            config.storage.policy_file,
            Path::new("./configDb").join("config.txt")
        );
        assert_eq!(config.hashing.pbkdf2_iterations, 600_000);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DirectoryConfig::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, DirectoryConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secdir.toml");
        std::fs::write(
            &path,
            "[storage]\narchive_file = \"/srv/archive.txt\"\n\n[hashing]\npbkdf2_iterations = 1000\n",
        )
        .unwrap();

        let config = DirectoryConfig::from_file(&path).unwrap();
        assert_eq!(config.storage.archive_file, Path::new("/srv/archive.txt"));
        assert_eq!(
            config.storage.active_file,
            StorageConfig::default().active_file
        );
        assert_eq!(config.hashing.pbkdf2_iterations, 1000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secdir.toml");
        std::fs::write(&path, "[storage\nactive_file = 3").unwrap();
        let err = DirectoryConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn data_dir_overrides_every_path() {
        let config = DirectoryConfig::default().with_data_dir(Some(PathBuf::from("/data")));
        assert_eq!(config.storage, StorageConfig::in_dir("/data"));
        assert_eq!(
            config.storage.table_paths().scratch,
            Path::new("/data/tmp_file.txt")
        );

        let untouched = DirectoryConfig::default().with_data_dir(Some(PathBuf::new()));
        assert_eq!(untouched, DirectoryConfig::default());
    }
}
