//! Password hashing and security policy settings for secdir.
//!
//! The directory core consumes both of these only through traits, so test
//! suites and alternative deployments can swap them out.
//!
//! # Modules
//!
//! - [`hashing`]: [`PasswordHasher`] capability and the PBKDF2 implementation.
//! - [`policy`]: [`PolicyStore`] capability, the key/value file store, and an
//!   in-memory store.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use secdir_vault::{FilePolicyStore, PasswordHasher, Pbkdf2Hasher, PolicySetting, PolicyStore};
//!
//! # fn example() -> secdir_types::DirectoryResult<()> {
//! let policy = FilePolicyStore::open("configDb/config.txt")?;
//! policy.set(PolicySetting::MinPasswordLength, 8)?;
//!
//! let hasher = Pbkdf2Hasher::new();
//! let hash = hasher.make("Passw0rd1")?;
//! hasher.verify("Passw0rd1", &hash)?;
//! # Ok(())
//! # }
//! ```

pub mod hashing;
pub mod policy;

pub use hashing::{PasswordHasher, Pbkdf2Hasher};
#[cfg(any(test, feature = "test-util"))]
pub use hashing::PlainHasher;
pub use policy::{FilePolicyStore, MemoryPolicyStore, PolicySetting, PolicySnapshot, PolicyStore};
