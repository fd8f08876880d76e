//! Password hashing capability.
//!
//! The directory only ever needs two things from a hashing primitive: turn a
//! password into an opaque storable string, and check a password against such
//! a string. [`PasswordHasher`] captures exactly that.
//!
//! [`Pbkdf2Hasher`] is the production implementation: PBKDF2-HMAC-SHA256 via
//! `ring`, with a random 256-bit salt per hash. Stored hashes look like
//!
//! ```text
//! <iterations>:<base64(salt)>:<base64(derived key)>
//! ```
//!
//! and never contain whitespace, so they can be used verbatim as fields of
//! the space-separated directory tables.

use std::num::NonZeroU32;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use secdir_types::{DirectoryError, DirectoryResult};

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;

/// Derived key length in bytes.
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count used when none is configured (OWASP 2023).
pub const DEFAULT_ITERATIONS: NonZeroU32 = match NonZeroU32::new(600_000) {
    Some(n) => n,
    None => panic!("iteration count must be non-zero"),
};

/// Largest iteration count accepted from a stored hash.
pub const MAX_ITERATIONS: u32 = 10 * DEFAULT_ITERATIONS.get();

/// PBKDF2 algorithm: HMAC-SHA256.
static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Abstraction over the password hashing primitive.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc` by the account engine and the login checker.
pub trait PasswordHasher: Send + Sync {
    /// Hash `password` into a storable string.
    ///
    /// Returns [`DirectoryError::Hashing`] if the primitive fails.
    fn make(&self, password: &str) -> DirectoryResult<String>;

    /// Check `password` against a string previously produced by [`make`].
    ///
    /// Returns `Ok(())` on a match, [`DirectoryError::PasswordsDontMatch`]
    /// on a mismatch, and [`DirectoryError::Hashing`] if `hash` is not a
    /// hash this implementation understands.
    ///
    /// [`make`]: PasswordHasher::make
    fn verify(&self, password: &str, hash: &str) -> DirectoryResult<()>;
}

// ---------------------------------------------------------------------------
// PBKDF2
// ---------------------------------------------------------------------------

/// PBKDF2-HMAC-SHA256 password hasher.
pub struct Pbkdf2Hasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl Pbkdf2Hasher {
    /// Hasher with [`DEFAULT_ITERATIONS`].
    pub fn new() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            rng: SystemRandom::new(),
        }
    }

    /// Hasher with an explicit iteration count.
    ///
    /// The count is only used for new hashes; verification reads the count
    /// embedded in each stored hash.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Hashing`] if `iterations` is zero or above
    /// [`MAX_ITERATIONS`].
    pub fn with_iterations(iterations: u32) -> DirectoryResult<Self> {
        let iterations = NonZeroU32::new(iterations)
            .filter(|n| n.get() <= MAX_ITERATIONS)
            .ok_or_else(|| DirectoryError::Hashing {
                reason: format!("PBKDF2 iteration count must be in 1..={MAX_ITERATIONS}"),
            })?;
        Ok(Self {
            iterations,
            rng: SystemRandom::new(),
        })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }
}

impl Default for Pbkdf2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Pbkdf2Hasher {
    fn make(&self, password: &str) -> DirectoryResult<String> {
        let mut salt = [0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(|_| DirectoryError::Hashing {
                reason: "failed to generate random salt".into(),
            })?;

        let mut derived = [0u8; KEY_LEN];
        pbkdf2::derive(
            PBKDF2_ALG,
            self.iterations,
            &salt,
            password.as_bytes(),
            &mut derived,
        );

        tracing::trace!(iterations = self.iterations.get(), "derived password hash");

        Ok(format!(
            "{}:{}:{}",
            self.iterations,
            BASE64.encode(salt),
            BASE64.encode(derived)
        ))
    }

    fn verify(&self, password: &str, hash: &str) -> DirectoryResult<()> {
        let parsed = ParsedHash::parse(hash)?;

        pbkdf2::verify(
            PBKDF2_ALG,
            parsed.iterations,
            &parsed.salt,
            password.as_bytes(),
            &parsed.derived,
        )
        .map_err(|_| DirectoryError::PasswordsDontMatch)
    }
}

/// A decoded `<iterations>:<salt>:<key>` hash string.
struct ParsedHash {
    iterations: NonZeroU32,
    salt: Vec<u8>,
    derived: Vec<u8>,
}

impl ParsedHash {
    fn parse(stored: &str) -> DirectoryResult<Self> {
        let malformed = |what: &str| DirectoryError::Hashing {
            reason: format!("malformed password hash: {what}"),
        };

        let mut parts = stored.splitn(3, ':');
        let (Some(iterations), Some(salt), Some(derived)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed("expected three ':'-separated parts"));
        };

        let iterations = iterations
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .filter(|n| n.get() <= MAX_ITERATIONS)
            .ok_or_else(|| malformed("invalid iteration count"))?;
        let salt = BASE64
            .decode(salt)
            .map_err(|e| malformed(&format!("invalid salt encoding: {e}")))?;
        let derived = BASE64
            .decode(derived)
            .map_err(|e| malformed(&format!("invalid key encoding: {e}")))?;

        Ok(Self {
            iterations,
            salt,
            derived,
        })
    }
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------

/// Reversible "hasher" for tests: stores `plain:<password>`.
///
/// Never use outside tests. Can be switched into a failing mode to exercise
/// [`DirectoryError::Hashing`] propagation.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct PlainHasher {
    fail_make: bool,
}

#[cfg(any(test, feature = "test-util"))]
impl PlainHasher {
    pub fn new() -> Self {
        Self { fail_make: false }
    }

    /// A hasher whose `make` always fails.
    pub fn failing() -> Self {
        Self { fail_make: true }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl PasswordHasher for PlainHasher {
    fn make(&self, password: &str) -> DirectoryResult<String> {
        if self.fail_make {
            return Err(DirectoryError::Hashing {
                reason: "hashing disabled for test".into(),
            });
        }
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> DirectoryResult<()> {
        let stored = hash.strip_prefix("plain:").ok_or_else(|| DirectoryError::Hashing {
            reason: format!("not a plain test hash: {hash}"),
        })?;
        if stored == password {
            Ok(())
        } else {
            Err(DirectoryError::PasswordsDontMatch)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
