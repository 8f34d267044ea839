//! Password verification against stored hashes.
//!
//! The stored value is sniffed for a known algorithm tag. Recognised hashes
//! are checked with the matching primitive (salt and cost come from the hash
//! itself). Anything else is treated as a plaintext password and compared
//! for equality, which keeps legacy plaintext files working.

use argon2::password_hash::PasswordHash;
use argon2::{Argon2, PasswordVerifier};

use crate::error::Result;
use crate::legacy::LegacyVerifier;

/// Algorithm detected from a stored hash string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// No recognised tag: the value is compared as plaintext.
    Unknown,
    /// bcrypt (`$2a$`, `$2b$`, `$2x$`, `$2y$`).
    Bcrypt,
    /// Argon2i (`$argon2i$`).
    Argon2i,
    /// Argon2id (`$argon2id$`).
    Argon2id,
}

impl HashAlgorithm {
    /// Numeric algorithm id. `0` means unknown.
    pub fn id(self) -> u8 {
        match self {
            HashAlgorithm::Unknown => 0,
            HashAlgorithm::Bcrypt => 1,
            HashAlgorithm::Argon2i => 2,
            HashAlgorithm::Argon2id => 3,
        }
    }

    /// Algorithm name as it appears in the hash tag.
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Unknown => "unknown",
            HashAlgorithm::Bcrypt => "bcrypt",
            HashAlgorithm::Argon2i => "argon2i",
            HashAlgorithm::Argon2id => "argon2id",
        }
    }
}

/// Inspect a stored hash and report its algorithm.
pub fn identify(hash: &str) -> HashAlgorithm {
    const BCRYPT_PREFIXES: [&str; 4] = ["$2a$", "$2b$", "$2x$", "$2y$"];

    if BCRYPT_PREFIXES.iter().any(|p| hash.starts_with(p)) && hash.len() == 60 {
        HashAlgorithm::Bcrypt
    } else if hash.starts_with("$argon2id$") {
        HashAlgorithm::Argon2id
    } else if hash.starts_with("$argon2i$") {
        HashAlgorithm::Argon2i
    } else {
        HashAlgorithm::Unknown
    }
}

/// Verify a plaintext password against a stored hash or plaintext value.
pub fn verify(password: &str, hash: &str) -> bool {
    match identify(hash) {
        HashAlgorithm::Unknown => password == hash,
        HashAlgorithm::Bcrypt => bcrypt::verify(password, hash).unwrap_or(false),
        HashAlgorithm::Argon2i | HashAlgorithm::Argon2id => match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::debug!(error = %e, "stored argon2 hash is malformed");
                false
            }
        },
    }
}

/// Strategy an authenticator uses to compare a password with a stored value.
#[derive(Debug, Clone, Default)]
pub enum Verifier {
    /// Sniff the stored value (see [`verify`]).
    #[default]
    Auto,
    /// Use an explicitly configured legacy scheme.
    Legacy(LegacyVerifier),
}

impl Verifier {
    /// Check `password` against the stored `hash`.
    pub fn check(&self, password: &str, hash: &str) -> Result<bool> {
        match self {
            Verifier::Auto => Ok(verify(password, hash)),
            Verifier::Legacy(legacy) => legacy.verify(hash, password),
        }
    }
}

impl From<LegacyVerifier> for Verifier {
    fn from(legacy: LegacyVerifier) -> Self {
        Verifier::Legacy(legacy)
    }
}
