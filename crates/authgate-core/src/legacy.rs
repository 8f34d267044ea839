//! Legacy encryption schemes.
//!
//! Older credential files and tables declare how their passwords were
//! stored instead of relying on hash sniffing. The scheme is chosen
//! explicitly and may carry a server-side pepper (`secret`) appended to the
//! attempted password before it is hashed.
//!
//! # Scheme codes
//!
//! | Code | Scheme        | Stored value                    |
//! |------|---------------|---------------------------------|
//! | 0    | `None`        | plaintext                       |
//! | 1    | `Md5`         | lower-case hex MD5              |
//! | 2    | `Sha1`        | lower-case hex SHA-1            |
//! | 3    | `Crypt`       | any crypt(3) string             |
//! | 4    | `Bcrypt`      | `$2y$`/`$2b$` hash              |
//! | 5    | `Mcrypt`      | reversible cipher (unsupported) |
//! | 6    | `CryptMd5`    | `$1$` hash                      |
//! | 7    | `CryptSha256` | `$5$` hash                      |
//! | 8    | `CryptSha512` | `$6$` hash                      |

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::{Error, Result};

/// How stored passwords were encrypted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionScheme {
    /// Plaintext.
    #[default]
    None,
    /// Hex MD5 digest.
    Md5,
    /// Hex SHA-1 digest.
    Sha1,
    /// Generic crypt(3); the algorithm is taken from the hash.
    Crypt,
    /// bcrypt.
    Bcrypt,
    /// Reversible mcrypt cipher.
    Mcrypt,
    /// MD5-crypt (`$1$`).
    CryptMd5,
    /// SHA-256-crypt (`$5$`).
    CryptSha256,
    /// SHA-512-crypt (`$6$`).
    CryptSha512,
}

impl EncryptionScheme {
    /// Look up a scheme by its numeric code (0..=8).
    pub fn from_code(code: u8) -> Option<Self> {
        let scheme = match code {
            0 => EncryptionScheme::None,
            1 => EncryptionScheme::Md5,
            2 => EncryptionScheme::Sha1,
            3 => EncryptionScheme::Crypt,
            4 => EncryptionScheme::Bcrypt,
            5 => EncryptionScheme::Mcrypt,
            6 => EncryptionScheme::CryptMd5,
            7 => EncryptionScheme::CryptSha256,
            8 => EncryptionScheme::CryptSha512,
            _ => return None,
        };
        Some(scheme)
    }

    /// Numeric code of the scheme.
    pub fn code(self) -> u8 {
        match self {
            EncryptionScheme::None => 0,
            EncryptionScheme::Md5 => 1,
            EncryptionScheme::Sha1 => 2,
            EncryptionScheme::Crypt => 3,
            EncryptionScheme::Bcrypt => 4,
            EncryptionScheme::Mcrypt => 5,
            EncryptionScheme::CryptMd5 => 6,
            EncryptionScheme::CryptSha256 => 7,
            EncryptionScheme::CryptSha512 => 8,
        }
    }
}

/// Algorithm-specific options.
///
/// Only `secret` affects verification for every scheme. The remaining
/// fields describe how hashes were produced; salt, cost, prefix and rounds
/// are embedded in crypt-style hashes and are read from there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionOptions {
    /// Salt used when the hashes were generated.
    pub salt: Option<String>,
    /// Pepper appended to the attempted password.
    pub secret: Option<String>,
    /// bcrypt cost.
    pub cost: Option<u32>,
    /// bcrypt prefix (`$2y$`, `$2b$`).
    pub prefix: Option<String>,
    /// SHA-crypt rounds.
    pub rounds: Option<u32>,
    /// mcrypt cipher.
    pub cipher: Option<String>,
    /// mcrypt mode.
    pub mode: Option<String>,
    /// mcrypt IV source.
    pub source: Option<String>,
}

impl EncryptionOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the salt.
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// Set the pepper.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set the bcrypt cost.
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Set the bcrypt prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the SHA-crypt rounds.
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(rounds);
        self
    }
}

/// Verifier for a fixed legacy scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyVerifier {
    /// Scheme the stored passwords use.
    pub scheme: EncryptionScheme,
    /// Scheme options.
    #[serde(default)]
    pub options: EncryptionOptions,
}

impl LegacyVerifier {
    /// Create a verifier for `scheme` with default options.
    pub fn new(scheme: EncryptionScheme) -> Self {
        Self {
            scheme,
            options: EncryptionOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: EncryptionOptions) -> Self {
        self.options = options;
        self
    }

    /// Check `attempted` against the stored `hash`.
    pub fn verify(&self, hash: &str, attempted: &str) -> Result<bool> {
        let mut attempted = attempted.to_string();
        if let Some(secret) = self.options.secret.as_deref().filter(|s| !s.is_empty()) {
            attempted.push_str(secret);
        }

        let matches = match self.scheme {
            EncryptionScheme::None => hash == attempted,
            EncryptionScheme::Md5 => hash == hex::encode(Md5::digest(attempted.as_bytes())),
            EncryptionScheme::Sha1 => hash == hex::encode(Sha1::digest(attempted.as_bytes())),
            EncryptionScheme::Crypt => pwhash::unix::verify(&attempted, hash),
            EncryptionScheme::Bcrypt => bcrypt::verify(&attempted, hash).unwrap_or(false),
            EncryptionScheme::CryptMd5 => pwhash::md5_crypt::verify(&attempted, hash),
            EncryptionScheme::CryptSha256 => pwhash::sha256_crypt::verify(&attempted, hash),
            EncryptionScheme::CryptSha512 => pwhash::sha512_crypt::verify(&attempted, hash),
            EncryptionScheme::Mcrypt => {
                return Err(Error::UnsupportedEncoding(
                    "mcrypt-encrypted passwords cannot be verified".to_string(),
                ))
            }
        };

        Ok(matches)
    }
}
