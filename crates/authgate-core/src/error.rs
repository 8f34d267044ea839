//! Core error types.

use thiserror::Error;

/// Errors raised by authenticators.
///
/// Wrong credentials and unreachable services are not errors: they resolve to
/// [`AuthResult::NotValid`](crate::AuthResult::NotValid). Only misconfiguration
/// and failures outside the normal handshake surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing file, malformed URI, unparsed challenge and similar misuse.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport failure that was not folded into a NOT_VALID result.
    #[error("transport error: {0}")]
    Transport(String),

    /// Compressed or encoded payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The requested encoding or cipher is not available.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// User repository lookup failed.
    #[error("repository error: {0}")]
    Repository(String),

    /// Directory handle could not be created.
    #[error("directory error: {0}")]
    Directory(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for authenticator operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error describes a configuration problem.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
