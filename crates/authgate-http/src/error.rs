//! HTTP authentication error types.

use thiserror::Error;

/// HTTP authentication errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Error shared with the rest of authgate.
    #[error(transparent)]
    Core(#[from] authgate_core::Error),

    /// URI is not a usable absolute HTTP URI.
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    /// Response could not be parsed.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// HTTP client error.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Socket IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for HTTP authentication operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Core(authgate_core::Error::Config(message.into()))
    }

    /// Whether the error is a transport failure rather than misconfiguration.
    ///
    /// Transport failures resolve to NOT_VALID during authentication.
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Http(_) | Error::Io(_) | Error::InvalidResponse(_) => true,
            Error::Core(authgate_core::Error::Transport(_)) => true,
            _ => false,
        }
    }
}

impl From<Error> for authgate_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Core(core) => core,
            Error::InvalidUri(msg) => authgate_core::Error::Config(msg),
            Error::InvalidResponse(msg) => authgate_core::Error::Transport(msg),
            Error::Decode(msg) => authgate_core::Error::Decode(msg),
            Error::Http(e) => authgate_core::Error::Transport(e.to_string()),
            Error::Io(e) => authgate_core::Error::Transport(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let io = Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(io.is_transport());
        assert!(Error::InvalidResponse("empty".into()).is_transport());
        assert!(!Error::config("bad").is_transport());
        assert!(!Error::InvalidUri("localhost".into()).is_transport());
    }

    #[test]
    fn test_into_core() {
        let core: authgate_core::Error = Error::InvalidUri("localhost".into()).into();
        assert!(core.is_config());

        let core: authgate_core::Error = Error::config("realm missing").into();
        assert_eq!(core.to_string(), "configuration error: realm missing");
    }
}
