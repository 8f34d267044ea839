//! Store error types.

use thiserror::Error;

/// Errors raised by the file, table and directory backends.
#[derive(Debug, Error)]
pub enum Error {
    /// Error shared with the rest of authgate.
    #[error(transparent)]
    Core(#[from] authgate_core::Error),

    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Sled storage error.
    #[error("storage error: {0}")]
    Sled(#[from] sled::Error),

    /// Stored record is not valid JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// LDAP protocol or connection error.
    #[error("ldap error: {0}")]
    Ldap(#[from] ldap3::LdapError),

    /// Table or field name is not a plain identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for authgate_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Core(core) => core,
            Error::Sqlite(e) => authgate_core::Error::Repository(e.to_string()),
            Error::Sled(e) => authgate_core::Error::Repository(e.to_string()),
            Error::Serialization(e) => authgate_core::Error::Repository(e.to_string()),
            Error::Ldap(e) => authgate_core::Error::Transport(e.to_string()),
            Error::InvalidIdentifier(name) => {
                authgate_core::Error::Config(format!("invalid identifier: {}", name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_core() {
        let core: authgate_core::Error = Error::InvalidIdentifier("users; drop".into()).into();
        assert!(core.is_config());

        let core: authgate_core::Error =
            Error::Sqlite(rusqlite::Error::InvalidQuery).into();
        assert!(matches!(core, authgate_core::Error::Repository(_)));
    }

    #[test]
    fn test_ldap_error_is_transport() {
        let err = Error::from(ldap3::LdapError::EndOfStream);
        assert!(err.to_string().starts_with("ldap error: "));

        let core: authgate_core::Error = err.into();
        assert!(matches!(core, authgate_core::Error::Transport(_)));
        assert!(!core.is_config());
    }
}
