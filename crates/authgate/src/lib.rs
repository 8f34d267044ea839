//! # authgate
//!
//! Pluggable username/password verification against several credential
//! stores. Every store implements [`Authenticator`]: `authenticate` returns
//! [`AuthResult::Valid`] or [`AuthResult::NotValid`], and only
//! configuration problems surface as errors.
//!
//! | Backend | Type | Feature |
//! |---|---|---|
//! | delimited file | [`FileAuthenticator`] | `store` |
//! | SQLite / sled table | [`TableAuthenticator`] | `store` |
//! | LDAP bind | [`LdapAuthenticator`] | `store` |
//! | HTTP challenge/response | [`HttpAuthenticator`] | `http` |
//!
//! ## Quick start
//!
//! ```ignore
//! use authgate::{Authenticator, BackendConfig};
//!
//! let config = BackendConfig::from_json_str(
//!     r#"{"backend": "file", "path": "/etc/authgate/users"}"#,
//! )?;
//! let mut auth = config.build()?;
//!
//! if auth.authenticate("admin", Some("12admin34"))?.is_valid() {
//!     println!("welcome {}", auth.username());
//! } else {
//!     println!("rejected: {}", auth.outcome());
//! }
//! ```

#[cfg(not(any(feature = "http", feature = "store")))]
compile_error!("enable at least one of the `http` or `store` features");

pub mod config;

pub use authgate_core::{
    identify, verify, Auth, AuthOutcome, AuthResult, AuthState, Authenticator, Credentials,
    EncryptionOptions, EncryptionScheme, Error, HashAlgorithm, LegacyVerifier, Result,
    UserFields, UserRecord, Verifier,
};
pub use config::{BackendConfig, CONFIG_ENV_VAR};

#[cfg(feature = "http")]
pub use authgate_http::{
    Challenge, HttpAuthType, HttpAuthenticator, HttpConfig, HttpPhase, HttpResponse,
    HttpTransport, Method, TransportKind,
};
#[cfg(feature = "http")]
pub use config::HttpBackend;

#[cfg(feature = "store")]
pub use authgate_store::{
    DirectoryBind, FileAuthenticator, LdapAuthenticator, LdapOptions, MemoryRepository,
    SledRepository, SqliteRepository, TableAuthenticator, UserRepository,
};
#[cfg(feature = "store")]
pub use config::{FileBackend, LdapBackend, TableBackend};
