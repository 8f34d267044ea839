//! authgate core - authenticator abstraction and credential verification.
//!
//! This crate defines the pieces every credential source shares:
//! - [`Authenticator`]: the polymorphic authentication trait
//! - [`AuthResult`] / [`AuthOutcome`]: binary result and detailed outcome
//! - [`AuthState`] / [`UserFields`]: state embedded by each authenticator
//! - [`verify()`]: hash-sniffing password verification
//! - [`legacy`]: explicitly configured legacy encryption schemes

pub mod authenticator;
pub mod credentials;
pub mod error;
pub mod legacy;
pub mod result;
pub mod verify;

pub use authenticator::{Auth, Authenticator};
pub use credentials::{
    AuthState, Credentials, UserFields, UserRecord, DEFAULT_PASSWORD_FIELD,
    DEFAULT_USERNAME_FIELD,
};
pub use error::{Error, Result};
pub use legacy::{EncryptionOptions, EncryptionScheme, LegacyVerifier};
pub use result::{AuthOutcome, AuthResult};
pub use verify::{identify, verify, HashAlgorithm, Verifier};
