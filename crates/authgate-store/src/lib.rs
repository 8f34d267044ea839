//! Credential-store authenticators for authgate.
//!
//! - [`FileAuthenticator`]: delimited `username:hash` files
//! - [`TableAuthenticator`]: one row of a user table, via [`UserRepository`]
//! - [`LdapAuthenticator`]: LDAP simple bind, via [`DirectoryBind`]

pub mod error;
pub mod file;
pub mod ldap;
pub mod sled_repo;
pub mod sqlite;
pub mod table;

pub use error::{Error, Result};
pub use file::{FileAuthenticator, DEFAULT_DELIMITER};
pub use ldap::{
    DirectoryBind, LdapAuthenticator, LdapDirectory, LdapOptions, DEFAULT_LDAP_PORT,
    DEFAULT_LDAP_TIMEOUT,
};
pub use sled_repo::{SledRepository, DEFAULT_USERS_TREE};
pub use sqlite::{SqliteRepository, DEFAULT_USER_TABLE};
pub use table::{MemoryRepository, TableAuthenticator, UserRepository};
