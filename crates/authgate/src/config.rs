//! Backend configuration.
//!
//! A backend is described by a JSON object whose `backend` field selects the
//! credential store:
//!
//! ```json
//! { "backend": "file", "path": "/etc/authgate/users", "realm": "office" }
//! { "backend": "http", "uri": "http://localhost/auth", "auth_type": "digest" }
//! { "backend": "ldap", "host": "ldap.example.org", "port": 389 }
//! { "backend": "sqlite", "path": "users.db", "table": "users" }
//! { "backend": "sled", "path": "users.sled" }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use authgate_core::{Authenticator, Error, Result};
#[cfg(feature = "store")]
use authgate_core::{LegacyVerifier, Verifier};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "AUTHGATE_CONFIG";

/// One credential store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Delimited credential file.
    #[cfg(feature = "store")]
    File(FileBackend),

    /// Remote HTTP endpoint.
    #[cfg(feature = "http")]
    Http(HttpBackend),

    /// LDAP directory.
    #[cfg(feature = "store")]
    Ldap(LdapBackend),

    /// SQLite user table.
    #[cfg(feature = "store")]
    Sqlite(TableBackend),

    /// Sled user tree.
    #[cfg(feature = "store")]
    Sled(TableBackend),
}

/// File backend settings.
#[cfg(feature = "store")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileBackend {
    /// Credential file.
    pub path: PathBuf,
    /// Realm for `username:realm:hash` lines.
    #[serde(default)]
    pub realm: Option<String>,
    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Legacy scheme instead of hash sniffing.
    #[serde(default)]
    pub legacy: Option<LegacyVerifier>,
}

/// HTTP backend settings.
#[cfg(feature = "http")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpBackend {
    /// Endpoint URI.
    pub uri: String,
    /// Request method.
    #[serde(default)]
    pub method: authgate_http::Method,
    /// Fixed auth type; discovered when absent.
    #[serde(default)]
    pub auth_type: Option<authgate_http::HttpAuthType>,
    /// Digest URI override.
    #[serde(default)]
    pub relative_uri: Option<String>,
    /// Bearer token.
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Refresh token field name.
    #[serde(default)]
    pub refresh_token_name: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Built-in transport.
    #[serde(default)]
    pub transport: authgate_http::TransportKind,
}

/// LDAP backend settings.
#[cfg(feature = "store")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdapBackend {
    /// Directory host or URL.
    pub host: String,
    /// Port used when the host names none.
    #[serde(default = "default_ldap_port")]
    pub port: u16,
    /// Connect timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Upgrade with StartTLS.
    #[serde(default)]
    pub starttls: bool,
    /// Skip certificate verification.
    #[serde(default)]
    pub no_tls_verify: bool,
}

/// Table backend settings (SQLite and sled).
#[cfg(feature = "store")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBackend {
    /// Database file or directory.
    pub path: PathBuf,
    /// Table (SQLite) or tree (sled) name.
    #[serde(default = "default_table")]
    pub table: String,
    /// Username field.
    #[serde(default = "default_username_field")]
    pub username_field: String,
    /// Password field.
    #[serde(default = "default_password_field")]
    pub password_field: String,
    /// Legacy scheme instead of hash sniffing.
    #[serde(default)]
    pub legacy: Option<LegacyVerifier>,
}

#[cfg(feature = "store")]
fn default_delimiter() -> String {
    authgate_store::DEFAULT_DELIMITER.to_string()
}

#[cfg(feature = "store")]
fn default_ldap_port() -> u16 {
    authgate_store::DEFAULT_LDAP_PORT
}

#[cfg(feature = "store")]
fn default_table() -> String {
    authgate_store::DEFAULT_USER_TABLE.to_string()
}

#[cfg(feature = "store")]
fn default_username_field() -> String {
    authgate_core::DEFAULT_USERNAME_FIELD.to_string()
}

#[cfg(feature = "store")]
fn default_password_field() -> String {
    authgate_core::DEFAULT_PASSWORD_FIELD.to_string()
}

#[cfg(feature = "store")]
fn verifier(legacy: &Option<LegacyVerifier>) -> Verifier {
    legacy.clone().map(Verifier::from).unwrap_or_default()
}

impl BackendConfig {
    /// Parse a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("invalid backend configuration: {}", e)))
    }

    /// Read a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Read the file named by `AUTHGATE_CONFIG`.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .map_err(|_| Error::Config(format!("{} is not set", CONFIG_ENV_VAR)))?;
        Self::from_file(path)
    }

    /// Backend name as written in the `backend` field.
    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "store")]
            BackendConfig::File(_) => "file",
            #[cfg(feature = "http")]
            BackendConfig::Http(_) => "http",
            #[cfg(feature = "store")]
            BackendConfig::Ldap(_) => "ldap",
            #[cfg(feature = "store")]
            BackendConfig::Sqlite(_) => "sqlite",
            #[cfg(feature = "store")]
            BackendConfig::Sled(_) => "sled",
        }
    }

    /// Build the configured authenticator.
    pub fn build(&self) -> Result<Box<dyn Authenticator>> {
        tracing::debug!(backend = self.name(), "building authenticator");

        match self {
            #[cfg(feature = "store")]
            BackendConfig::File(file) => {
                let mut auth = authgate_store::FileAuthenticator::new(&file.path)?
                    .with_delimiter(file.delimiter.as_str())
                    .with_verifier(verifier(&file.legacy));
                if let Some(realm) = &file.realm {
                    auth = auth.with_realm(realm.as_str());
                }
                Ok(Box::new(auth))
            }

            #[cfg(feature = "http")]
            BackendConfig::Http(http) => {
                let mut config = authgate_http::HttpConfig::new(http.uri.as_str())
                    .with_method(http.method)
                    .with_transport(http.transport);
                config.auth_type = http.auth_type;
                config.relative_uri = http.relative_uri.clone();
                config.bearer_token = http.bearer_token.clone();
                config.refresh_token = http.refresh_token.clone();
                if let Some(name) = &http.refresh_token_name {
                    config.refresh_token_name = name.clone();
                }
                if let Some(secs) = http.timeout_secs {
                    config = config.with_timeout(std::time::Duration::from_secs(secs));
                }
                Ok(Box::new(authgate_http::HttpAuthenticator::from_config(config)?))
            }

            #[cfg(feature = "store")]
            BackendConfig::Ldap(ldap) => {
                let mut options = authgate_store::LdapOptions::new()
                    .with_starttls(ldap.starttls)
                    .with_no_tls_verify(ldap.no_tls_verify);
                if let Some(secs) = ldap.timeout_secs {
                    options = options.with_timeout(std::time::Duration::from_secs(secs));
                }
                Ok(Box::new(authgate_store::LdapAuthenticator::new(
                    &ldap.host, ldap.port, options,
                )?))
            }

            #[cfg(feature = "store")]
            BackendConfig::Sqlite(table) => {
                let repo = authgate_store::SqliteRepository::open(&table.path, &table.table)?;
                Ok(Box::new(
                    authgate_store::TableAuthenticator::new(repo)
                        .with_fields(table.username_field.as_str(), table.password_field.as_str())
                        .with_verifier(verifier(&table.legacy)),
                ))
            }

            #[cfg(feature = "store")]
            BackendConfig::Sled(table) => {
                let repo = authgate_store::SledRepository::open_tree(&table.path, &table.table)?;
                Ok(Box::new(
                    authgate_store::TableAuthenticator::new(repo)
                        .with_fields(table.username_field.as_str(), table.password_field.as_str())
                        .with_verifier(verifier(&table.legacy)),
                ))
            }
        }
    }
}

#[cfg(all(test, feature = "http", feature = "store"))]
mod tests {
    use super::*;
    use authgate_core::EncryptionScheme;
    use authgate_http::{HttpAuthType, Method, TransportKind};

    #[test]
    fn test_parse_file_defaults() {
        let config =
            BackendConfig::from_json_str(r#"{"backend": "file", "path": "/tmp/users"}"#).unwrap();
        let BackendConfig::File(file) = config else {
            panic!("expected file backend");
        };
        assert_eq!(file.delimiter, ":");
        assert!(file.realm.is_none());
        assert!(file.legacy.is_none());
    }

    #[test]
    fn test_parse_http() {
        let config = BackendConfig::from_json_str(
            r#"{
                "backend": "http",
                "uri": "http://localhost/auth",
                "method": "PUT",
                "auth_type": "refresh",
                "bearer_token": "a",
                "refresh_token": "r",
                "transport": "stream",
                "timeout_secs": 5
            }"#,
        )
        .unwrap();

        assert_eq!(config.name(), "http");
        let BackendConfig::Http(http) = config else {
            panic!("expected http backend");
        };
        assert_eq!(http.method, Method::Put);
        assert_eq!(http.auth_type, Some(HttpAuthType::Refresh));
        assert_eq!(http.transport, TransportKind::Stream);
        assert_eq!(http.timeout_secs, Some(5));
    }

    #[test]
    fn test_parse_table_with_legacy() {
        let config = BackendConfig::from_json_str(
            r#"{
                "backend": "sqlite",
                "path": "users.db",
                "legacy": {"scheme": "md5", "options": {"secret": "pepper"}}
            }"#,
        )
        .unwrap();

        let BackendConfig::Sqlite(table) = config else {
            panic!("expected sqlite backend");
        };
        assert_eq!(table.table, "users");
        assert_eq!(table.username_field, "username");
        let legacy = table.legacy.unwrap();
        assert_eq!(legacy.scheme, EncryptionScheme::Md5);
        assert_eq!(legacy.options.secret.as_deref(), Some("pepper"));
    }

    #[test]
    fn test_parse_errors_are_config() {
        assert!(BackendConfig::from_json_str(r#"{"backend": "kerberos"}"#)
            .unwrap_err()
            .is_config());
        assert!(BackendConfig::from_json_str("not json").unwrap_err().is_config());
        assert!(BackendConfig::from_file("/nonexistent/authgate.json")
            .unwrap_err()
            .is_config());
    }

    #[test]
    fn test_build_rejects_bad_uri() {
        let config = BackendConfig::Http(HttpBackend {
            uri: "localhost/auth".to_string(),
            method: Method::Post,
            auth_type: None,
            relative_uri: None,
            bearer_token: None,
            refresh_token: None,
            refresh_token_name: None,
            timeout_secs: None,
            transport: TransportKind::Stream,
        });
        assert!(config.build().err().unwrap().is_config());
    }
}
