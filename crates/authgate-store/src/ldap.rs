//! LDAP simple-bind authentication.
//!
//! The bind result decides the attempt: result code 0 is VALID, any other
//! code is a rejection. Connection failures are folded into NOT_VALID.

use std::time::Duration;

use ldap3::{LdapConn, LdapConnSettings};
use url::Url;

use authgate_core::{AuthOutcome, AuthResult, AuthState, Authenticator, Error, Result};

use crate::error::Error as StoreError;

/// Default LDAP port.
pub const DEFAULT_LDAP_PORT: u16 = 389;

/// Default connect timeout.
pub const DEFAULT_LDAP_TIMEOUT: Duration = Duration::from_secs(10);

/// LDAP connection options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapOptions {
    /// Connect timeout.
    pub timeout: Duration,
    /// Upgrade plain connections with StartTLS.
    pub starttls: bool,
    /// Skip certificate verification.
    pub no_tls_verify: bool,
}

impl LdapOptions {
    /// Options with defaults.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_LDAP_TIMEOUT,
            starttls: false,
            no_tls_verify: false,
        }
    }

    /// Set the connect timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable StartTLS.
    pub fn with_starttls(mut self, starttls: bool) -> Self {
        self.starttls = starttls;
        self
    }

    /// Disable certificate verification.
    pub fn with_no_tls_verify(mut self, no_tls_verify: bool) -> Self {
        self.no_tls_verify = no_tls_verify;
        self
    }
}

impl Default for LdapOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Directory that can check a DN/password pair.
pub trait DirectoryBind: Send {
    /// Simple bind. Returns the LDAP result code; `Err` means the directory
    /// could not be reached.
    fn bind(&mut self, dn: &str, password: &str) -> Result<u32>;
}

/// ldap3-backed directory. The connection opens on the first bind.
pub struct LdapDirectory {
    url: String,
    options: LdapOptions,
    conn: Option<LdapConn>,
}

impl LdapDirectory {
    /// Create a handle for `host`. A host without a scheme gets `ldap://`;
    /// `port` applies when the host names none.
    pub fn new(host: &str, port: u16, options: LdapOptions) -> Result<Self> {
        let url = directory_url(host, port)?;
        Ok(Self {
            url,
            options,
            conn: None,
        })
    }

    /// Directory URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether a connection is open.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn connection(&mut self) -> Result<&mut LdapConn> {
        if self.conn.is_none() {
            let settings = LdapConnSettings::new()
                .set_conn_timeout(self.options.timeout)
                .set_starttls(self.options.starttls)
                .set_no_tls_verify(self.options.no_tls_verify);

            tracing::debug!(url = %self.url, "connecting to directory");
            let conn = LdapConn::with_settings(settings, &self.url).map_err(|e| {
                tracing::debug!(url = %self.url, error = %e, "directory connection failed");
                StoreError::Ldap(e)
            })?;
            self.conn = Some(conn);
        }

        self.conn
            .as_mut()
            .ok_or_else(|| Error::Transport("directory connection unavailable".to_string()))
    }
}

impl DirectoryBind for LdapDirectory {
    fn bind(&mut self, dn: &str, password: &str) -> Result<u32> {
        let result = self.connection()?.simple_bind(dn, password);
        match result {
            Ok(res) => Ok(res.rc),
            Err(e) => {
                // Drop the connection so the next bind reconnects.
                self.conn = None;
                Err(StoreError::Ldap(e).into())
            }
        }
    }
}

/// Build a directory URL from a host and default port.
pub fn directory_url(host: &str, port: u16) -> Result<String> {
    let host = host.trim();
    let raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("ldap://{}", host)
    };

    let mut url = Url::parse(&raw)
        .map_err(|e| Error::Config(format!("invalid directory host {}: {}", host, e)))?;

    if !matches!(url.scheme(), "ldap" | "ldaps") {
        return Err(Error::Config(format!(
            "unsupported directory scheme: {}",
            url.scheme()
        )));
    }
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(Error::Config(format!("directory host is missing: {}", host)));
    }
    if url.port().is_none() {
        url.set_port(Some(port))
            .map_err(|_| Error::Config(format!("cannot set port on {}", raw)))?;
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Authenticates with an LDAP simple bind.
pub struct LdapAuthenticator<D: DirectoryBind = LdapDirectory> {
    state: AuthState,
    directory: Option<D>,
}

impl LdapAuthenticator<LdapDirectory> {
    /// Create an authenticator for `host:port`.
    ///
    /// An empty host yields an authenticator without a directory, which
    /// rejects every attempt.
    pub fn new(host: &str, port: u16, options: LdapOptions) -> Result<Self> {
        if host.trim().is_empty() {
            tracing::warn!("no directory host configured, every bind will fail");
            return Ok(Self {
                state: AuthState::new(),
                directory: None,
            });
        }

        let directory = LdapDirectory::new(host, port, options)?;
        Ok(Self::with_directory(directory))
    }
}

impl<D: DirectoryBind> LdapAuthenticator<D> {
    /// Use an existing directory handle.
    pub fn with_directory(directory: D) -> Self {
        Self {
            state: AuthState::new(),
            directory: Some(directory),
        }
    }

    /// Directory handle.
    pub fn directory(&self) -> Option<&D> {
        self.directory.as_ref()
    }
}

impl<D: DirectoryBind> Authenticator for LdapAuthenticator<D> {
    fn authenticate(&mut self, username: &str, password: Option<&str>) -> Result<AuthResult> {
        self.state.begin(username, password);

        let Some(directory) = self.directory.as_mut() else {
            return Ok(self
                .state
                .finish(AuthOutcome::Unreachable("no directory connection".to_string())));
        };

        // An empty password would be an anonymous bind.
        let Some(password) = password.filter(|p| !p.is_empty()) else {
            tracing::debug!(dn = %username, "empty password rejected");
            return Ok(self.state.finish(AuthOutcome::Rejected));
        };

        let outcome = match directory.bind(username, password) {
            Ok(0) => AuthOutcome::Valid,
            Ok(rc) => {
                tracing::debug!(dn = %username, rc, "bind rejected");
                AuthOutcome::Rejected
            }
            Err(e) => {
                tracing::warn!(dn = %username, error = %e, "directory unreachable");
                AuthOutcome::Unreachable(e.to_string())
            }
        };

        tracing::info!(dn = %username, valid = outcome.result().is_valid(), "ldap authentication resolved");
        Ok(self.state.finish(outcome))
    }

    fn state(&self) -> &AuthState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AuthState {
        &mut self.state
    }
}
