//! HTTP authenticator configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::challenge::HttpAuthType;
use crate::error::{Error, Result};
use crate::request::Method;
use crate::transport::{HttpTransport, ReqwestTransport, StreamTransport};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default body field name for the refresh token.
pub const DEFAULT_REFRESH_TOKEN_NAME: &str = "refresh";

/// Which built-in transport carries requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Raw HTTP/1.1 over `TcpStream`.
    Stream,
    /// `reqwest` blocking client.
    #[default]
    Reqwest,
}

/// HTTP authenticator configuration.
#[derive(Clone)]
pub struct HttpConfig {
    /// Absolute endpoint URI.
    pub uri: String,

    /// Method of the final request (and the probe).
    pub method: Method,

    /// Fixed auth type. `None` discovers it from the server challenge.
    pub auth_type: Option<HttpAuthType>,

    /// Override for the URI used in the Digest hash.
    pub relative_uri: Option<String>,

    /// Token for BEARER and REFRESH.
    pub bearer_token: Option<String>,

    /// Refresh token sent by REFRESH.
    pub refresh_token: Option<String>,

    /// Body field name for the refresh token.
    pub refresh_token_name: String,

    /// Request timeout.
    pub timeout: Duration,

    /// Built-in transport.
    pub transport: TransportKind,
}

impl HttpConfig {
    /// Create a configuration for `uri` with defaults elsewhere.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            method: Method::default(),
            auth_type: None,
            relative_uri: None,
            bearer_token: None,
            refresh_token: None,
            refresh_token_name: DEFAULT_REFRESH_TOKEN_NAME.to_string(),
            timeout: DEFAULT_TIMEOUT,
            transport: TransportKind::default(),
        }
    }

    /// Set the request method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Fix the auth type instead of discovering it.
    pub fn with_auth_type(mut self, auth_type: HttpAuthType) -> Self {
        self.auth_type = Some(auth_type);
        self
    }

    /// Override the Digest URI.
    pub fn with_relative_uri(mut self, relative_uri: impl Into<String>) -> Self {
        self.relative_uri = Some(relative_uri.into());
        self
    }

    /// Set the bearer token.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the refresh token and, optionally, its body field name.
    pub fn with_refresh_token(mut self, token: impl Into<String>, name: Option<&str>) -> Self {
        self.refresh_token = Some(token.into());
        if let Some(name) = name {
            self.refresh_token_name = name.to_string();
        }
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Select the built-in transport.
    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    /// Check that the URI is an absolute `http`/`https` URI.
    pub fn validate(&self) -> Result<()> {
        validate_uri(&self.uri)
    }

    /// URI used in the Digest hash.
    pub fn relative_uri(&self) -> String {
        self.relative_uri
            .clone()
            .unwrap_or_else(|| relative_uri_of(&self.uri))
    }

    /// Build the configured transport.
    pub fn build_transport(&self) -> Result<Box<dyn HttpTransport>> {
        Ok(match self.transport {
            TransportKind::Stream => Box::new(StreamTransport::new(self.timeout)),
            TransportKind::Reqwest => Box::new(ReqwestTransport::new(self.timeout)?),
        })
    }
}

impl fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConfig")
            .field("uri", &self.uri)
            .field("method", &self.method)
            .field("auth_type", &self.auth_type)
            .field("relative_uri", &self.relative_uri)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token_name", &self.refresh_token_name)
            .field("timeout", &self.timeout)
            .field("transport", &self.transport)
            .finish()
    }
}

/// Reject URIs that do not start with `http` or do not parse.
pub fn validate_uri(uri: &str) -> Result<()> {
    if !uri.starts_with("http") {
        return Err(Error::InvalidUri(format!(
            "uri must begin with http: {}",
            uri
        )));
    }
    url::Url::parse(uri).map_err(|e| Error::InvalidUri(format!("{}: {}", uri, e)))?;
    Ok(())
}

/// Path and query of an absolute URI, or `/` when it has no path.
pub fn relative_uri_of(uri: &str) -> String {
    if let Ok(url) = url::Url::parse(uri) {
        return match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
    }

    let after_scheme = match uri.find("://") {
        Some(pos) => &uri[pos + 3..],
        None => uri,
    };
    match after_scheme.find(|c: char| c == '/' || c == '?') {
        Some(pos) if after_scheme[pos..].starts_with('?') => format!("/{}", &after_scheme[pos..]),
        Some(pos) => after_scheme[pos..].to_string(),
        None => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HttpConfig::new("http://localhost/auth");
        assert_eq!(config.method, Method::Post);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.refresh_token_name, DEFAULT_REFRESH_TOKEN_NAME);
        assert_eq!(config.transport, TransportKind::Reqwest);
        assert!(config.auth_type.is_none());
    }

    #[test]
    fn test_validate_uri() {
        assert!(validate_uri("http://localhost/auth").is_ok());
        assert!(validate_uri("https://example.com").is_ok());
        assert!(matches!(
            validate_uri("localhost/auth"),
            Err(Error::InvalidUri(_))
        ));
        assert!(matches!(validate_uri("ftp://host"), Err(Error::InvalidUri(_))));
        assert!(matches!(validate_uri("http//broken"), Err(Error::InvalidUri(_))));
    }

    #[test]
    fn test_relative_uri() {
        assert_eq!(relative_uri_of("http://localhost:8080/api/auth?x=1"), "/api/auth?x=1");
        assert_eq!(relative_uri_of("http://localhost"), "/");
        assert_eq!(relative_uri_of("http://localhost?x=1"), "/?x=1");
        assert_eq!(relative_uri_of("http://localhost:8080?x=1&y=2"), "/?x=1&y=2");

        let config = HttpConfig::new("http://localhost/a").with_relative_uri("/b");
        assert_eq!(config.relative_uri(), "/b");
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let config = HttpConfig::new("http://localhost")
            .with_bearer_token("secret-bearer")
            .with_refresh_token("secret-refresh", Some("rt"));
        let debug = format!("{:?}", config);

        assert!(!debug.contains("secret-bearer"));
        assert!(!debug.contains("secret-refresh"));
        assert!(debug.contains("\"rt\""));
    }
}
