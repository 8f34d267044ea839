//! `WWW-Authenticate` challenge parsing.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How credentials are attached to the final request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpAuthType {
    /// `Authorization: Basic base64(username:password)`.
    Basic,
    /// RFC 2617 style digest without qop.
    Digest,
    /// `Authorization: Bearer <token>`.
    Bearer,
    /// URL-encoded form body with username and password.
    UrlData,
    /// Multipart form body with username and password.
    FormData,
    /// Bearer header plus a refresh token body.
    Refresh,
}

impl HttpAuthType {
    /// Map a challenge auth-scheme token to a type.
    ///
    /// Only schemes a server can announce are recognised.
    pub fn from_challenge(scheme: &str) -> Option<Self> {
        if scheme.eq_ignore_ascii_case("basic") {
            Some(HttpAuthType::Basic)
        } else if scheme.eq_ignore_ascii_case("digest") {
            Some(HttpAuthType::Digest)
        } else if scheme.eq_ignore_ascii_case("bearer") {
            Some(HttpAuthType::Bearer)
        } else {
            None
        }
    }

    /// Whether the type needs server-issued challenge parameters.
    pub fn needs_challenge(self) -> bool {
        self == HttpAuthType::Digest
    }
}

impl fmt::Display for HttpAuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpAuthType::Basic => "basic",
            HttpAuthType::Digest => "digest",
            HttpAuthType::Bearer => "bearer",
            HttpAuthType::UrlData => "url_data",
            HttpAuthType::FormData => "form_data",
            HttpAuthType::Refresh => "refresh",
        };
        f.write_str(name)
    }
}

/// One parsed `WWW-Authenticate` value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Challenge {
    /// Auth-scheme token as sent by the server.
    pub auth_type: String,
    /// Challenge parameters.
    pub params: BTreeMap<String, String>,
}

impl Challenge {
    /// Parse a header value such as `Digest realm="x", nonce="y"`.
    ///
    /// Parameters are separated by `", "`. Values lose one pair of
    /// surrounding double quotes. Pieces without `=` are ignored.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();

        let Some((auth_type, rest)) = value.split_once(' ') else {
            return Self {
                auth_type: value.to_string(),
                params: BTreeMap::new(),
            };
        };

        let params = rest
            .split(", ")
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                Some((name.trim().to_string(), unquote(value.trim()).to_string()))
            })
            .collect();

        Self {
            auth_type: auth_type.to_string(),
            params,
        }
    }

    /// Parameter value.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The `realm` parameter.
    pub fn realm(&self) -> Option<&str> {
        self.param("realm")
    }

    /// The `nonce` parameter.
    pub fn nonce(&self) -> Option<&str> {
        self.param("nonce")
    }

    /// Whether both `realm` and `nonce` were parsed.
    pub fn has_digest_params(&self) -> bool {
        self.realm().is_some() && self.nonce().is_some()
    }

    /// Recognised auth type of the challenge.
    pub fn http_auth_type(&self) -> Option<HttpAuthType> {
        HttpAuthType::from_challenge(&self.auth_type)
    }
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_realm() {
        let challenge = Challenge::parse("Basic realm=\"myRealm\"");
        assert_eq!(challenge.auth_type, "Basic");
        assert_eq!(challenge.params.len(), 1);
        assert_eq!(challenge.realm(), Some("myRealm"));
        assert_eq!(challenge.http_auth_type(), Some(HttpAuthType::Basic));
    }

    #[test]
    fn test_parse_digest_params() {
        let challenge =
            Challenge::parse("Digest realm=\"x\", nonce=\"y\", opaque=z, stale=FALSE");
        assert_eq!(challenge.auth_type, "Digest");
        assert_eq!(challenge.realm(), Some("x"));
        assert_eq!(challenge.nonce(), Some("y"));
        assert_eq!(challenge.param("opaque"), Some("z"));
        assert_eq!(challenge.param("stale"), Some("FALSE"));
        assert!(challenge.has_digest_params());
    }

    #[test]
    fn test_parse_type_only() {
        let challenge = Challenge::parse("Bearer");
        assert_eq!(challenge.auth_type, "Bearer");
        assert!(challenge.params.is_empty());
        assert!(!challenge.has_digest_params());
    }

    #[test]
    fn test_parse_skips_pairs_without_equals() {
        let challenge = Challenge::parse("Digest realm=\"x\", garbage, nonce=\"y\"");
        assert_eq!(challenge.params.len(), 2);
        assert!(challenge.has_digest_params());
    }

    #[test]
    fn test_single_quote_char_kept() {
        let challenge = Challenge::parse("Basic realm=\"");
        assert_eq!(challenge.realm(), Some("\""));
    }

    #[test]
    fn test_value_with_equals() {
        let challenge = Challenge::parse("Digest nonce=\"abc==\"");
        assert_eq!(challenge.nonce(), Some("abc=="));
    }

    #[test]
    fn test_scheme_names() {
        assert_eq!(HttpAuthType::from_challenge("DIGEST"), Some(HttpAuthType::Digest));
        assert_eq!(HttpAuthType::from_challenge("bearer"), Some(HttpAuthType::Bearer));
        assert_eq!(HttpAuthType::from_challenge("Negotiate"), None);
        assert!(HttpAuthType::Digest.needs_challenge());
        assert!(!HttpAuthType::Basic.needs_challenge());
    }
}
