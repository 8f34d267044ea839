//! Authorization header and credential body builders.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use md5::{Digest, Md5};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::request::Method;

/// Length of generated multipart boundaries.
pub const BOUNDARY_LEN: usize = 24;

/// `Basic base64(username:password)`.
pub fn basic(username: &str, password: &str) -> String {
    let token = STANDARD.encode(format!("{}:{}", username, password));
    format!("Basic {}", token)
}

/// `Bearer <token>`.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

/// Digest response hash: `md5(md5(user:realm:pass):nonce:md5(method:uri))`.
pub fn digest_response(
    username: &str,
    realm: &str,
    password: &str,
    method: Method,
    relative_uri: &str,
    nonce: &str,
) -> String {
    let a1 = md5_hex(&format!("{}:{}:{}", username, realm, password));
    let a2 = md5_hex(&format!("{}:{}", method.as_str(), relative_uri));
    md5_hex(&format!("{}:{}:{}", a1, nonce, a2))
}

/// Digest `Authorization` value.
///
/// Fields appear in the order username, realm, nonce, uri, response.
/// Missing realm or nonce is a configuration error.
pub fn digest(
    username: &str,
    password: &str,
    realm: Option<&str>,
    nonce: Option<&str>,
    method: Method,
    relative_uri: &str,
) -> Result<String> {
    let (Some(realm), Some(nonce)) = (realm, nonce) else {
        return Err(Error::config(
            "realm and/or nonce was not successfully parsed",
        ));
    };

    let response = digest_response(username, realm, password, method, relative_uri, nonce);
    Ok(format!(
        "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", response=\"{}\"",
        username, realm, nonce, relative_uri, response
    ))
}

/// Encoding of a credential body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyEncoding {
    /// `application/x-www-form-urlencoded`.
    UrlEncoded,
    /// `multipart/form-data` with the given boundary.
    Multipart {
        /// Part separator.
        boundary: String,
    },
    /// `application/json` object.
    Json,
}

impl BodyEncoding {
    /// Multipart encoding with a random boundary.
    pub fn multipart() -> Self {
        let boundary: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(BOUNDARY_LEN)
            .map(char::from)
            .collect();
        BodyEncoding::Multipart {
            boundary: format!("authgate{}", boundary),
        }
    }

    /// Pick an encoding from a caller-supplied `Content-Type`.
    ///
    /// `json` selects JSON, `multipart` selects multipart, anything else
    /// (or nothing) selects URL encoding.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type.map(str::to_ascii_lowercase) else {
            return BodyEncoding::UrlEncoded;
        };
        if content_type.contains("json") {
            BodyEncoding::Json
        } else if content_type.contains("multipart") {
            BodyEncoding::multipart()
        } else {
            BodyEncoding::UrlEncoded
        }
    }

    /// `Content-Type` header value for this encoding.
    pub fn content_type(&self) -> String {
        match self {
            BodyEncoding::UrlEncoded => "application/x-www-form-urlencoded".to_string(),
            BodyEncoding::Multipart { boundary } => {
                format!("multipart/form-data; boundary={}", boundary)
            }
            BodyEncoding::Json => "application/json".to_string(),
        }
    }

    /// Encode `fields` in order.
    pub fn encode(&self, fields: &[(&str, &str)]) -> Vec<u8> {
        match self {
            BodyEncoding::UrlEncoded => url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields.iter().copied())
                .finish()
                .into_bytes(),
            BodyEncoding::Multipart { boundary } => {
                let mut body = String::new();
                for (name, value) in fields {
                    body.push_str(&format!(
                        "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                        boundary, name, value
                    ));
                }
                body.push_str(&format!("--{}--\r\n", boundary));
                body.into_bytes()
            }
            BodyEncoding::Json => {
                let object: Map<String, Value> = fields
                    .iter()
                    .map(|(name, value)| (name.to_string(), Value::from(*value)))
                    .collect();
                Value::Object(object).to_string().into_bytes()
            }
        }
    }
}
