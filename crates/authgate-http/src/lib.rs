//! HTTP challenge/response authentication for authgate.
//!
//! [`HttpAuthenticator`] reads a server's `WWW-Authenticate` challenge and
//! answers it with Basic, Digest, Bearer, form or refresh-token credentials.
//! The final response status decides the result: 200 is VALID, anything
//! else (including an unreachable server) is NOT_VALID.
//!
//! # Example
//!
//! ```ignore
//! use authgate_core::Authenticator;
//! use authgate_http::{HttpAuthenticator, HttpConfig};
//!
//! let mut auth = HttpAuthenticator::from_config(HttpConfig::new("http://localhost/auth"))?;
//! if auth.authenticate("admin", Some("12admin34"))?.is_valid() {
//!     println!("welcome");
//! }
//! ```

pub mod auth_header;
pub mod authenticator;
pub mod challenge;
pub mod codec;
pub mod config;
pub mod error;
pub mod headers;
pub mod request;
pub mod response;
pub mod transport;

pub use auth_header::BodyEncoding;
pub use authenticator::{HttpAuthenticator, HttpPhase};
pub use challenge::{Challenge, HttpAuthType};
pub use codec::{decode_body, decode_chunked, decode_content, ContentEncoding};
pub use config::{HttpConfig, TransportKind, DEFAULT_REFRESH_TOKEN_NAME, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use headers::Headers;
pub use request::{HttpRequest, Method};
pub use response::HttpResponse;
pub use transport::{HttpTransport, ReqwestTransport, ScriptedTransport, StreamTransport};
