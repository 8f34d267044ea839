//! Request/response transports.
//!
//! [`HttpTransport`] is the seam between the challenge engine and the
//! network. Two implementations ship with the crate:
//! - [`StreamTransport`]: HTTP/1.1 over a plain `TcpStream`, parsed by
//!   [`HttpResponse::parse`]
//! - [`ReqwestTransport`]: `reqwest::blocking`, with the same body decoding
//!
//! [`ScriptedTransport`] replays canned responses and records requests.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use url::Url;

use crate::codec::decode_content;
use crate::error::{Error, Result};
use crate::headers::Headers;
use crate::request::{HttpRequest, Method};
use crate::response::HttpResponse;

/// Encodings advertised by the stream transport.
pub const ACCEPT_ENCODING: &str = "gzip, deflate";

/// Sends one request and returns the complete response.
pub trait HttpTransport: Send {
    /// Perform a blocking round-trip.
    fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse>;

    /// Short name used in log output.
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<T: HttpTransport + ?Sized> HttpTransport for Box<T> {
    fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).send(request)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// HTTP/1.1 over a raw TCP stream.
#[derive(Debug, Clone)]
pub struct StreamTransport {
    timeout: Duration,
}

impl StreamTransport {
    /// Create a transport with connect, read and write timeouts.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn connect(&self, host: &str, port: u16) -> Result<TcpStream> {
        let addrs = (host, port).to_socket_addrs()?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }

        Err(match last_err {
            Some(e) => Error::Io(e),
            None => Error::Core(authgate_core::Error::Transport(format!(
                "no address found for {}:{}",
                host, port
            ))),
        })
    }
}

impl HttpTransport for StreamTransport {
    fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = Url::parse(&request.uri)
            .map_err(|e| Error::InvalidUri(format!("{}: {}", request.uri, e)))?;

        match url.scheme() {
            "http" => {}
            "https" => {
                return Err(Error::Core(authgate_core::Error::Transport(
                    "https is not supported by the stream transport, use the reqwest transport"
                        .to_string(),
                )))
            }
            other => {
                return Err(Error::InvalidUri(format!(
                    "unsupported scheme: {}",
                    other
                )))
            }
        }

        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidUri(format!("missing host: {}", request.uri)))?;
        let port = url.port_or_known_default().unwrap_or(80);

        for (name, value) in request.headers.iter() {
            check_header_line(name, value)?;
        }

        let host_header = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let target = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        // Connect to server
        let mut stream = self.connect(host, port)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        // Serialize request head
        let body = request.body.as_deref().unwrap_or(&[]);
        let mut head = format!("{} {} HTTP/1.1\r\n", request.method, target);
        head.push_str(&format!("Host: {}\r\n", host_header));
        head.push_str("Connection: close\r\n");
        if !request.headers.contains("Accept-Encoding") {
            head.push_str(&format!("Accept-Encoding: {}\r\n", ACCEPT_ENCODING));
        }
        for (name, value) in request.headers.iter() {
            if name.eq_ignore_ascii_case("Host")
                || name.eq_ignore_ascii_case("Connection")
                || name.eq_ignore_ascii_case("Content-Length")
            {
                continue;
            }
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        if !body.is_empty() || request.method != Method::Get {
            head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        head.push_str("\r\n");

        stream.write_all(head.as_bytes())?;
        stream.write_all(body)?;
        stream.flush()?;

        // Read until the server closes the connection
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw)?;

        tracing::debug!(
            uri = %request.uri,
            bytes = raw.len(),
            "received raw response"
        );

        HttpResponse::parse(&raw)
    }

    fn name(&self) -> &'static str {
        "stream"
    }
}

/// Refuse header names or values that would break the request head.
fn check_header_line(name: &str, value: &str) -> Result<()> {
    let breaks_line = |s: &str| s.contains(|c: char| c == '\r' || c == '\n');
    if breaks_line(name) || breaks_line(value) {
        return Err(Error::config(format!(
            "header {} contains a line break",
            name.escape_debug()
        )));
    }
    Ok(())
}

/// Transport backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Build a client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
        };

        let mut builder = self.client.request(method, &request.uri);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;

        let version = format!("{:?}", response.version());
        let version = version
            .strip_prefix("HTTP/")
            .unwrap_or(&version)
            .to_string();
        let status = response.status();

        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers.insert(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }

        let body = response.bytes()?.to_vec();
        let body = decode_content(&headers, body);

        Ok(HttpResponse {
            version,
            code: status.as_u16(),
            message: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

/// A scripted reply.
#[derive(Debug, Clone)]
enum Reply {
    Response(HttpResponse),
    Unreachable(String),
}

/// Transport that replays queued responses and records every request.
///
/// Clones share the same queue and request log, so a test can keep one
/// handle while the authenticator owns the other.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response (builder style).
    pub fn with_response(self, response: HttpResponse) -> Self {
        self.push_response(response);
        self
    }

    /// Queue a response.
    pub fn push_response(&self, response: HttpResponse) {
        self.replies.lock().push_back(Reply::Response(response));
    }

    /// Queue a transport failure.
    pub fn push_unreachable(&self, reason: impl Into<String>) {
        self.replies.lock().push_back(Reply::Unreachable(reason.into()));
    }

    /// Requests sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Number of replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

impl HttpTransport for ScriptedTransport {
    fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().push(request.clone());

        match self.replies.lock().pop_front() {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Unreachable(reason)) => {
                Err(Error::Core(authgate_core::Error::Transport(reason)))
            }
            None => Err(Error::Core(authgate_core::Error::Transport(
                "no scripted response left".to_string(),
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
