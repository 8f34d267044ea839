//! Response model and raw response parsing.

use crate::codec::{decode_chunked, decode_content, is_chunked};
use crate::error::{Error, Result};
use crate::headers::Headers;

/// A received HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// Protocol version from the status line (`"1.1"`).
    pub version: String,
    /// Status code.
    pub code: u16,
    /// Reason phrase.
    pub message: String,
    /// Response headers.
    pub headers: Headers,
    /// Decoded body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response with a status code and reason phrase.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            version: "1.1".to_string(),
            code,
            message: message.into(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Parse a complete raw response as read from a socket.
    ///
    /// Transfer and content encodings are removed from the body. A body
    /// that fails to decode is kept as received.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::InvalidResponse("empty response".to_string()));
        }

        let (head, body) = split_head(raw);
        let head = String::from_utf8_lossy(head);
        let mut lines = head.lines();

        let status_line = lines
            .next()
            .map(str::trim)
            .filter(|line| line.starts_with("HTTP/"))
            .ok_or_else(|| Error::InvalidResponse("missing status line".to_string()))?;

        let (version, code, message) = parse_status_line(status_line)?;

        let mut headers = Headers::new();
        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            headers.insert(name.trim(), value.trim());
        }

        let mut body = body.to_vec();
        if is_chunked(&headers) {
            body = decode_chunked(&body);
        }
        let body = decode_content(&headers, body);

        Ok(Self {
            version,
            code,
            message,
            headers,
            body,
        })
    }

    /// Header value, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The `WWW-Authenticate` challenge, if any.
    pub fn www_authenticate(&self) -> Option<&str> {
        self.header("WWW-Authenticate")
    }

    /// Body as UTF-8 text (lossy).
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Whether the status is exactly 200.
    pub fn is_ok(&self) -> bool {
        self.code == 200
    }
}

fn split_head(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(pos) = find(raw, b"\r\n\r\n") {
        return (&raw[..pos], &raw[pos + 4..]);
    }
    if let Some(pos) = find(raw, b"\n\n") {
        return (&raw[..pos], &raw[pos + 2..]);
    }
    (raw, &[])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn parse_status_line(line: &str) -> Result<(String, u16, String)> {
    let mut parts = line.splitn(3, ' ');

    let version = parts
        .next()
        .and_then(|proto| proto.split_once('/'))
        .map(|(_, version)| version.to_string())
        .unwrap_or_default();

    let code = parts
        .next()
        .filter(|code| code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| Error::InvalidResponse(format!("malformed status line: {}", line)))?;

    let message = parts.next().unwrap_or("").trim().to_string();

    Ok((version, code, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_parse_status_and_headers() {
        let raw = b"HTTP/1.1 401 Unauthorized\r\n\
WWW-Authenticate: Digest realm=\"x\", nonce=\"y\"\r\n\
Content-Length: 0\r\n\r\n";
        let response = HttpResponse::parse(raw).unwrap();

        assert_eq!(response.version, "1.1");
        assert_eq!(response.code, 401);
        assert_eq!(response.message, "Unauthorized");
        assert_eq!(
            response.www_authenticate(),
            Some("Digest realm=\"x\", nonce=\"y\"")
        );
        assert!(!response.is_ok());
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_header_value_keeps_colons() {
        let raw = b"HTTP/1.0 200 OK\r\nLocation: http://localhost:8080/x\r\n\r\nhello";
        let response = HttpResponse::parse(raw).unwrap();

        assert_eq!(response.version, "1.0");
        assert_eq!(response.header("location"), Some("http://localhost:8080/x"));
        assert_eq!(response.body_text(), "hello");
        assert!(response.is_ok());
    }

    #[test]
    fn test_chunked_gzip_body() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"Test body").unwrap();
        let gz = encoder.finish().unwrap();

        let mut raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nContent-Encoding: gzip\r\n\r\n"
            .to_vec();
        raw.extend_from_slice(format!("{:x}\r\n", gz.len()).as_bytes());
        raw.extend_from_slice(&gz);
        raw.extend_from_slice(b"\r\n0\r\n\r\n");

        let response = HttpResponse::parse(&raw).unwrap();
        assert_eq!(response.body_text(), "Test body");
    }

    #[test]
    fn test_invalid_responses() {
        assert!(matches!(
            HttpResponse::parse(b""),
            Err(Error::InvalidResponse(_))
        ));
        assert!(matches!(
            HttpResponse::parse(b"garbage\r\n\r\n"),
            Err(Error::InvalidResponse(_))
        ));
        assert!(matches!(
            HttpResponse::parse(b"HTTP/1.1 abc Nope\r\n\r\n"),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_reason_phrase_optional() {
        let response = HttpResponse::parse(b"HTTP/1.1 204\r\n\r\n").unwrap();
        assert_eq!(response.code, 204);
        assert_eq!(response.message, "");
    }
}
