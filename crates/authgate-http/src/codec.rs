//! Response body decoding.
//!
//! Bodies arrive either chunked (`Transfer-Encoding: chunked`), compressed
//! (`Content-Encoding: gzip | deflate`), or both. Chunked framing is removed
//! first, then the content encoding.

use std::io::Read;

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};

use crate::error::{Error, Result};
use crate::headers::Headers;

/// Content encodings understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    /// gzip member.
    Gzip,
    /// zlib-wrapped or raw deflate stream.
    Deflate,
    /// Anything else; passed through unchanged.
    Identity,
}

impl ContentEncoding {
    /// Classify a `Content-Encoding` header value.
    pub fn from_header(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "gzip" | "x-gzip" => ContentEncoding::Gzip,
            "deflate" => ContentEncoding::Deflate,
            _ => ContentEncoding::Identity,
        }
    }
}

/// Remove chunked transfer framing.
///
/// Reads a hex size line (a `;extension` suffix is dropped), copies that many
/// bytes, and stops at the zero-size chunk. A size line that is not valid hex,
/// or a buffer with no further line break, is copied verbatim and ends
/// decoding.
pub fn decode_chunked(body: &[u8]) -> Vec<u8> {
    let mut decoded = Vec::with_capacity(body.len());
    let mut rest = body;

    while !rest.is_empty() {
        let Some(lf) = rest.iter().position(|&b| b == b'\n') else {
            decoded.extend_from_slice(rest);
            break;
        };

        let line = rest[..lf].trim_ascii();
        let size_field = match line.iter().position(|&b| b == b';') {
            Some(pos) => line[..pos].trim_ascii(),
            None => line,
        };

        if size_field.is_empty() {
            // Line break trailing the previous chunk.
            rest = &rest[lf + 1..];
            continue;
        }

        let size = std::str::from_utf8(size_field)
            .ok()
            .and_then(|hex| usize::from_str_radix(hex, 16).ok());

        let Some(size) = size else {
            decoded.extend_from_slice(rest);
            break;
        };

        if size == 0 {
            break;
        }

        let start = lf + 1;
        let end = start.saturating_add(size).min(rest.len());
        decoded.extend_from_slice(&rest[start..end]);

        // Skip the data and the CR that precedes its line break.
        let next = (lf + 2).saturating_add(size).min(rest.len());
        rest = &rest[next..];
    }

    decoded
}

/// Decode a body according to its `Content-Encoding` value.
///
/// gzip bodies are inflated as a full gzip member. deflate bodies are
/// inflated as zlib when the first two bytes pass the zlib header check
/// (big-endian value divisible by 31), otherwise as raw deflate. Unknown
/// encodings are returned unchanged.
pub fn decode_body(body: &[u8], encoding: &str) -> Result<Vec<u8>> {
    let mut decoded = Vec::new();

    match ContentEncoding::from_header(encoding) {
        ContentEncoding::Gzip => {
            GzDecoder::new(body)
                .read_to_end(&mut decoded)
                .map_err(|e| Error::Decode(format!("failed to inflate gzip body: {}", e)))?;
        }
        ContentEncoding::Deflate => {
            let zlib_wrapped =
                body.len() >= 2 && u16::from_be_bytes([body[0], body[1]]) % 31 == 0;
            let read = if zlib_wrapped {
                ZlibDecoder::new(body).read_to_end(&mut decoded)
            } else {
                DeflateDecoder::new(body).read_to_end(&mut decoded)
            };
            read.map_err(|e| Error::Decode(format!("failed to inflate deflate body: {}", e)))?;
        }
        ContentEncoding::Identity => decoded.extend_from_slice(body),
    }

    Ok(decoded)
}

/// Whether the headers announce chunked transfer encoding.
pub fn is_chunked(headers: &Headers) -> bool {
    headers
        .get("Transfer-Encoding")
        .map(|value| value.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false)
}

/// Apply the `Content-Encoding` named in `headers` to `body`.
///
/// A body that fails to decode is kept as received; the status line and
/// headers remain usable.
pub fn decode_content(headers: &Headers, body: Vec<u8>) -> Vec<u8> {
    let Some(encoding) = headers.get("Content-Encoding") else {
        return body;
    };

    match decode_body(&body, encoding) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!(error = %e, encoding, "keeping undecoded response body");
            body
        }
    }
}
