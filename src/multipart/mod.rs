//! multipart/form-data body decoder
//!
//! Decodes a fully received `multipart/form-data` body in a single pass over the
//! buffer. The body is a sequence of parts, each introduced by a delimiter line
//! and carrying its own header block:
//!
//! ```text
//! --boundary\r\n
//! Content-Disposition: form-data; name="field1"\r\n
//! \r\n
//! value1\r\n
//! --boundary--
//! ```
//!
//! Any malformed input aborts the whole parse; parts decoded before the error
//! are discarded.
//!
//! # Example
//! ```rust
//! use formwire::multipart;
//!
//! let body = b"--XYZ\r\nContent-Disposition: form-data; name=\"field1\"\r\n\r\nvalue1\r\n--XYZ--";
//! let form = multipart::parse(body, b"XYZ").unwrap();
//!
//! assert_eq!(form.len(), 1);
//! assert_eq!(form.get("field1").and_then(|p| p.text()), Some("value1"));
//! ```

mod content;
mod headers;
mod scanner;

pub use headers::{
    CONTENT_DISPOSITION, CONTENT_TRANSFER_ENCODING, CONTENT_TYPE, ContentDisposition, Headers,
};

use crate::codec::CodecRegistry;
use crate::error::FormError;
use scanner::Scanner;

/// Default limits for multipart parsing
const DEFAULT_MAX_PARTS: usize = 100;
const DEFAULT_MAX_PART_SIZE: u64 = 10 * 1024 * 1024 * 1024; // 10GB per part

const CRLF: &[u8] = b"\r\n";
const DASHES: &[u8] = b"--";

/// Limits applied while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartConfig {
    /// Maximum number of parts allowed
    pub max_parts: usize,
    /// Maximum raw (pre-decode) content size per part in bytes
    pub max_part_size: u64,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_parts: DEFAULT_MAX_PARTS,
            max_part_size: DEFAULT_MAX_PART_SIZE,
        }
    }
}

/// One decoded part of a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Content after Content-Transfer-Encoding decoding
    pub data: Vec<u8>,
    /// The `name` parameter of Content-Disposition
    pub key: Option<String>,
    /// All part headers, in order of appearance
    pub headers: Headers,
}

impl Part {
    /// The data as UTF-8 text, if it is valid UTF-8
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// The `filename` parameter of Content-Disposition
    pub fn filename(&self) -> Option<String> {
        let value = self.headers.get(CONTENT_DISPOSITION)?;
        let disposition = ContentDisposition::parse(value).ok()?;
        disposition.filename().map(str::to_string)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)
    }

    /// Check if this part is a file upload
    pub fn is_file(&self) -> bool {
        self.filename().is_some()
    }
}

/// All parts of a body, in the order they appeared
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Multipart {
    parts: Vec<Part>,
}

impl Multipart {
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Part> {
        self.parts.iter()
    }

    /// First part with the given key
    pub fn get(&self, key: &str) -> Option<&Part> {
        self.parts.iter().find(|part| part.key.as_deref() == Some(key))
    }

    /// Every part with the given key
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Part> + 'a {
        self.parts
            .iter()
            .filter(move |part| part.key.as_deref() == Some(key))
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }
}

impl IntoIterator for Multipart {
    type Item = Part;
    type IntoIter = std::vec::IntoIter<Part>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.into_iter()
    }
}

impl<'a> IntoIterator for &'a Multipart {
    type Item = &'a Part;
    type IntoIter = std::slice::Iter<'a, Part>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}

/// What follows a delimiter line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    /// CRLF: another part's headers follow
    Continue,
    /// `--`: end of the body
    End,
}

fn read_marker(scanner: &Scanner<'_>) -> Result<Option<Marker>, FormError> {
    if scanner.remaining() < 2 {
        return Err(FormError::unexpected_end(format!(
            "body ends inside delimiter at offset {}",
            scanner.position()
        )));
    }

    if scanner.peek_equals(CRLF) {
        Ok(Some(Marker::Continue))
    } else if scanner.peek_equals(DASHES) {
        Ok(Some(Marker::End))
    } else {
        Ok(None)
    }
}

/// Consumes `--boundary` at the very start of the body and reads its marker.
fn open(scanner: &mut Scanner<'_>, boundary: &[u8]) -> Result<Marker, FormError> {
    scanner.require(DASHES.len())?;
    if !scanner.peek_equals(DASHES) {
        return Err(FormError::malformed_boundary(
            "body does not start with '--'",
        ));
    }
    scanner.skip(DASHES.len())?;

    scanner.require(boundary.len())?;
    if !scanner.peek_equals(boundary) {
        return Err(FormError::malformed_boundary(format!(
            "opening delimiter does not match boundary at offset {}",
            scanner.position()
        )));
    }
    scanner.skip(boundary.len())?;

    read_marker(scanner)?.ok_or_else(|| {
        FormError::malformed_boundary(format!(
            "expected CRLF or '--' after opening delimiter at offset {}",
            scanner.position()
        ))
    })
}

/// Consumes `CRLF--boundary` between parts and reads its marker.
fn advance(scanner: &mut Scanner<'_>, full_boundary: &[u8]) -> Result<Marker, FormError> {
    scanner.skip(full_boundary.len())?;
    read_marker(scanner)?.ok_or_else(|| {
        FormError::malformed_ending(format!(
            "expected CRLF or '--' after boundary at offset {}",
            scanner.position()
        ))
    })
}

/// Parse a complete body with the default limits and codec registry
pub fn parse(data: &[u8], boundary: &[u8]) -> Result<Multipart, FormError> {
    parse_with(
        data,
        boundary,
        &MultipartConfig::default(),
        CodecRegistry::global(),
    )
}

/// Parse a complete body with explicit limits and codec registry
pub fn parse_with(
    data: &[u8],
    boundary: &[u8],
    config: &MultipartConfig,
    registry: &CodecRegistry,
) -> Result<Multipart, FormError> {
    if boundary.is_empty() {
        return Err(FormError::malformed_boundary("boundary is empty"));
    }

    let mut full_boundary = Vec::with_capacity(CRLF.len() + DASHES.len() + boundary.len());
    full_boundary.extend_from_slice(CRLF);
    full_boundary.extend_from_slice(DASHES);
    full_boundary.extend_from_slice(boundary);

    let mut scanner = Scanner::new(data);
    let mut parts = Vec::new();
    let mut marker = open(&mut scanner, boundary)?;

    while marker == Marker::Continue {
        if parts.len() >= config.max_parts {
            return Err(FormError::TooManyParts(config.max_parts));
        }

        let headers = headers::parse_header_block(&mut scanner)?;
        let disposition = headers::form_data_disposition(&headers)?;

        let raw = content::extract_content(&mut scanner, &full_boundary)?;
        if raw.len() as u64 > config.max_part_size {
            return Err(FormError::PayloadTooLarge(config.max_part_size));
        }
        let data = content::decode_content(raw, &headers, registry)?;

        parts.push(Part {
            data,
            key: disposition.name().map(str::to_string),
            headers,
        });

        marker = advance(&mut scanner, &full_boundary)?;
    }

    Ok(Multipart { parts })
}
