//! Minimal HTTP/1.x request surface for feeding multipart bodies to the parser.

use crate::boundary::extract_boundary;
use crate::codec::CodecRegistry;
use crate::error::FormError;
use crate::multipart::{self, Multipart, MultipartConfig};
use log::debug;
use std::collections::HashMap;
use std::io::Read;

/// Maximum size for request headers (8KB)
const MAX_HEADERS_SIZE: usize = 8 * 1024;

/// Maximum size for a request body (10GB)
pub const MAX_REQUEST_BODY_SIZE: u64 = 10 * 1024 * 1024 * 1024;

/// An HTTP request with a fully received body.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: String,
    pub path: String,
    /// Header names are stored lowercased
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new<M: Into<String>, P: Into<String>>(method: M, path: P) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn with_header<K: AsRef<str>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Read a complete request (request line, headers, `Content-Length` body)
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, FormError> {
        let (head, remaining_bytes) = Self::read_head_with_remaining(reader)?;
        let mut lines = head.lines();

        let request_line = lines
            .next()
            .ok_or_else(|| FormError::bad_request("empty request"))?;
        let parts: Vec<&str> = request_line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(FormError::bad_request(format!(
                "malformed request line: {request_line}"
            )));
        }
        if !parts[2].starts_with("HTTP/1.") {
            return Err(FormError::bad_request(format!(
                "unsupported HTTP version: {}",
                parts[2]
            )));
        }

        let mut headers = HashMap::new();
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                break;
            }

            if let Some((key, value)) = line.split_once(':') {
                let key = key.trim().to_lowercase();
                let value = value.trim().to_string();

                // Repeated headers are folded into one comma-separated value
                if let Some(existing) = headers.get(&key) {
                    headers.insert(key, format!("{existing}, {value}"));
                } else {
                    headers.insert(key, value);
                }
            }
        }

        let body = Self::read_body(reader, &headers, remaining_bytes)?;

        debug!(
            "Parsed request: {} {} (headers: {}, body_size: {})",
            parts[0],
            parts[1],
            headers.len(),
            body.as_ref().map(|b| b.len()).unwrap_or(0)
        );

        Ok(Request {
            method: parts[0].to_string(),
            path: parts[1].to_string(),
            headers,
            body,
        })
    }

    /// Read up to the blank line ending the head and return the bytes already
    /// read past it
    fn read_head_with_remaining<R: Read>(reader: &mut R) -> Result<(String, Vec<u8>), FormError> {
        let mut buffer = vec![0; MAX_HEADERS_SIZE];
        let mut total_read = 0;

        loop {
            let bytes_read = reader.read(&mut buffer[total_read..])?;
            if bytes_read == 0 {
                if total_read == 0 {
                    return Err(FormError::bad_request("empty request"));
                }
                break;
            }
            total_read += bytes_read;

            let filled = &buffer[..total_read];
            let split = filled
                .windows(4)
                .position(|window| window == b"\r\n\r\n")
                .map(|pos| (pos, pos + 4))
                .or_else(|| {
                    filled
                        .windows(2)
                        .position(|window| window == b"\n\n")
                        .map(|pos| (pos, pos + 2))
                });

            if let Some((head_end, body_start)) = split {
                let head = std::str::from_utf8(&filled[..head_end])
                    .map_err(|_| FormError::bad_request("request head is not UTF-8"))?;
                return Ok((head.to_string(), filled[body_start..].to_vec()));
            }

            if total_read >= buffer.len() {
                return Err(FormError::bad_request("request head too large"));
            }
        }

        let head = std::str::from_utf8(&buffer[..total_read])
            .map_err(|_| FormError::bad_request("request head is not UTF-8"))?;
        Ok((head.to_string(), Vec::new()))
    }

    fn read_body<R: Read>(
        reader: &mut R,
        headers: &HashMap<String, String>,
        mut remaining_bytes: Vec<u8>,
    ) -> Result<Option<Vec<u8>>, FormError> {
        if let Some(encoding) = headers.get("transfer-encoding") {
            if encoding.to_lowercase().contains("chunked") {
                return Err(FormError::bad_request(
                    "chunked transfer encoding is not supported",
                ));
            }
        }

        let content_length = match headers.get("content-length") {
            Some(length) => length
                .parse::<u64>()
                .map_err(|_| FormError::bad_request(format!("invalid Content-Length: {length}")))?,
            None => return Ok(None),
        };

        if content_length == 0 {
            return Ok(None);
        }

        if content_length > MAX_REQUEST_BODY_SIZE {
            return Err(FormError::PayloadTooLarge(MAX_REQUEST_BODY_SIZE));
        }

        let already = remaining_bytes.len() as u64;
        if already >= content_length {
            // content_length <= already, which is a usize
            remaining_bytes.truncate(content_length as usize);
            return Ok(Some(remaining_bytes));
        }

        // Grow with the bytes actually received rather than the declared length
        reader
            .by_ref()
            .take(content_length - already)
            .read_to_end(&mut remaining_bytes)?;
        if (remaining_bytes.len() as u64) < content_length {
            return Err(FormError::bad_request(format!(
                "body shorter than Content-Length {content_length}"
            )));
        }
        Ok(Some(remaining_bytes))
    }
}

/// Parse the multipart body of a request with the default limits and codecs
pub fn parse_from_request(request: &Request) -> Result<Multipart, FormError> {
    parse_from_request_with(request, &MultipartConfig::default(), CodecRegistry::global())
}

/// Parse the multipart body of a request with explicit limits and codecs
pub fn parse_from_request_with(
    request: &Request,
    config: &MultipartConfig,
    registry: &CodecRegistry,
) -> Result<Multipart, FormError> {
    let content_type = request
        .header("content-type")
        .ok_or_else(|| FormError::missing_boundary("request has no Content-Type header"))?;
    let boundary = extract_boundary(content_type)?;
    let body = request.body.as_deref().unwrap_or_default();

    debug!(
        "Parsing multipart body of {} bytes with boundary {:?}",
        body.len(),
        String::from_utf8_lossy(&boundary)
    );
    let form = multipart::parse_with(body, &boundary, config, registry)?;
    debug!("Parsed {} multipart parts", form.len());
    Ok(form)
}
