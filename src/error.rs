// SPDX-License-Identifier: MIT

use std::fmt;

use crate::codec::CodecError;

#[derive(Debug)]
pub enum FormError {
    // Parse errors
    MissingBoundary(String),
    UnexpectedEndOfInput(String),
    InvalidTextEncoding(String),
    MalformedBoundary(String),
    InvalidHeaderKey(String),
    InvalidHeaderValue(String),
    MissingContentDisposition(String),
    UnknownContentEncoding(String), // Contains the rejected encoding name
    MalformedEnding(String),
    Codec(CodecError),
    // Limit errors
    TooManyParts(usize),    // Contains the maximum allowed part count
    PayloadTooLarge(u64),   // Contains the maximum allowed part or body size
    // Surroundings
    BadRequest(String),
    Io(std::io::Error),
    InvalidConfiguration(String),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::MissingBoundary(reason) => write!(f, "Missing boundary: {reason}"),
            FormError::UnexpectedEndOfInput(reason) => {
                write!(f, "Unexpected end of input: {reason}")
            }
            FormError::InvalidTextEncoding(reason) => {
                write!(f, "Invalid text encoding: {reason}")
            }
            FormError::MalformedBoundary(reason) => write!(f, "Malformed boundary: {reason}"),
            FormError::InvalidHeaderKey(reason) => write!(f, "Invalid header key: {reason}"),
            FormError::InvalidHeaderValue(reason) => write!(f, "Invalid header value: {reason}"),
            FormError::MissingContentDisposition(reason) => {
                write!(f, "Missing form-data Content-Disposition: {reason}")
            }
            FormError::UnknownContentEncoding(encoding) => {
                write!(f, "Unknown Content-Transfer-Encoding '{encoding}'")
            }
            FormError::MalformedEnding(reason) => write!(f, "Malformed ending: {reason}"),
            FormError::Codec(err) => write!(f, "{err}"),
            FormError::TooManyParts(max_parts) => {
                write!(f, "Too many parts: maximum {max_parts} allowed")
            }
            FormError::PayloadTooLarge(max_size) => {
                write!(
                    f,
                    "Payload too large. Maximum allowed size: {max_size} bytes"
                )
            }
            FormError::BadRequest(reason) => write!(f, "Bad request: {reason}"),
            FormError::Io(err) => write!(f, "IO error: {err}"),
            FormError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl From<std::io::Error> for FormError {
    fn from(err: std::io::Error) -> Self {
        FormError::Io(err)
    }
}

impl From<CodecError> for FormError {
    fn from(err: CodecError) -> Self {
        FormError::Codec(err)
    }
}

impl std::error::Error for FormError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormError::Io(err) => Some(err),
            FormError::Codec(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl FormError {
    pub fn missing_boundary<S: Into<String>>(reason: S) -> Self {
        FormError::MissingBoundary(reason.into())
    }

    pub fn unexpected_end<S: Into<String>>(reason: S) -> Self {
        FormError::UnexpectedEndOfInput(reason.into())
    }

    pub fn malformed_boundary<S: Into<String>>(reason: S) -> Self {
        FormError::MalformedBoundary(reason.into())
    }

    pub fn malformed_ending<S: Into<String>>(reason: S) -> Self {
        FormError::MalformedEnding(reason.into())
    }

    pub fn unknown_encoding<S: Into<String>>(encoding: S) -> Self {
        FormError::UnknownContentEncoding(encoding.into())
    }

    pub fn bad_request<S: Into<String>>(reason: S) -> Self {
        FormError::BadRequest(reason.into())
    }

    /// Short stable identifier for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            FormError::MissingBoundary(_) => "missing_boundary",
            FormError::UnexpectedEndOfInput(_) => "unexpected_end_of_input",
            FormError::InvalidTextEncoding(_) => "invalid_text_encoding",
            FormError::MalformedBoundary(_) => "malformed_boundary",
            FormError::InvalidHeaderKey(_) => "invalid_header_key",
            FormError::InvalidHeaderValue(_) => "invalid_header_value",
            FormError::MissingContentDisposition(_) => "missing_content_disposition",
            FormError::UnknownContentEncoding(_) => "unknown_content_encoding",
            FormError::MalformedEnding(_) => "malformed_ending",
            FormError::Codec(_) => "codec_error",
            FormError::TooManyParts(_) => "too_many_parts",
            FormError::PayloadTooLarge(_) => "payload_too_large",
            FormError::BadRequest(_) => "bad_request",
            FormError::Io(_) => "io_error",
            FormError::InvalidConfiguration(_) => "invalid_configuration",
        }
    }

    /// Checks if the error was raised while decoding the multipart body itself
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            FormError::MissingBoundary(_)
                | FormError::UnexpectedEndOfInput(_)
                | FormError::InvalidTextEncoding(_)
                | FormError::MalformedBoundary(_)
                | FormError::InvalidHeaderKey(_)
                | FormError::InvalidHeaderValue(_)
                | FormError::MissingContentDisposition(_)
                | FormError::UnknownContentEncoding(_)
                | FormError::MalformedEnding(_)
                | FormError::Codec(_)
        )
    }

    /// HTTP status a server would answer with for this error
    pub fn status_code(&self) -> u16 {
        match self {
            FormError::UnknownContentEncoding(_) => 415,
            FormError::TooManyParts(_) | FormError::PayloadTooLarge(_) => 413,
            FormError::BadRequest(_) => 400,
            e if e.is_parse_error() => 400,
            _ => 500,
        }
    }
}
