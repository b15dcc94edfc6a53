//! Content-Transfer-Encoding codecs and the name-keyed registry used to find them.
//!
//! The parser only ever asks two things of this module: "is there a factory
//! registered under this exact encoding name?" and "decode these bytes". Anything
//! that implements [`CodecFactory`] can be registered, including plain closures:
//!
//! ```rust
//! use formwire::codec::{Codec, CodecError, CodecRegistry};
//! use formwire::multipart::Headers;
//!
//! struct Upper;
//!
//! impl Codec for Upper {
//!     fn decode(&mut self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
//!         Ok(data.to_ascii_uppercase())
//!     }
//! }
//!
//! let mut registry = CodecRegistry::new();
//! registry.register("x-upper", |_: &Headers| Box::new(Upper) as Box<dyn Codec>);
//! assert!(registry.contains("x-upper"));
//! ```

use crate::multipart::Headers;
use base64::Engine;
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Error type codecs report; surfaced to callers unchanged.
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// Decodes the raw content of a single part.
pub trait Codec {
    fn decode(&mut self, data: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// Builds a codec instance for one part, given that part's full header set.
pub trait CodecFactory: Send + Sync {
    fn construct(&self, headers: &Headers) -> Box<dyn Codec>;
}

impl<F> CodecFactory for F
where
    F: Fn(&Headers) -> Box<dyn Codec> + Send + Sync,
{
    fn construct(&self, headers: &Headers) -> Box<dyn Codec> {
        self(headers)
    }
}

/// Passes content through unchanged (`binary`, `7bit`, `8bit`)
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityCodec;

impl Codec for IdentityCodec {
    fn decode(&mut self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }
}

/// RFC 2045 base64. Line breaks and other ASCII whitespace inserted by the
/// sender are ignored before decoding.
#[derive(Debug, Default, Clone, Copy)]
pub struct Base64Codec;

impl Codec for Base64Codec {
    fn decode(&mut self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let compact: Vec<u8> = data
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        let decoded = base64::engine::general_purpose::STANDARD.decode(compact)?;
        Ok(decoded)
    }
}

/// RFC 2045 quoted-printable, including `=` soft line breaks.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuotedPrintableCodec;

#[derive(Debug)]
pub struct QuotedPrintableError {
    pub offset: usize,
}

impl fmt::Display for QuotedPrintableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid quoted-printable escape at byte {}", self.offset)
    }
}

impl std::error::Error for QuotedPrintableError {}

impl Codec for QuotedPrintableCodec {
    fn decode(&mut self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(data.len());
        let mut i = 0;
        while i < data.len() {
            if data[i] != b'=' {
                out.push(data[i]);
                i += 1;
                continue;
            }

            let rest = &data[i + 1..];
            if rest.starts_with(b"\r\n") {
                i += 3;
            } else if rest.starts_with(b"\n") {
                i += 2;
            } else if rest.len() >= 2 {
                match (hex_value(rest[0]), hex_value(rest[1])) {
                    (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
                    _ => return Err(Box::new(QuotedPrintableError { offset: i })),
                }
                i += 3;
            } else {
                return Err(Box::new(QuotedPrintableError { offset: i }));
            }
        }
        Ok(out)
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

/// Name-keyed set of codec factories.
///
/// Lookups are exact: the registry is keyed by the literal
/// `Content-Transfer-Encoding` value, so `Base64` and `base64` are distinct
/// names unless both are registered.
pub struct CodecRegistry {
    factories: HashMap<String, Box<dyn CodecFactory>>,
}

impl CodecRegistry {
    /// Registry with the built-in codecs installed
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for name in ["binary", "7bit", "8bit"] {
            registry.register(name, |_: &Headers| Box::new(IdentityCodec) as Box<dyn Codec>);
        }
        registry.register("base64", |_: &Headers| Box::new(Base64Codec) as Box<dyn Codec>);
        registry.register("quoted-printable", |_: &Headers| {
            Box::new(QuotedPrintableCodec) as Box<dyn Codec>
        });
        registry
    }

    /// Registry with nothing registered
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Process-wide default registry. Never mutated after first use.
    pub fn global() -> &'static CodecRegistry {
        static GLOBAL: OnceLock<CodecRegistry> = OnceLock::new();
        GLOBAL.get_or_init(CodecRegistry::new)
    }

    /// Register (or replace) the factory for an encoding name
    pub fn register<S, F>(&mut self, name: S, factory: F)
    where
        S: Into<String>,
        F: CodecFactory + 'static,
    {
        let name = name.into();
        debug!("Registering content-transfer-encoding codec '{name}'");
        self.factories.insert(name, Box::new(factory));
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn CodecFactory> {
        self.factories.get(name).map(|factory| factory.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered encoding names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("names", &self.names())
            .finish()
    }
}
