/// # formwire
///
/// A byte-exact decoder for `multipart/form-data` bodies.
///
/// The library entry points are [`multipart::parse`] for a raw body plus
/// boundary, and [`request::parse_from_request`] for a request carrying a
/// `Content-Type` header. Content-Transfer-Encoding decoding is pluggable
/// through [`codec::CodecRegistry`]. The `run` function drives the `formwire`
/// inspection binary.
pub mod boundary;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod multipart;
pub mod request;

pub use boundary::extract_boundary;
pub use codec::{Codec, CodecError, CodecFactory, CodecRegistry};
pub use error::FormError;
pub use multipart::{Headers, Multipart, MultipartConfig, Part, parse, parse_with};
pub use request::{Request, parse_from_request, parse_from_request_with};

use crate::cli::Cli;
use crate::config::Config;
use clap::Parser;
use log::error;
use std::fs::File;
use std::io::BufReader;

const PREVIEW_CHARS: usize = 40;

/// Initializes the logger, parses command-line arguments, and decodes the input.
///
/// Exits the process with status 1 on configuration or parse errors.
pub fn run() {
    let cli = Cli::parse();

    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let log_level = if config.verbose { "debug" } else { "warn" };
    if std::env::var("RUST_LOG").is_err() {
        // SAFETY: runs before any other thread is spawned
        unsafe { std::env::set_var("RUST_LOG", log_level) };
    }
    env_logger::init();

    log::debug!("Log level set to: {log_level}");

    if let Err(e) = cli.validate() {
        error!("Configuration validation error: {e}");
        std::process::exit(1);
    }

    match decode_input(&cli, &config) {
        Ok(form) => print!("{}", summarize(&form)),
        Err(e) => {
            error!("Failed to decode {}: {e} [{}]", cli.input.display(), e.code());
            std::process::exit(1);
        }
    }
}

fn decode_input(cli: &Cli, config: &Config) -> Result<Multipart, FormError> {
    let limits = config.multipart_config();
    let registry = CodecRegistry::global();

    if cli.request {
        let mut reader = BufReader::new(File::open(&cli.input)?);
        let request = Request::from_reader(&mut reader)?;
        return parse_from_request_with(&request, &limits, registry);
    }

    let boundary = match (&cli.boundary, &cli.content_type) {
        (Some(boundary), _) => boundary.as_bytes().to_vec(),
        (None, Some(content_type)) => extract_boundary(content_type)?,
        (None, None) => {
            return Err(FormError::InvalidConfiguration(
                "no boundary source given".to_string(),
            ));
        }
    };

    let body = std::fs::read(&cli.input)?;
    parse_with(&body, &boundary, &limits, registry)
}

/// One line per part: index, key, filename, content type, size and a preview
pub fn summarize(form: &Multipart) -> String {
    let mut out = format!("{} part(s)\n", form.len());

    for (index, part) in form.iter().enumerate() {
        let mut fields = vec![
            format!("#{index}"),
            format!("key={}", part.key.as_deref().unwrap_or("-")),
            format!("size={}", part.data.len()),
        ];
        if let Some(filename) = part.filename() {
            fields.push(format!("filename={filename}"));
        }
        if let Some(content_type) = part.content_type() {
            fields.push(format!("type={content_type}"));
        }
        fields.push(match part.text() {
            Some(text) => {
                let preview: String = text.chars().take(PREVIEW_CHARS).collect();
                let ellipsis = if text.chars().count() > PREVIEW_CHARS { "..." } else { "" };
                format!("text={preview:?}{ellipsis}")
            }
            None => "binary".to_string(),
        });
        out.push_str(&fields.join(" "));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize() {
        let body = b"--XYZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nhello\r\n--XYZ\r\nContent-Disposition: form-data; name=\"f\"; filename=\"x.bin\"\r\nContent-Type: application/octet-stream\r\n\r\n\xff\xfe\r\n--XYZ--";
        let form = parse(body, b"XYZ").unwrap();

        assert_eq!(
            summarize(&form),
            "2 part(s)\n\
             #0 key=a size=5 text=\"hello\"\n\
             #1 key=f size=2 filename=x.bin type=application/octet-stream binary\n"
        );
    }

    #[test]
    fn test_summarize_truncates_preview() {
        let value = "v".repeat(PREVIEW_CHARS + 5);
        let body = format!(
            "--XYZ\r\nContent-Disposition: form-data; name=\"long\"\r\n\r\n{value}\r\n--XYZ--"
        );
        let form = parse(body.as_bytes(), b"XYZ").unwrap();
        let summary = summarize(&form);

        assert!(summary.contains(&format!("text=\"{}\"...", "v".repeat(PREVIEW_CHARS))));
    }
}
