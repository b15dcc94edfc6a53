use crate::error::FormError;
use clap::Parser;
use std::path::PathBuf;

/// Command-line interface of the `formwire` inspection tool
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "formwire",
    version,
    about = "Decode a multipart/form-data body and print a summary of its parts."
)]
pub struct Cli {
    /// File holding the multipart body, or a whole HTTP request with --request
    pub input: PathBuf,

    /// Content-Type header value carrying the boundary parameter
    #[arg(long, conflicts_with_all = ["boundary", "request"])]
    pub content_type: Option<String>,

    /// Boundary token, without the leading dashes
    #[arg(short, long, conflicts_with = "request")]
    pub boundary: Option<String>,

    /// Treat the input as a raw HTTP/1.x request
    #[arg(short, long)]
    pub request: bool,

    /// Maximum number of parts accepted
    #[arg(long)]
    pub max_parts: Option<usize>,

    /// Maximum raw size per part, e.g. 4096, 512KB or 10MB
    #[arg(long, value_parser = parse_size_arg)]
    pub max_part_size: Option<u64>,

    /// Configuration file (INI). Defaults to ./formwire.ini or ~/.config/formwire/config.ini
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_size_arg(s: &str) -> Result<u64, String> {
    crate::config::ini_parser::parse_size(s)
        .ok_or_else(|| format!("'{s}' is not a size (try 4096, 512KB or 10MB)"))
}

impl Cli {
    /// Validate argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), FormError> {
        if !self.request && self.content_type.is_none() && self.boundary.is_none() {
            return Err(FormError::InvalidConfiguration(
                "one of --content-type, --boundary or --request is required".to_string(),
            ));
        }

        if matches!(self.boundary.as_deref(), Some("")) {
            return Err(FormError::InvalidConfiguration(
                "--boundary cannot be empty".to_string(),
            ));
        }

        if !self.input.is_file() {
            return Err(FormError::InvalidConfiguration(format!(
                "input is not a readable file: {}",
                self.input.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_size_arg() {
        assert_eq!(parse_size_arg("4096").unwrap(), 4096);
        assert_eq!(parse_size_arg("512KB").unwrap(), 512 * 1024);
        assert!(parse_size_arg("big").is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "formwire",
            "body.bin",
            "--boundary",
            "XYZ",
            "--max-part-size",
            "1MB",
        ])
        .unwrap();
        assert_eq!(cli.boundary.as_deref(), Some("XYZ"));
        assert_eq!(cli.max_part_size, Some(1024 * 1024));
        assert!(!cli.request);

        assert!(
            Cli::try_parse_from(["formwire", "req.http", "--request", "--boundary", "X"]).is_err()
        );
    }

    #[test]
    fn test_cli_validate() {
        let file = NamedTempFile::new().unwrap();
        let cli = Cli {
            input: file.path().to_path_buf(),
            boundary: Some("XYZ".to_string()),
            ..Default::default()
        };
        assert!(cli.validate().is_ok());

        let no_source = Cli {
            boundary: None,
            ..cli.clone()
        };
        assert!(no_source.validate().is_err());

        let empty_boundary = Cli {
            boundary: Some(String::new()),
            ..cli.clone()
        };
        assert!(empty_boundary.validate().is_err());

        let missing_input = Cli {
            input: PathBuf::from("/nonexistent/formwire/body.bin"),
            ..cli
        };
        assert!(missing_input.validate().is_err());
    }
}
