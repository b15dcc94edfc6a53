//! Configuration for the formwire binary
//! Resolves settings with precedence: CLI > ENV > INI file > defaults

pub mod ini_parser;

use crate::cli::Cli;
use crate::multipart::MultipartConfig;
use ini_parser::{IniConfig, parse_size};
use std::path::{Path, PathBuf};

pub const ENV_MAX_PARTS: &str = "FORMWIRE_MAX_PARTS";
pub const ENV_MAX_PART_SIZE: &str = "FORMWIRE_MAX_PART_SIZE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // Limit settings
    pub max_parts: usize,
    pub max_part_size: u64,

    // Logging settings
    pub verbose: bool,

    /// Where the INI settings came from, if anywhere
    pub source: Option<PathBuf>,
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self, String> {
        let source = Self::find_config_file(cli)?;
        let ini = match &source {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                IniConfig::load_file(path)?
            }
            None => {
                log::info!("No configuration file found, using defaults and CLI overrides");
                IniConfig::new()
            }
        };

        Self::resolve(cli, &ini, |name| std::env::var(name).ok(), source)
    }

    /// Apply the precedence rules to already-loaded sources
    pub fn resolve<F>(
        cli: &Cli,
        ini: &IniConfig,
        env: F,
        source: Option<PathBuf>,
    ) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = MultipartConfig::default();

        let max_parts = match cli.max_parts {
            Some(parts) => parts,
            None => match env(ENV_MAX_PARTS) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| format!("{ENV_MAX_PARTS} must be a number, got '{raw}'"))?,
                None => ini
                    .get_usize("limits", "max_parts")
                    .unwrap_or(defaults.max_parts),
            },
        };

        let max_part_size = match cli.max_part_size {
            Some(size) => size,
            None => match env(ENV_MAX_PART_SIZE) {
                Some(raw) => parse_size(&raw)
                    .ok_or_else(|| format!("{ENV_MAX_PART_SIZE} must be a size, got '{raw}'"))?,
                None => ini
                    .get_size("limits", "max_part_size")
                    .unwrap_or(defaults.max_part_size),
            },
        };

        if max_parts == 0 {
            return Err("max_parts must be greater than 0".to_string());
        }

        Ok(Self {
            max_parts,
            max_part_size,
            verbose: cli.verbose || ini.get_bool("logging", "verbose").unwrap_or(false),
            source,
        })
    }

    /// Find configuration file in order of preference
    fn find_config_file(cli: &Cli) -> Result<Option<PathBuf>, String> {
        if let Some(ref config_path) = cli.config_file {
            if config_path.is_file() {
                return Ok(Some(config_path.clone()));
            }
            return Err(format!(
                "Config file specified but not found: {}",
                config_path.display()
            ));
        }

        let current_config = PathBuf::from("formwire.ini");
        if current_config.is_file() {
            return Ok(Some(current_config));
        }

        if let Some(home_dir) = std::env::var_os("HOME") {
            let user_config = Path::new(&home_dir)
                .join(".config")
                .join("formwire")
                .join("config.ini");
            if user_config.is_file() {
                return Ok(Some(user_config));
            }
        }

        Ok(None)
    }

    pub fn multipart_config(&self) -> MultipartConfig {
        MultipartConfig {
            max_parts: self.max_parts,
            max_part_size: self.max_part_size,
        }
    }
}
