//! Small INI reader for the formwire configuration file
//! Handles `[section]` headers, `key = value` pairs and `#` / `;` comments

use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct IniConfig {
    // Keys outside any section live under ""
    sections: HashMap<String, HashMap<String, String>>,
}

impl IniConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let mut config = Self::new();
        let mut section = String::new();

        for (index, raw_line) in content.lines().enumerate() {
            let line_number = index + 1;
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }

            if let Some(name) = line.strip_prefix('[') {
                let name = name
                    .strip_suffix(']')
                    .ok_or_else(|| format!("Unclosed section header at line {line_number}"))?
                    .trim();
                if name.is_empty() {
                    return Err(format!("Empty section name at line {line_number}"));
                }
                section = name.to_lowercase();
                config.sections.entry(section.clone()).or_default();
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| format!("Expected key = value at line {line_number}: {line}"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("Empty key at line {line_number}"));
            }

            config
                .sections
                .entry(section.clone())
                .or_default()
                .insert(key.to_lowercase(), value.trim().to_string());
        }

        Ok(config)
    }

    pub fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.sections
            .get(&section.to_lowercase())?
            .get(&key.to_lowercase())
            .cloned()
    }

    pub fn get_usize(&self, section: &str, key: &str) -> Option<usize> {
        self.get_string(section, key)?.parse().ok()
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        match self.get_string(section, key)?.to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => None,
        }
    }

    /// Size value such as `1024`, `64KB` or `1.5GB`
    pub fn get_size(&self, section: &str, key: &str) -> Option<u64> {
        parse_size(&self.get_string(section, key)?)
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find(['#', ';']) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Parse byte sizes with optional `B`, `KB`, `MB`, `GB` or `TB` suffix
pub fn parse_size(value: &str) -> Option<u64> {
    let value = value.trim().to_uppercase();
    if let Ok(bytes) = value.parse::<u64>() {
        return Some(bytes);
    }

    const UNITS: [(&str, u64); 5] = [
        ("TB", 1024 * 1024 * 1024 * 1024),
        ("GB", 1024 * 1024 * 1024),
        ("MB", 1024 * 1024),
        ("KB", 1024),
        ("B", 1),
    ];

    let (number, multiplier) = UNITS
        .iter()
        .find_map(|(suffix, multiplier)| value.strip_suffix(suffix).map(|n| (n, *multiplier)))?;
    let number = number.trim();

    if let Ok(whole) = number.parse::<u64>() {
        return whole.checked_mul(multiplier);
    }
    number
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| (n * multiplier as f64) as u64)
}
