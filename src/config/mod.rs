//! Configuration system for simplevi
//!
//! Loads settings from ~/.config/simplevi/config.toml, or from the file
//! given with `--config`.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::editor::Limits;

/// Main settings structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub editor: EditorSettings,
    pub log: LogSettings,
}

/// Editor behavior settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Maximum number of lines in the buffer (default: 1000)
    pub max_lines: usize,
    /// Maximum buffer size in bytes (default: 8192)
    pub max_bytes: usize,
    /// Byte the terminal sends for the erase key (default: 127, DEL)
    pub erase_char: u8,
    /// Exit the editor when `:w` cannot write its file (default: false)
    pub fatal_write_errors: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            max_lines: limits.max_lines,
            max_bytes: limits.max_bytes,
            erase_char: 0x7f,
            fatal_write_errors: false,
        }
    }
}

impl EditorSettings {
    pub fn limits(&self) -> Limits {
        Limits {
            max_lines: self.max_lines.max(1),
            max_bytes: self.max_bytes,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log file (default: <cache dir>/simplevi/simplevi.log)
    pub file: Option<PathBuf>,
    /// Filter directive, e.g. "warn" or "simplevi=debug" (default: "warn")
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: None,
            level: "warn".to_string(),
        }
    }
}

impl LogSettings {
    /// Configured log file, falling back to the user cache directory
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join("simplevi").join("simplevi.log")))
    }
}

/// Get the default config file path
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("simplevi").join("config.toml"))
}

/// Load settings.
///
/// An explicit path must exist. Without one, a missing default config file
/// means default settings.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Settings> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Settings::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_settings(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Parse settings from TOML text
pub fn parse_settings(content: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str(content)?)
}
