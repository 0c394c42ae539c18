//! Editor configuration.
//!
//! A single JSON file, loaded from `--config` or the platform config
//! directory. Every field has a default so a missing or partial file works.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Prediction service settings
    #[serde(default)]
    pub service: ServiceConfig,

    /// Suggestion popup geometry
    #[serde(default)]
    pub popup: PopupConfig,
}

/// Prediction service configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServiceConfig {
    /// Endpoint receiving continuation requests
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Locale sent with every request (e.g. "en_US")
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            locale: default_locale(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Suggestion popup configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PopupConfig {
    /// Popup width in terminal columns (including the border)
    #[serde(default = "default_popup_width")]
    pub width: u16,

    /// Maximum number of candidate rows shown at once
    #[serde(default = "default_popup_rows")]
    pub max_rows: u16,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            width: default_popup_width(),
            max_rows: default_popup_rows(),
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8080/continuations".to_string()
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_popup_width() -> u16 {
    28
}

fn default_popup_rows() -> u16 {
    6
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "IO error: {msg}"),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load a config file, falling back to defaults if it doesn't exist.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok(config)
    }

    /// Default config file location under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("betterguess").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(
            config.service.endpoint,
            "http://127.0.0.1:8080/continuations"
        );
        assert_eq!(config.service.locale, "en_US");
        assert_eq!(config.service.timeout_secs, 5);
        assert!(config.popup.max_rows > 0);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"service": {"locale": "de_DE"}}"#).unwrap();
        assert_eq!(config.service.locale, "de_DE");
        assert_eq!(
            config.service.endpoint,
            "http://127.0.0.1:8080/continuations"
        );
        assert_eq!(config.popup.width, PopupConfig::default().width);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.service.timeout_secs, 5);
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut original = Config::default();
        original.service.endpoint = "http://localhost:9999/continuations".to_string();
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(serde_json::to_string_pretty(&original).unwrap().as_bytes())
            .unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.service.endpoint, original.service.endpoint);
    }

    #[test]
    fn test_load_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        match Config::load(&path) {
            Err(ConfigError::ParseError(msg)) => assert!(msg.contains("config.json")),
            other => panic!("Expected parse error, got {other:?}"),
        }
    }
}
