//! Configuration for fuzzywash
//!
//! Supports:
//! - TOML configuration files
//! - Environment variable overrides
//! - Multiple config file locations
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./fuzzywash.toml` - Project-local configuration
//! 2. `~/.config/fuzzywash/config.toml` - User configuration (XDG)
//! 3. `~/.fuzzywash/config.toml` - User configuration (legacy)
//! 4. `/etc/fuzzywash/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `FUZZYWASH_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `FUZZYWASH_FORMAT` - CLI output format (text, json)
//! - `FUZZYWASH_CLAMP` - Input clamping (upper, symmetric)
//! - `FUZZYWASH_DEFUZZ` - Defuzzification (centroid, bisector, mom, som, lom)
//! - `FUZZYWASH_FALLBACK` - Zero-mass fallback (midpoint, minimum, maximum)
//! - `FUZZYWASH_HOST` - HTTP bind host
//! - `FUZZYWASH_PORT` - HTTP port
//!
//! Unrecognised values in environment variables are ignored.
//!
//! # Example Configuration
//!
//! ```toml
//! # fuzzywash.toml
//!
//! [general]
//! log_level = "normal"
//! format = "text"
//!
//! [engine]
//! clamp = "upper"
//! defuzzification = "centroid"
//! fallback = "midpoint"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//! cors_enabled = true
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fuzzy::{ClampPolicy, DefuzzificationMethod, Fallback, InferenceEngine};

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WashConfig {
    pub general: GeneralConfig,
    /// Inference options
    pub engine: EngineConfig,
    /// HTTP server settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level
    pub log_level: LogLevel,
    /// CLI output format
    pub format: OutputFormat,
}

/// Inference engine options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub clamp: ClampPolicy,
    pub defuzzification: DefuzzificationMethod,
    /// Value reported for an output no rule fired for
    pub fallback: Fallback,
}

impl EngineConfig {
    pub fn to_engine(&self) -> InferenceEngine {
        InferenceEngine::new()
            .with_clamp(self.clamp)
            .with_defuzzification(self.defuzzification)
            .with_fallback(self.fallback)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Permissive CORS for browser front-ends
    pub cors_enabled: bool,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_enabled: true,
            max_body_size: 1024 * 1024, // 1 MB
        }
    }
}

// ============================================================================
// Enums
// ============================================================================

/// CLI output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl WashConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the first existing default location, then
    /// apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for path in Self::config_paths() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<string>"), e.to_string()))
    }

    /// Config file search paths, highest priority first
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./fuzzywash.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("fuzzywash").join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".fuzzywash").join("config.toml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/fuzzywash/config.toml"));

        paths
    }

    /// Apply `FUZZYWASH_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("FUZZYWASH_LOG_LEVEL").and_then(|v| LogLevel::from_str(&v)) {
            self.general.log_level = level;
        }
        if let Some(format) = lookup("FUZZYWASH_FORMAT").and_then(|v| OutputFormat::from_str(&v)) {
            self.general.format = format;
        }
        if let Some(clamp) = lookup("FUZZYWASH_CLAMP").and_then(|v| ClampPolicy::from_str(&v)) {
            self.engine.clamp = clamp;
        }
        if let Some(method) =
            lookup("FUZZYWASH_DEFUZZ").and_then(|v| DefuzzificationMethod::from_str(&v))
        {
            self.engine.defuzzification = method;
        }
        if let Some(fallback) = lookup("FUZZYWASH_FALLBACK").and_then(|v| Fallback::from_str(&v)) {
            self.engine.fallback = fallback;
        }
        if let Some(host) = lookup("FUZZYWASH_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("FUZZYWASH_PORT").and_then(|v| v.parse::<u16>().ok()) {
            self.server.port = port;
        }
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Write configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        fs::write(path, content)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))
    }

    /// Commented default configuration, as written by `config --init`
    pub fn default_config_content() -> &'static str {
        r#"# fuzzywash configuration

[general]
# Logging level: quiet, normal, verbose, debug
log_level = "normal"
# CLI output format: text, json
format = "text"

[engine]
# Input clamping: upper (cap at the universe maximum only), symmetric
clamp = "upper"
# Defuzzification: centroid, bisector, mom, som, lom
defuzzification = "centroid"
# Value used when no rule fires for an output: midpoint, minimum, maximum
fallback = "midpoint"

[server]
host = "0.0.0.0"
port = 8000
# Enable CORS for browser access
cors_enabled = true
# Maximum request body size (bytes)
max_body_size = 1048576
"#
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {1}", .0.display())]
    IoError(PathBuf, String),
    #[error("Parse error in {}: {1}", .0.display())]
    ParseError(PathBuf, String),
    #[error("Serialization error: {0}")]
    SerializeError(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = WashConfig::new();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.general.format, OutputFormat::Text);
        assert_eq!(config.engine.clamp, ClampPolicy::Upper);
        assert_eq!(config.engine.to_engine(), InferenceEngine::default());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [general]
            format = "json"
            log_level = "verbose"

            [engine]
            clamp = "symmetric"
            fallback = "minimum"

            [server]
            port = 9000
        "#;

        let config = WashConfig::load_from_str(toml).unwrap();
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.general.log_level, LogLevel::Verbose);
        assert_eq!(config.engine.clamp, ClampPolicy::Symmetric);
        assert_eq!(config.engine.fallback, Fallback::Minimum);
        assert_eq!(config.engine.defuzzification, DefuzzificationMethod::Centroid);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_default_content_parses_to_defaults() {
        let config = WashConfig::load_from_str(WashConfig::default_config_content()).unwrap();
        assert_eq!(config, WashConfig::default());
    }

    #[test]
    fn test_unknown_enum_value_is_parse_error() {
        let err = WashConfig::load_from_str("[engine]\nclamp = \"sideways\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(..)));
        assert!(err.to_string().starts_with("Parse error in <string>"));
    }

    #[test]
    fn test_overrides() {
        let vars = HashMap::from([
            ("FUZZYWASH_LOG_LEVEL", "debug"),
            ("FUZZYWASH_CLAMP", "symmetric"),
            ("FUZZYWASH_DEFUZZ", "bisector"),
            ("FUZZYWASH_PORT", "9100"),
            ("FUZZYWASH_FALLBACK", "nonsense"),
        ]);
        let mut config = WashConfig::new();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.general.log_level, LogLevel::Debug);
        assert_eq!(config.engine.clamp, ClampPolicy::Symmetric);
        assert_eq!(config.engine.defuzzification, DefuzzificationMethod::Bisector);
        assert_eq!(config.server.port, 9100);
        // unrecognised values leave the setting alone
        assert_eq!(config.engine.fallback, Fallback::Midpoint);
    }

    #[test]
    fn test_serialize_config() {
        let toml = WashConfig::new().to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[engine]"));
        assert!(toml.contains("[server]"));
        assert!(toml.contains("clamp = \"upper\""));
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!("fuzzywash-{}.toml", std::process::id()));
        let mut config = WashConfig::default();
        config.engine.clamp = ClampPolicy::Symmetric;
        config.server.port = 9200;

        config.save_to_file(&path).unwrap();
        let loaded = WashConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.engine.clamp, ClampPolicy::Symmetric);
        assert_eq!(loaded.server.port, 9200);
    }

    #[test]
    fn test_config_paths() {
        let paths = WashConfig::config_paths();
        assert!(paths[0].ends_with("fuzzywash.toml"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = WashConfig::load_from_file(Path::new("/nonexistent/fuzzywash.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(..)));
    }

    #[test]
    fn test_format_and_level_from_str() {
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("yaml"), None);
        assert_eq!(LogLevel::from_str("v"), Some(LogLevel::Verbose));
        assert_eq!(LogLevel::from_str("loud"), None);
    }
}
