//! Configuration management for session-ctx.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cell::WritePolicy;
use crate::cli::Args;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local storage configuration.
    pub storage: StorageSection,
    /// Auth API configuration.
    pub auth: AuthSection,
    /// Background persistence configuration.
    pub persistence: PersistenceSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Local storage section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Path of the JSON document holding persisted keys.
    pub path: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("session-ctx.json"),
        }
    }
}

/// Auth API section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Base URL of the API (the `/auth/docente` prefix is appended).
    pub api_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:3000".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Background persistence section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSection {
    /// Attempts per write, including the first.
    pub write_attempts: u32,
    /// Delay between attempts in milliseconds.
    pub write_backoff_ms: u64,
}

impl Default for PersistenceSection {
    fn default() -> Self {
        let policy = WritePolicy::default();
        Self {
            write_attempts: policy.attempts,
            write_backoff_ms: policy.backoff.as_millis() as u64,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("SESSION_CTX_STORAGE") {
            if !path.is_empty() {
                self.storage.path = PathBuf::from(path);
            }
        }

        if let Ok(url) = std::env::var("SESSION_CTX_API_URL") {
            if !url.is_empty() {
                self.auth.api_url = url;
            }
        } else if let Ok(url) = std::env::var("EXPO_PUBLIC_API_URL") {
            if !url.is_empty() {
                self.auth.api_url = url;
            }
        }

        if let Ok(level) = std::env::var("SESSION_CTX_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref path) = args.storage {
            self.storage.path = path.clone();
        }

        if let Some(ref url) = args.api_url {
            self.auth.api_url = url.clone();
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Reject values that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.auth.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(self.auth.api_url.clone()));
        }
        if self.auth.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("auth.timeout_secs", "0".into()));
        }
        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue("storage.path", String::new()));
        }
        Ok(())
    }

    /// Write policy for the session cell.
    pub fn write_policy(&self) -> WritePolicy {
        WritePolicy::default()
            .with_attempts(self.persistence.write_attempts)
            .with_backoff(Duration::from_millis(self.persistence.write_backoff_ms))
    }

    /// Auth request timeout.
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth.timeout_secs)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// API URL is not an http(s) URL.
    InvalidApiUrl(String),
    /// A field holds an unusable value.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidApiUrl(url) => write!(f, "invalid API URL: '{}'", url),
            Self::InvalidValue(field, value) => {
                write!(f, "invalid value for {}: '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
