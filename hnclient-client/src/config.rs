//! Client configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via HNCLIENT_CONFIG or --config)
//! 3. Environment variables

use crate::session::{SessionConfig, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network configuration.
    pub network: NetworkConfig,
    /// Polling configuration.
    pub polling: PollingConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable
    /// overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("HNCLIENT_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        self.network.apply_env_overrides();
        self.polling.apply_env_overrides();
    }

    /// Builds the session driver settings this configuration describes.
    pub fn session(&self) -> SessionConfig {
        let mut session = SessionConfig::new(self.network.port)
            .with_poll_interval(Duration::from_millis(self.polling.interval_ms))
            .with_max_poll_attempts(self.polling.max_attempts);
        if let Some(secs) = self.polling.deadline_secs {
            session = session.with_deadline(Duration::from_secs(secs));
        }
        session
    }
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Gateway port on the loopback interface.
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: hnclient_protocol::DEFAULT_PORT,
        }
    }
}

impl NetworkConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("HNCLIENT_PORT") {
            if let Ok(parsed) = port.parse() {
                self.port = parsed;
            }
        }
    }
}

/// Polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Milliseconds between availability polls.
    pub interval_ms: u64,
    /// Poll budget per wait point.
    pub max_attempts: u32,
    /// Optional overall deadline per exchange, in seconds.
    pub deadline_secs: Option<u64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            deadline_secs: None,
        }
    }
}

impl PollingConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(interval) = std::env::var("HNCLIENT_POLL_INTERVAL_MS") {
            if let Ok(parsed) = interval.parse() {
                self.interval_ms = parsed;
            }
        }
        if let Ok(attempts) = std::env::var("HNCLIENT_MAX_POLL_ATTEMPTS") {
            if let Ok(parsed) = attempts.parse() {
                self.max_attempts = parsed;
            }
        }
        if let Ok(deadline) = std::env::var("HNCLIENT_DEADLINE_SECS") {
            if let Ok(parsed) = deadline.parse() {
                self.deadline_secs = Some(parsed);
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(_, e) => Some(e),
            ConfigError::ParseError(_, _) => None,
        }
    }
}
