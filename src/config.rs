//! Configuration management
//!
//! Provides configuration file support with TOML format, environment
//! variable overrides, and sensible defaults. The core consumes the
//! source file path and the polling interval from here; it has no
//! file-discovery logic of its own.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Source file configuration
    #[serde(default)]
    pub source: SourceConfig,

    /// File watcher configuration
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Monitoring and observability
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Source file configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Path to the delimited temperature measurements file
    #[serde(default = "default_source_path")]
    pub path: PathBuf,

    /// Field delimiter within one record line
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

/// File watcher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatcherConfig {
    /// Seconds between change checks
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Enable the background watcher
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl WatcherConfig {
    /// Polling period as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Monitoring configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_source_path() -> PathBuf {
    PathBuf::from("data/temperatures.csv")
}
fn default_delimiter() -> char {
    ';'
}
fn default_poll_interval_secs() -> u64 {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            source: SourceConfig::default(),
            watcher: WatcherConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
            delimiter: default_delimiter(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            enabled: true,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {}: {}", path, e))
        })?;

        toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!("Failed to parse config file {}: {}", path, e))
        })
    }

    /// Load configuration from a TOML file with environment overrides
    pub fn from_file_with_env(path: &str) -> Result<Self, Error> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("CITYTEMP_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("CITYTEMP_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(path) = std::env::var("CITYTEMP_SOURCE_PATH") {
            self.source.path = PathBuf::from(path);
        }
        if let Ok(interval) = std::env::var("CITYTEMP_POLL_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse() {
                self.watcher.poll_interval_secs = secs;
            }
        }
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            self.monitoring.log_level = log_level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), Error> {
        if self.server.port == 0 {
            return Err(Error::Configuration("Server port cannot be 0".to_string()));
        }

        if self.source.path.as_os_str().is_empty() {
            return Err(Error::Configuration(
                "Source file path cannot be empty".to_string(),
            ));
        }

        if self.watcher.poll_interval_secs == 0 {
            return Err(Error::Configuration(
                "Watcher poll interval must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
