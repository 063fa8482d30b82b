//! Configuration schema definitions using serde.

use crate::loader::ConfigError;
use crate::validator::ConfigValidator;
use covid_common::{LogFormat, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

/// Main configuration structure for covid-stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote data source configuration.
    pub source: SourceConfig,
    /// Background refresh configuration.
    pub refresh: RefreshConfig,
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Remote CSV source configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// URL of the CSV dataset.
    pub url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// `User-Agent` header sent with each request.
    pub user_agent: String,
}

/// Refresh scheduling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between the start of two refresh cycles.
    pub interval_secs: u64,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on, e.g. `0.0.0.0:8080`.
    pub bind_addr: String,
}

/// Logging configuration as it appears in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter directive.
    pub level: String,
    /// One of `pretty`, `compact` or `json`.
    pub format: String,
    /// Optional log file; logs go to stdout when unset.
    pub file_path: Option<String>,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigValidator::validate(self)
    }

    /// Builds the logging setup described by the `[logging]` section.
    ///
    /// # Errors
    ///
    /// Returns an error if the log format is unknown.
    pub fn logging_config(&self) -> Result<LoggingConfig, ConfigError> {
        let format: LogFormat = self
            .logging
            .format
            .parse()
            .map_err(|e: covid_common::CovidError| ConfigError::Validation {
                field: "logging.format".to_string(),
                message: e.to_string(),
            })?;

        Ok(LoggingConfig {
            level: self.logging.level.clone(),
            format,
            file_path: self.logging.file_path.clone(),
            ..LoggingConfig::default()
        })
    }
}

impl SourceConfig {
    /// Request timeout as a [`Duration`].
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RefreshConfig {
    /// Refresh interval as a [`Duration`].
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl ServerConfig {
    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns an error if `bind_addr` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Validation {
                field: "server.bind_addr".to_string(),
                message: format!("{:?} is not a socket address: {e}", self.bind_addr),
            })
    }
}
