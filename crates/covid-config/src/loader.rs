//! Configuration loading from TOML files with environment variable overrides.

use crate::schema::Config;
use covid_common::CovidError;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "COVID_CONFIG_PATH";

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file {path}: {source}")]
    IoError {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Invalid value for {field}: {message}")]
    Validation {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        /// Variable name.
        var: String,
        /// Parse failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for CovidError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, message } => Self::validation(field, message),
            other => Self::config_with_source("Failed to load configuration", other),
        }
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file with environment variable overrides
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed, an override is malformed,
    /// or the result does not validate.
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loading configuration from {}", path.display());

        let mut config = Self::parse_toml(&content)?;
        Self::apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from the explicit path, `COVID_CONFIG_PATH`, or
    /// `config.toml`, falling back to defaults when none exists.
    ///
    /// # Errors
    ///
    /// See [`ConfigLoader::load_config`].
    pub fn load(explicit_path: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(path) = explicit_path {
            return Self::load_config(path);
        }

        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            return Self::load_config(path);
        }

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::load_config(DEFAULT_CONFIG_FILE);
        }

        debug!("No configuration file found, using defaults");
        let mut config = Config::default();
        Self::apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; missing sections and keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] on malformed TOML.
    pub fn parse_toml(content: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides(config, |key| env::var(key).ok())
    }

    /// Apply overrides read through `lookup`, keyed by environment variable name.
    pub(crate) fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("COVID_SOURCE_URL") {
            config.source.url = url;
        }

        if let Some(timeout) = lookup("COVID_FETCH_TIMEOUT_SECS") {
            config.source.timeout_secs = parse_env("COVID_FETCH_TIMEOUT_SECS", &timeout)?;
        }

        if let Some(interval) = lookup("COVID_REFRESH_INTERVAL_SECS") {
            config.refresh.interval_secs = parse_env("COVID_REFRESH_INTERVAL_SECS", &interval)?;
        }

        if let Some(bind_addr) = lookup("COVID_BIND_ADDR") {
            config.server.bind_addr = bind_addr;
        }

        if let Some(level) = lookup("COVID_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(())
    }
}

fn parse_env(var: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::EnvParseError {
            var: var.to_string(),
            source: Box::new(e),
        })
}
