//! Runtime validation of a loaded configuration.

use crate::loader::ConfigError;
use crate::schema::Config;
use covid_common::LogFormat;
use url::Url;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::Validation`] naming the first invalid field.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_source_url(&config.source.url)?;

        if config.source.timeout_secs == 0 {
            return Err(invalid("source.timeout_secs", "must be greater than 0"));
        }

        if config.refresh.interval_secs == 0 {
            return Err(invalid("refresh.interval_secs", "must be greater than 0"));
        }

        config.server.socket_addr()?;

        if config.logging.level.trim().is_empty() {
            return Err(invalid("logging.level", "cannot be empty"));
        }

        config
            .logging
            .format
            .parse::<LogFormat>()
            .map_err(|e| invalid("logging.format", e.to_string()))?;

        Ok(())
    }

    fn validate_source_url(raw: &str) -> Result<(), ConfigError> {
        let url = Url::parse(raw)
            .map_err(|e| invalid("source.url", format!("{raw:?} is not a valid URL: {e}")))?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(invalid(
                "source.url",
                format!("unsupported scheme {other:?}, expected http or https"),
            )),
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        message: message.into(),
    }
}
