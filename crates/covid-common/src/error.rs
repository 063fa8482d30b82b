//! Application-wide error type using thiserror.

use thiserror::Error;

/// Boxed source error carried by [`CovidError`] variants.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for covid-stats operations.
pub type Result<T> = std::result::Result<T, CovidError>;

/// Main error type for process-level operations (startup, configuration, serving).
///
/// Data ingestion has its own taxonomy in `covid_data::IngestError`; failures
/// there are recovered by the refresher and never reach this type.
#[derive(Error, Debug)]
pub enum CovidError {
    /// Configuration related errors.
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxedSource>,
    },

    /// I/O related errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network setup errors (HTTP client construction, socket binding).
    #[error("Network error: {message}")]
    Network {
        /// Human readable description.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxedSource>,
    },

    /// Validation errors for a single configuration or input field.
    #[error("Validation error: {message}")]
    Validation {
        /// Human readable description.
        message: String,
        /// Name of the offending field.
        field: Option<String>,
    },
}

impl CovidError {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source.
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new network error with source.
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a validation error for a named field.
    pub fn validation(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Returns the field name for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}
