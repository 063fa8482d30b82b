//! Application-wide error types using thiserror.

use covid_common::CovidError;
use covid_config::ConfigError;
use covid_data::IngestError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    /// Configuration or startup error.
    #[error("Configuration error: {0}")]
    Config(#[from] CovidError),

    /// I/O error, e.g. the listener could not bind.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data source could not be set up.
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),
}

impl From<ConfigError> for ServerError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.into())
    }
}

/// Result type for the server application.
pub type ServerResult<T> = Result<T, ServerError>;
