//! Ingestion error taxonomy.

use thiserror::Error;

/// Result type alias for ingestion operations.
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Everything that can make a refresh cycle fail.
///
/// Parser variants carry the 1-based line number of the offending row in the
/// source stream.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Header row does not have exactly the six required columns.
    #[error("Schema error: {message}")]
    Schema {
        /// What is wrong with the header.
        message: String,
    },

    /// A data row has the wrong number of fields.
    #[error("Malformed row at line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        /// Source line.
        line: u64,
        /// Fields required by the schema.
        expected: usize,
        /// Fields present in the row.
        found: usize,
    },

    /// The `date` field is not a `YYYY-MM-DD` calendar date.
    #[error("Date format error at line {line}: could not parse {value:?} as YYYY-MM-DD")]
    DateFormat {
        /// Source line.
        line: u64,
        /// Offending field value.
        value: String,
        /// Underlying parse failure.
        #[source]
        source: chrono::ParseError,
    },

    /// A count field is neither empty nor an integer.
    #[error("Numeric field error at line {line}: could not parse {value:?} in column {column} as an integer")]
    NumericField {
        /// Source line.
        line: u64,
        /// Name of the offending column.
        column: &'static str,
        /// Offending field value.
        value: String,
        /// Underlying parse failure.
        #[source]
        source: std::num::ParseIntError,
    },

    /// The `location` field is empty.
    #[error("Missing location at line {line}")]
    MissingLocation {
        /// Source line.
        line: u64,
    },

    /// The input could not be tokenized into CSV rows.
    #[error("Stream format error: {message}")]
    StreamFormat {
        /// Human readable description.
        message: String,
        /// Underlying CSV reader error, if any.
        #[source]
        source: Option<csv::Error>,
    },

    /// The download itself failed: transport, timeout or non-2xx status.
    #[error("Fetch error: {message}")]
    Fetch {
        /// Human readable description.
        message: String,
        /// HTTP status code, when the server answered.
        status: Option<u16>,
        /// Underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl IngestError {
    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema {
            message: msg.into(),
        }
    }

    /// Create a stream format error without an underlying reader error.
    pub fn stream_format(msg: impl Into<String>) -> Self {
        Self::StreamFormat {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a fetch error.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch {
            message: msg.into(),
            status: None,
            source: None,
        }
    }

    /// Create a fetch error for an unsuccessful HTTP status.
    pub fn fetch_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Fetch {
            message: msg.into(),
            status: Some(status),
            source: None,
        }
    }

    /// Create a fetch error with source.
    pub fn fetch_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Fetch {
            message: msg.into(),
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Whether the failure happened while downloading rather than parsing.
    pub const fn is_fetch_error(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }

    /// HTTP status code of a fetch error, if the server answered.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Fetch { status, .. } => *status,
            _ => None,
        }
    }

    /// Short, stable name of the variant for structured logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "schema",
            Self::MalformedRow { .. } => "malformed_row",
            Self::DateFormat { .. } => "date_format",
            Self::NumericField { .. } => "numeric_field",
            Self::MissingLocation { .. } => "missing_location",
            Self::StreamFormat { .. } => "stream_format",
            Self::Fetch { .. } => "fetch",
        }
    }
}
