//! Remote dataset sources.

use crate::error::{IngestError, IngestResult};
use crate::parser::parse_dataset;
use crate::record::Dataset;
use async_trait::async_trait;
use chrono::Utc;
use covid_common::format_http_date;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// A freshly downloaded and parsed dataset with its freshness label.
#[derive(Debug, Clone)]
pub struct FetchedDataset {
    /// Parsed records.
    pub dataset: Dataset,
    /// Source-provided freshness label.
    pub label: String,
}

/// Somewhere a complete dataset can be fetched from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Downloads and parses one complete dataset.
    async fn fetch(&self) -> IngestResult<FetchedDataset>;
}

/// Downloads the CSV over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    /// Creates a source for `url` whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a fetch error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration, user_agent: &str) -> IngestResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| IngestError::fetch_with_source("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl DatasetSource for HttpSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> IngestResult<FetchedDataset> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| transport_error(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Source answered with unsuccessful status");
            return Err(IngestError::fetch_with_status(
                format!("Status {status} when downloading CSV file from {}", self.url),
                status.as_u16(),
            ));
        }
        info!("GET {} {}", self.url, status);

        // The server's clock, not ours, says how fresh the file is.
        let label = response
            .headers()
            .get(header::DATE)
            .and_then(|value| value.to_str().ok())
            .map_or_else(|| format_http_date(Utc::now()), str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&self.url, e))?;
        debug!(bytes = body.len(), "Downloaded CSV body");

        let dataset = tokio::task::spawn_blocking(move || parse_dataset(body.as_ref()))
            .await
            .map_err(|e| IngestError::fetch_with_source("CSV parse task failed", e))??;

        Ok(FetchedDataset { dataset, label })
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> IngestError {
    let message = if err.is_timeout() {
        format!("Timed out downloading {url}")
    } else if err.is_connect() {
        format!("Could not connect to {url}")
    } else {
        format!("Failed to download {url}")
    };
    IngestError::fetch_with_source(message, err)
}
