//! Default configuration values.

use crate::schema::*;

/// Upstream per-country daily dataset.
pub const DEFAULT_SOURCE_URL: &str = "https://covid.ourworldindata.org/data/full_data.csv";

/// Request timeout for a single download.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Six hours between refreshes.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 6 * 60 * 60;

/// Listen address of the JSON API.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            refresh: RefreshConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: concat!("covid-stats/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}
