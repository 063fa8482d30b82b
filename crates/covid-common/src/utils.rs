//! Shared time formatting helpers.

use chrono::{DateTime, Utc};

/// Format used by HTTP `Date` headers (RFC 7231 IMF-fixdate).
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Formats a timestamp for display.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Formats a timestamp the way an HTTP server formats its `Date` header.
///
/// Used as the freshness label when a response carries no `Date` header, so
/// labels look the same regardless of where they came from.
pub fn format_http_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format(HTTP_DATE_FORMAT).to_string()
}
