//! Test utilities and shared fixtures for covid-stats.
//!
//! Enabled for other crates through the `testing` feature. Provides logging
//! setup for tests and CSV fixtures in the upstream six-column schema.

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Header row of the upstream dataset.
pub const CSV_HEADER: &str = "date,location,new_cases,new_deaths,total_cases,total_deaths";

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        // Another test harness may already own the global subscriber.
        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Create a temporary directory for tests that automatically cleans up.
///
/// # Panics
///
/// Panics if the directory cannot be created.
#[cfg(feature = "tempfile")]
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// CSV fixtures in the upstream schema.
pub mod csv_fixtures {
    use super::CSV_HEADER;

    /// Joins the header and the given data rows into a CSV document.
    pub fn csv_with_rows(rows: &[&str]) -> String {
        let mut out = String::from(CSV_HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out.push('\n');
        out
    }

    /// A single Afghanistan row.
    pub fn afghanistan_one_day() -> String {
        csv_with_rows(&["2020-02-25,Afghanistan,1,2,3,4"])
    }

    /// Five consecutive days for the United Kingdom, 2020-03-09 to 2020-03-13.
    pub fn united_kingdom_five_days() -> String {
        csv_with_rows(&UK_ROWS)
    }

    /// The United Kingdom rows followed by two United States rows.
    pub fn two_countries() -> String {
        let mut rows = UK_ROWS.to_vec();
        rows.push("2020-03-11,United States,224,6,696,25");
        rows.push("2020-03-12,United States,291,4,987,29");
        csv_with_rows(&rows)
    }

    const UK_ROWS: [&str; 5] = [
        "2020-03-09,United Kingdom,67,0,277,2",
        "2020-03-10,United Kingdom,46,1,323,3",
        "2020-03-11,United Kingdom,50,3,373,6",
        "2020-03-12,United Kingdom,87,0,460,6",
        "2020-03-13,United Kingdom,134,2,594,8",
    ];
}
