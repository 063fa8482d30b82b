//! Pure query functions over a dataset.

use crate::record::{DailyRecord, Dataset};
use chrono::NaiveDate;
use std::collections::HashSet;

/// Latest date across all records, or 1970-01-01 for an empty dataset.
pub fn max_date(dataset: &Dataset) -> NaiveDate {
    dataset
        .iter()
        .map(DailyRecord::date)
        .max()
        .unwrap_or_default()
}

/// One record per location: the one appearing last in input order.
///
/// Dates are not compared; the feed appends each location chronologically,
/// so source order is recency. Output is in reverse scan order.
pub fn latest_per_location(dataset: &Dataset) -> Dataset {
    let mut seen = HashSet::new();
    let mut latest = Vec::new();

    for record in dataset.iter().rev() {
        if seen.insert(record.location()) {
            latest.push(record.clone());
        }
    }

    Dataset::new(latest)
}

/// All records whose location equals `location` exactly, in input order.
pub fn filter_by_location(dataset: &Dataset, location: &str) -> Dataset {
    dataset
        .iter()
        .filter(|record| record.location() == location)
        .cloned()
        .collect()
}

/// Number of distinct locations in the dataset.
pub fn distinct_locations(dataset: &Dataset) -> usize {
    dataset
        .iter()
        .map(DailyRecord::location)
        .collect::<HashSet<_>>()
        .len()
}
