//! Daily records, datasets and snapshots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::ops::Deref;
use std::sync::Arc;

/// One row of the upstream dataset: a single location on a single day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DailyRecord {
    date: NaiveDate,
    location: String,
    new_cases: i64,
    new_deaths: i64,
    total_cases: i64,
    total_deaths: i64,
}

impl DailyRecord {
    /// Creates a record from already validated values.
    pub fn new(
        date: NaiveDate,
        location: impl Into<String>,
        new_cases: i64,
        new_deaths: i64,
        total_cases: i64,
        total_deaths: i64,
    ) -> Self {
        Self {
            date,
            location: location.into(),
            new_cases,
            new_deaths,
            total_cases,
            total_deaths,
        }
    }

    /// Reporting day.
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Country or region name.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Cases reported on this day.
    pub const fn new_cases(&self) -> i64 {
        self.new_cases
    }

    /// Deaths reported on this day.
    pub const fn new_deaths(&self) -> i64 {
        self.new_deaths
    }

    /// Cumulative cases up to and including this day.
    pub const fn total_cases(&self) -> i64 {
        self.total_cases
    }

    /// Cumulative deaths up to and including this day.
    pub const fn total_deaths(&self) -> i64 {
        self.total_deaths
    }
}

/// An immutable, ordered collection of records from one parse.
///
/// Records keep source file order. Cloning shares the underlying slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    records: Arc<[DailyRecord]>,
}

impl Dataset {
    /// Freezes `records` into a dataset.
    pub fn new(records: Vec<DailyRecord>) -> Self {
        Self {
            records: Arc::from(records),
        }
    }

    /// A dataset with no records.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// The records in source order.
    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for Dataset {
    type Target = [DailyRecord];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

impl From<Vec<DailyRecord>> for Dataset {
    fn from(records: Vec<DailyRecord>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<DailyRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = DailyRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a DailyRecord;
    type IntoIter = std::slice::Iter<'a, DailyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records.iter())
    }
}

/// A dataset plus its freshness label: the unit of replacement in the store.
#[derive(Debug, Clone)]
pub struct Snapshot {
    dataset: Dataset,
    label: String,
    fetched_at: DateTime<Utc>,
    generation: u64,
}

impl Snapshot {
    /// Builds a snapshot fetched now. The store assigns its generation on install.
    pub fn new(dataset: Dataset, label: impl Into<String>) -> Self {
        Self {
            dataset,
            label: label.into(),
            fetched_at: Utc::now(),
            generation: 0,
        }
    }

    /// The placeholder held by a store before its first successful refresh.
    pub fn empty() -> Self {
        Self {
            dataset: Dataset::empty(),
            label: String::new(),
            fetched_at: DateTime::<Utc>::default(),
            generation: 0,
        }
    }

    /// The records of this snapshot.
    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Source-provided freshness label, usually the HTTP `Date` header.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Local time at which the snapshot was built.
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Install order within a store; 0 means never installed.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
