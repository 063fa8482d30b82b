//! Thread-safe snapshot store with arc-swap for lock-free reads.

use crate::query;
use crate::record::{Dataset, Snapshot};
use arc_swap::ArcSwap;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Holds the live [`Snapshot`] and swaps it atomically.
///
/// Readers load the current `Arc<Snapshot>` without locking and keep using it
/// for as long as they like; a concurrent [`replace`](Self::replace) only
/// affects later loads. Writers are serialised so generations are installed
/// in increasing order.
pub struct SnapshotStore {
    current: ArcSwap<Snapshot>,
    writer: Mutex<()>,
}

impl SnapshotStore {
    /// Creates a store holding the empty snapshot.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::empty()),
            writer: Mutex::new(()),
        }
    }

    /// Gets the live snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Installs `snapshot` as the live snapshot and returns it with its
    /// assigned generation.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let _guard = self.writer.lock();

        let generation = self.current.load().generation() + 1;
        let installed = Arc::new(snapshot.with_generation(generation));
        self.current.store(Arc::clone(&installed));

        debug!(
            generation,
            records = installed.dataset().len(),
            "Installed new snapshot"
        );
        installed
    }

    /// Whether a refresh has ever succeeded.
    pub fn has_snapshot(&self) -> bool {
        self.current.load().generation() > 0
    }

    /// Latest record per location of the live snapshot.
    pub fn latest(&self) -> Dataset {
        query::latest_per_location(self.current().dataset())
    }

    /// Full history of one location in the live snapshot.
    pub fn country(&self, location: &str) -> Dataset {
        query::filter_by_location(self.current().dataset(), location)
    }

    /// Freshness label of the live snapshot; empty before the first refresh.
    pub fn updated_label(&self) -> String {
        self.current.load().label().to_string()
    }

    /// Latest date in the live snapshot.
    pub fn max_date(&self) -> NaiveDate {
        query::max_date(self.current().dataset())
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_dataset;
    use covid_common::test_utils::csv_fixtures::*;

    fn snapshot(csv: &str, label: &str) -> Snapshot {
        Snapshot::new(parse_dataset(csv.as_bytes()).unwrap(), label)
    }

    #[test]
    fn test_empty_store_serves_empty_results() {
        let store = SnapshotStore::new();

        assert!(!store.has_snapshot());
        assert!(store.latest().is_empty());
        assert!(store.country("United Kingdom").is_empty());
        assert_eq!(store.updated_label(), "");
        assert_eq!(store.current().generation(), 0);
    }

    #[test]
    fn test_replace_assigns_generations() {
        let store = SnapshotStore::new();

        let first = store.replace(snapshot(&afghanistan_one_day(), "first"));
        let second = store.replace(snapshot(&two_countries(), "second"));

        assert_eq!(first.generation(), 1);
        assert_eq!(second.generation(), 2);
        assert!(Arc::ptr_eq(&second, &store.current()));
        assert_eq!(store.updated_label(), "second");
    }

    #[test]
    fn test_held_snapshot_survives_replace() {
        let store = SnapshotStore::new();
        store.replace(snapshot(&afghanistan_one_day(), "old"));

        let held = store.current();
        store.replace(snapshot(&two_countries(), "new"));

        assert_eq!(held.label(), "old");
        assert_eq!(held.dataset().len(), 1);
        assert_eq!(store.current().dataset().len(), 7);
    }

    #[test]
    fn test_accessors_query_live_snapshot() {
        let store = SnapshotStore::new();
        store.replace(snapshot(&two_countries(), "Fri, 13 Mar 2020 08:00:00 GMT"));

        assert!(store.has_snapshot());
        assert_eq!(store.latest().len(), 2);
        assert_eq!(store.country("United States").len(), 2);
        assert_eq!(store.max_date(), NaiveDate::from_ymd_opt(2020, 3, 13).unwrap());
        assert_eq!(store.updated_label(), "Fri, 13 Mar 2020 08:00:00 GMT");
    }
}
