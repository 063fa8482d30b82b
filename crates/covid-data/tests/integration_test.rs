//! Integration tests for covid-data crate.

use covid_common::test_utils::csv_fixtures::*;
use covid_data::{parse_dataset, query, DailyRecord, Dataset, IngestError, Snapshot, SnapshotStore};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_parse_then_query_uk_scenario() {
    let dataset = parse_dataset(united_kingdom_five_days().as_bytes()).unwrap();

    assert_eq!(dataset.len(), 5);
    let latest = query::latest_per_location(&dataset);
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].total_cases(), 594);
    assert_eq!(latest[0].total_deaths(), 8);
    assert_eq!(query::filter_by_location(&dataset, "United Kingdom").len(), 5);
}

#[test]
fn test_parse_afghanistan_single_row() {
    let dataset = parse_dataset(afghanistan_one_day().as_bytes()).unwrap();

    assert_eq!(dataset.len(), 1);
    let record = &dataset[0];
    assert_eq!(record.date(), chrono::NaiveDate::from_ymd_opt(2020, 2, 25).unwrap());
    assert_eq!(record.location(), "Afghanistan");
    assert_eq!(
        (record.new_cases(), record.new_deaths(), record.total_cases(), record.total_deaths()),
        (1, 2, 3, 4)
    );
}

#[test]
fn test_whitespace_and_empty_counts() {
    let csv = csv_with_rows(&["2020-02-25 , Afghanistan , ,2, 3 ,"]);
    let dataset = parse_dataset(csv.as_bytes()).unwrap();

    let record = &dataset[0];
    assert_eq!(record.location(), "Afghanistan");
    assert_eq!(record.new_cases(), 0);
    assert_eq!(record.new_deaths(), 2);
    assert_eq!(record.total_cases(), 3);
    assert_eq!(record.total_deaths(), 0);
}

#[test]
fn test_one_bad_row_rejects_whole_stream() {
    let csv = csv_with_rows(&[
        "2020-03-09,United Kingdom,67,0,277,2",
        "2020-03-10,United Kingdom,abc,1,323,3",
        "2020-03-11,United Kingdom,50,3,373,6",
    ]);

    match parse_dataset(csv.as_bytes()) {
        Err(IngestError::NumericField { line, column, .. }) => {
            assert_eq!(line, 3);
            assert_eq!(column, "new_cases");
        }
        other => panic!("expected numeric field error, got {other:?}"),
    }
}

#[test]
fn test_store_serves_latest_snapshot() {
    let store = SnapshotStore::new();
    let dataset = parse_dataset(two_countries().as_bytes()).unwrap();
    store.replace(Snapshot::new(dataset, "Fri, 13 Mar 2020 08:00:00 GMT"));

    let latest = store.latest();
    let locations: Vec<_> = latest.iter().map(DailyRecord::location).collect();
    assert_eq!(locations, ["United States", "United Kingdom"]);
    assert_eq!(store.country("United States").len(), 2);
}

/// Snapshot labelled `"<records>:<sum of total_cases>"`.
fn counted_snapshot(rows: usize, seed: i64) -> Snapshot {
    let date = chrono::NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
    let records: Dataset = (0..rows)
        .map(|i| DailyRecord::new(date, format!("Location {i}"), 1, 0, seed + i as i64, 0))
        .collect();
    let checksum: i64 = records.iter().map(DailyRecord::total_cases).sum();
    Snapshot::new(records, format!("{rows}:{checksum}"))
}

fn checksum(snapshot: &Snapshot) -> String {
    let sum: i64 = snapshot.dataset().iter().map(DailyRecord::total_cases).sum();
    format!("{}:{sum}", snapshot.dataset().len())
}

#[test]
fn test_readers_never_observe_mixed_snapshots() {
    const REPLACEMENTS: usize = 2000;
    const READERS: usize = 4;

    let store = Arc::new(SnapshotStore::new());
    store.replace(counted_snapshot(1, 0));
    let writer_done = AtomicBool::new(false);
    let readers_started = AtomicUsize::new(0);

    let observed: Vec<usize> = std::thread::scope(|scope| {
        let readers: Vec<_> = (0..READERS)
            .map(|_| {
                let reader_store = Arc::clone(&store);
                let (writer_done, readers_started) = (&writer_done, &readers_started);
                scope.spawn(move || {
                    let mut last_generation = reader_store.current().generation();
                    let mut generations = HashSet::from([last_generation]);
                    readers_started.fetch_add(1, Ordering::SeqCst);
                    loop {
                        // Read once more after the writer finishes so the final
                        // snapshot is always observed.
                        let done = writer_done.load(Ordering::Acquire);
                        let snapshot = reader_store.current();
                        assert_eq!(snapshot.label(), checksum(&snapshot));
                        assert_eq!(
                            query::distinct_locations(snapshot.dataset()),
                            snapshot.dataset().len()
                        );
                        assert!(snapshot.generation() >= last_generation);
                        last_generation = snapshot.generation();
                        generations.insert(last_generation);
                        if done {
                            break;
                        }
                    }
                    generations.len()
                })
            })
            .collect();

        let writer_store = Arc::clone(&store);
        let (writer_done, readers_started) = (&writer_done, &readers_started);
        scope.spawn(move || {
            while readers_started.load(Ordering::SeqCst) < READERS {
                std::thread::yield_now();
            }
            for i in 0..REPLACEMENTS {
                writer_store.replace(counted_snapshot(i % 17 + 1, i as i64 * 1000));
            }
            writer_done.store(true, Ordering::Release);
        });

        readers.into_iter().map(|r| r.join().unwrap()).collect()
    });

    assert_eq!(store.current().generation(), REPLACEMENTS as u64 + 1);
    // Every reader was running before the first replacement and read the last
    // one, so each saw at least the initial and the final generation.
    assert!(observed.iter().all(|&distinct| distinct >= 2), "{observed:?}");
}

const LOCATIONS: [&str; 4] = ["Afghanistan", "Côte d'Ivoire", "United Kingdom", "Bonaire, Sint Eustatius and Saba"];

fn row_strategy() -> impl Strategy<Value = (u32, usize, i64, i64, i64, i64)> {
    (
        0u32..365,
        0..LOCATIONS.len(),
        -1000i64..100_000,
        -10i64..1000,
        0i64..10_000_000,
        0i64..100_000,
    )
}

fn to_csv(rows: &[(u32, usize, i64, i64, i64, i64)]) -> String {
    let start = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut out = String::from(covid_common::test_utils::CSV_HEADER);
    out.push('\n');
    for &(day, loc, nc, nd, tc, td) in rows {
        let date = start + chrono::Duration::days(i64::from(day));
        let location = LOCATIONS[loc];
        // Locations containing commas must be quoted.
        let location = if location.contains(',') {
            format!("\"{location}\"")
        } else {
            location.to_string()
        };
        out.push_str(&format!("{},{location},{nc},{nd},{tc},{td}\n", date.format("%Y-%m-%d")));
    }
    out
}

proptest! {
    #[test]
    fn prop_parse_keeps_every_row_in_order(rows in prop::collection::vec(row_strategy(), 0..60)) {
        let dataset = parse_dataset(to_csv(&rows).as_bytes()).unwrap();

        prop_assert_eq!(dataset.len(), rows.len());
        for (record, &(_, loc, nc, nd, tc, td)) in dataset.iter().zip(&rows) {
            prop_assert_eq!(record.location(), LOCATIONS[loc]);
            prop_assert_eq!(record.new_cases(), nc);
            prop_assert_eq!(record.new_deaths(), nd);
            prop_assert_eq!(record.total_cases(), tc);
            prop_assert_eq!(record.total_deaths(), td);
        }
    }

    #[test]
    fn prop_latest_is_last_occurrence(rows in prop::collection::vec(row_strategy(), 0..60)) {
        let dataset = parse_dataset(to_csv(&rows).as_bytes()).unwrap();
        let latest = query::latest_per_location(&dataset);

        let mut last: HashMap<&str, &DailyRecord> = HashMap::new();
        for record in dataset.iter() {
            last.insert(record.location(), record);
        }

        prop_assert_eq!(latest.len(), last.len());
        for record in latest.iter() {
            prop_assert_eq!(Some(&record), last.get(record.location()));
        }
        for location in LOCATIONS {
            prop_assert!(query::filter_by_location(&latest, location).len() <= 1);
        }
    }

    #[test]
    fn prop_filters_partition_dataset(rows in prop::collection::vec(row_strategy(), 0..60)) {
        let dataset = parse_dataset(to_csv(&rows).as_bytes()).unwrap();

        let total: usize = LOCATIONS
            .iter()
            .map(|location| {
                let filtered = query::filter_by_location(&dataset, location);
                assert!(filtered.iter().all(|r| r.location() == *location));
                filtered.len()
            })
            .sum();

        prop_assert_eq!(total, dataset.len());

        let start = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let expected = rows
            .iter()
            .map(|&(day, ..)| start + chrono::Duration::days(i64::from(day)))
            .max()
            .unwrap_or_default();
        prop_assert_eq!(query::max_date(&dataset), expected);
    }
}
