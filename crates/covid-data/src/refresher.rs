//! Periodic background refresh of the snapshot store.
//!
//! The refresher alternates between two states, `Idle` and `Fetching`. The
//! first cycle starts immediately, later cycles start on a fixed interval.
//! Cycles run strictly one after another: the next tick is not awaited until
//! the current fetch has finished or failed. A failed cycle leaves the store
//! untouched and is only logged; the next tick simply tries again.

use crate::error::IngestResult;
use crate::query;
use crate::record::Snapshot;
use crate::source::DatasetSource;
use crate::store::SnapshotStore;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Shortest interval the refresh loop will tick at.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// What the refresher is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
    /// Waiting for the next tick.
    #[default]
    Idle,
    /// A download and parse is in flight.
    Fetching,
}

/// Outcome counters of the refresh loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshStatus {
    /// Current state.
    pub state: RefreshState,
    /// Start of the most recent cycle.
    pub last_attempt: Option<DateTime<Utc>>,
    /// End of the most recent successful cycle.
    pub last_success: Option<DateTime<Utc>>,
    /// Error of the most recent cycle, cleared on success.
    pub last_error: Option<String>,
    /// Failed cycles since the last success.
    pub consecutive_failures: u32,
    /// Successful cycles since start.
    pub successful_refreshes: u64,
}

/// Cloneable read handle on a refresher's [`RefreshStatus`].
#[derive(Debug, Clone, Default)]
pub struct RefreshStatusHandle {
    inner: Arc<RwLock<RefreshStatus>>,
}

impl RefreshStatusHandle {
    /// Copy of the current status.
    pub fn get(&self) -> RefreshStatus {
        self.inner.read().clone()
    }

    fn update(&self, f: impl FnOnce(&mut RefreshStatus)) {
        f(&mut self.inner.write());
    }
}

/// Fetches from a [`DatasetSource`] and installs results into a [`SnapshotStore`].
pub struct Refresher {
    source: Arc<dyn DatasetSource>,
    store: Arc<SnapshotStore>,
    interval: Duration,
    status: RefreshStatusHandle,
}

impl Refresher {
    /// Creates a refresher ticking every `interval` (at least [`MIN_INTERVAL`]).
    pub fn new(source: Arc<dyn DatasetSource>, store: Arc<SnapshotStore>, interval: Duration) -> Self {
        Self {
            source,
            store,
            interval: interval.max(MIN_INTERVAL),
            status: RefreshStatusHandle::default(),
        }
    }

    /// Handle for observing the refresh loop from other tasks.
    pub fn status(&self) -> RefreshStatusHandle {
        self.status.clone()
    }

    /// Effective tick interval.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs one fetch-and-install cycle.
    ///
    /// # Errors
    ///
    /// Returns the fetch or parse error; the store keeps its current snapshot.
    #[instrument(skip(self))]
    pub async fn refresh_once(&self) -> IngestResult<Arc<Snapshot>> {
        self.status.update(|status| {
            status.state = RefreshState::Fetching;
            status.last_attempt = Some(Utc::now());
        });

        match self.source.fetch().await {
            Ok(fetched) => {
                let rows = fetched.dataset.len();
                let locations = query::distinct_locations(&fetched.dataset);
                let installed = self
                    .store
                    .replace(Snapshot::new(fetched.dataset, fetched.label));

                info!(
                    generation = installed.generation(),
                    updated = installed.label(),
                    "{rows} lines of data read for {locations} locations"
                );
                self.status.update(|status| {
                    status.state = RefreshState::Idle;
                    status.last_success = Some(Utc::now());
                    status.last_error = None;
                    status.consecutive_failures = 0;
                    status.successful_refreshes += 1;
                });
                Ok(installed)
            }
            Err(err) => {
                warn!(
                    kind = err.kind(),
                    error = %err,
                    "Refresh failed, keeping current snapshot"
                );
                self.status.update(|status| {
                    status.state = RefreshState::Idle;
                    status.last_error = Some(err.to_string());
                    status.consecutive_failures = status.consecutive_failures.saturating_add(1);
                });
                Err(err)
            }
        }
    }

    /// Runs the refresh loop until `shutdown` is cancelled.
    ///
    /// Cancellation interrupts both the wait for the next tick and an
    /// in-flight fetch.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "Refresher started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                () = shutdown.cancelled() => {
                    self.status.update(|status| status.state = RefreshState::Idle);
                    break;
                }
                _ = self.refresh_once() => {}
            }
        }

        info!("Refresher stopped");
    }

    /// Spawns [`run`](Self::run) onto the Tokio runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
