//! JSON endpoints over the snapshot store.
//!
//! Every handler loads the live snapshot once and answers from it, so a
//! response never mixes data from two refreshes.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use covid_common::format_timestamp;
use covid_data::{query, Dataset, RefreshStatus, RefreshStatusHandle, SnapshotStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    store: Arc<SnapshotStore>,
    refresh: RefreshStatusHandle,
}

impl AppState {
    /// Bundles the store and the refresher's status handle.
    pub const fn new(store: Arc<SnapshotStore>, refresh: RefreshStatusHandle) -> Self {
        Self { store, refresh }
    }
}

/// Body of `GET /stats.json`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Latest record per location.
    pub data: Dataset,
    /// Freshness label of the snapshot.
    pub updated: String,
    /// Latest date in the snapshot.
    pub last_date: NaiveDate,
}

/// Body of `GET /country.json`.
#[derive(Debug, Serialize)]
pub struct CountryResponse {
    /// Full history of the requested location.
    pub data: Dataset,
}

/// Query string of `GET /country.json`.
#[derive(Debug, Deserialize)]
pub struct CountryQuery {
    /// Exact location name.
    pub loc: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` once a snapshot is installed, `starting` before.
    pub status: &'static str,
    /// Generation of the live snapshot.
    pub generation: u64,
    /// Records in the live snapshot.
    pub records: usize,
    /// Freshness label of the live snapshot.
    pub updated: String,
    /// Local time the live snapshot was built, absent before the first refresh.
    pub fetched_at: Option<String>,
    /// Refresh loop counters.
    pub refresh: RefreshStatus,
}

/// Builds the router serving the JSON API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/stats.json", get(stats))
        .route("/country.json", get(country))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let snapshot = state.store.current();
    let dataset = snapshot.dataset();

    Json(StatsResponse {
        data: query::latest_per_location(dataset),
        updated: snapshot.label().to_string(),
        last_date: query::max_date(dataset),
    })
}

async fn country(
    State(state): State<AppState>,
    Query(params): Query<CountryQuery>,
) -> Json<CountryResponse> {
    let data = params.loc.map_or_else(Dataset::empty, |loc| {
        query::filter_by_location(state.store.current().dataset(), &loc)
    });

    Json(CountryResponse { data })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.store.current();

    Json(HealthResponse {
        status: if snapshot.generation() > 0 { "ok" } else { "starting" },
        generation: snapshot.generation(),
        records: snapshot.dataset().len(),
        updated: snapshot.label().to_string(),
        fetched_at: (snapshot.generation() > 0).then(|| format_timestamp(snapshot.fetched_at())),
        refresh: state.refresh.get(),
    })
}
