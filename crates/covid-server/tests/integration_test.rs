//! Integration tests for covid-server crate.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use covid_common::test_utils::csv_fixtures::*;
use covid_common::test_utils::init_test_logging;
use covid_common::CovidError;
use covid_config::Config;
use covid_data::{
    parse_dataset, DatasetSource, FetchedDataset, IngestResult, RefreshStatusHandle, Snapshot,
    SnapshotStore,
};
use covid_server::{router, App, AppState, ServerError};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const LABEL: &str = "Fri, 13 Mar 2020 08:00:00 GMT";

fn state_with(csv: Option<&str>) -> AppState {
    let store = Arc::new(SnapshotStore::new());
    if let Some(csv) = csv {
        store.replace(Snapshot::new(parse_dataset(csv.as_bytes()).unwrap(), LABEL));
    }
    AppState::new(store, RefreshStatusHandle::default())
}

async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
    let response = router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_stats_returns_latest_per_location() {
    let (status, json) = get_json(state_with(Some(&two_countries())), "/stats.json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["updated"], LABEL);
    assert_eq!(json["last_date"], "2020-03-13");

    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["location"], "United States");
    assert_eq!(data[0]["date"], "2020-03-12");
    assert_eq!(data[0]["total_cases"], 987);
    assert_eq!(data[1]["location"], "United Kingdom");
    assert_eq!(data[1]["total_deaths"], 8);
}

#[tokio::test]
async fn test_stats_before_first_refresh() {
    let (status, json) = get_json(state_with(None), "/stats.json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], Value::Array(Vec::new()));
    assert_eq!(json["updated"], "");
    assert_eq!(json["last_date"], "1970-01-01");
}

#[tokio::test]
async fn test_country_returns_history_in_order() {
    let (status, json) = get_json(
        state_with(Some(&two_countries())),
        "/country.json?loc=United%20Kingdom",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let dates: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["date"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        dates,
        ["2020-03-09", "2020-03-10", "2020-03-11", "2020-03-12", "2020-03-13"]
    );
}

#[tokio::test]
async fn test_country_unknown_or_missing_loc_is_empty() {
    let state = state_with(Some(&two_countries()));

    let (_, unknown) = get_json(state.clone(), "/country.json?loc=Narnia").await;
    assert_eq!(unknown["data"], Value::Array(Vec::new()));

    let (status, missing) = get_json(state, "/country.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(missing["data"], Value::Array(Vec::new()));
}

#[tokio::test]
async fn test_health_reports_snapshot() {
    let (_, starting) = get_json(state_with(None), "/health").await;
    assert_eq!(starting["status"], "starting");
    assert_eq!(starting["generation"], 0);
    assert!(starting["fetched_at"].is_null());

    let (_, ready) = get_json(state_with(Some(&afghanistan_one_day())), "/health").await;
    assert_eq!(ready["status"], "ok");
    assert_eq!(ready["generation"], 1);
    assert_eq!(ready["records"], 1);
    assert_eq!(ready["refresh"]["state"], "idle");
    assert!(ready["fetched_at"].as_str().unwrap().ends_with(" UTC"));
}

#[tokio::test]
async fn test_method_other_than_get_is_rejected() {
    for uri in ["/stats.json", "/country.json?loc=Italy", "/health"] {
        let response = router(state_with(None))
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{uri}");
    }
}

#[tokio::test]
async fn test_run_reports_bind_failure_as_network_error() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = Config::default();
    config.server.bind_addr = taken.local_addr().unwrap().to_string();

    let err = App::with_source(config, Arc::new(FixtureSource))
        .run()
        .await
        .unwrap_err();

    match err {
        ServerError::Config(CovidError::Network { message, .. }) => {
            assert!(message.starts_with("Failed to bind"));
        }
        other => panic!("expected network error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = router(state_with(None))
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

struct FixtureSource;

#[async_trait]
impl DatasetSource for FixtureSource {
    async fn fetch(&self) -> IngestResult<FetchedDataset> {
        Ok(FetchedDataset {
            dataset: parse_dataset(two_countries().as_bytes())?,
            label: LABEL.to_string(),
        })
    }
}

#[tokio::test]
async fn test_app_refreshes_and_serves_until_shutdown() {
    init_test_logging();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = App::with_source(Config::default(), Arc::new(FixtureSource));
    let store = app.store();

    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(app.serve(listener, async move {
        let _ = stopped.await;
    }));

    // The first refresh runs immediately on start.
    for _ in 0..100 {
        if store.has_snapshot() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(store.has_snapshot());

    let json: Value = reqwest::get(format!("http://{addr}/stats.json"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(json["updated"], LABEL);

    stop.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap()
        .unwrap();
}
