//! Composition root: wires source, store, refresher and HTTP server together.

use crate::api::{self, AppState};
use crate::error::ServerResult;
use covid_common::CovidError;
use covid_config::Config;
use covid_data::{DatasetSource, HttpSource, Refresher, SnapshotStore};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// A fully wired covid-stats server.
pub struct App {
    config: Config,
    store: Arc<SnapshotStore>,
    source: Arc<dyn DatasetSource>,
}

impl App {
    /// Builds the application with an HTTP source for the configured URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: Config) -> ServerResult<Self> {
        let source = HttpSource::new(
            config.source.url.clone(),
            config.source.timeout(),
            &config.source.user_agent,
        )?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    /// Builds the application around an arbitrary dataset source.
    pub fn with_source(config: Config, source: Arc<dyn DatasetSource>) -> Self {
        Self {
            config,
            store: Arc::new(SnapshotStore::new()),
            source,
        }
    }

    /// The store served by this application.
    pub fn store(&self) -> Arc<SnapshotStore> {
        Arc::clone(&self.store)
    }

    /// Binds the configured address and serves until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address is invalid or cannot be bound.
    pub async fn run(self) -> ServerResult<()> {
        let addr = self.config.server.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| CovidError::network_with_source(format!("Failed to bind {addr}"), e))?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on `listener` until `signal` resolves, then stops the refresher.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails while running.
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown = CancellationToken::new();
        let refresher = Refresher::new(
            self.source,
            Arc::clone(&self.store),
            self.config.refresh.interval(),
        );
        let state = AppState::new(Arc::clone(&self.store), refresher.status());
        let refresh_task = refresher.spawn(shutdown.clone());

        info!("listening on http://{}/", listener.local_addr()?);
        let served = axum::serve(listener, api::router(state))
            .with_graceful_shutdown(signal)
            .await;

        shutdown.cancel();
        if let Err(e) = refresh_task.await {
            warn!("Refresh task ended abnormally: {e}");
        }

        served?;
        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {e}"),
    }
}
