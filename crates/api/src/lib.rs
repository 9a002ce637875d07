//! Alert Relay API Server
//!
//! Receives Alertmanager webhooks, suppresses re-delivered firing alerts,
//! and hands new firings and resolutions to the notification worker.

use alerting::BatchProcessor;
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use dispatch::{DispatchHandle, Dispatcher, LogNotifier, Notifier, WebhookNotifier};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;
use storage::{MemoryStore, MembershipStore, SqliteStore};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
mod routes;
mod settings;

#[cfg(test)]
mod testing;

pub use error::ApiError;
pub use settings::{
    LoggingConfig, NotifierConfig, NotifierKind, ServerConfig, ServiceConfig, StoreBackend,
    StoreConfig,
};

/// Application state shared across handlers
pub struct AppState {
    /// Batch classifier over the shared store
    pub processor: BatchProcessor,
    /// Membership store, also queried by the health check
    pub store: Arc<dyn MembershipStore>,
    /// Producer side of the notification queue
    pub dispatcher: DispatchHandle,
    /// Prometheus recorder handle, when installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(
        store: Arc<dyn MembershipStore>,
        dispatcher: DispatchHandle,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            processor: BatchProcessor::new(store.clone()),
            store,
            dispatcher,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/alert", post(routes::alerts::receive_alerts).fallback(forbidden))
        .route("/health", get(routes::health::health))
        .route("/metrics", get(routes::health::metrics))
        .fallback(forbidden)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn forbidden() -> impl IntoResponse {
    (StatusCode::FORBIDDEN, "Forbidden")
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<(), ApiError> {
    let level = config
        .level
        .parse::<Level>()
        .map_err(|e| ApiError::InvalidConfig(format!("logging.level: {}", e)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| ApiError::Logging(e.to_string()))
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> Result<PrometheusHandle, ApiError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ApiError::Metrics(e.to_string()))
}

/// Open the configured membership store
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn MembershipStore>, ApiError> {
    let store: Arc<dyn MembershipStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Sqlite => Arc::new(
            SqliteStore::connect(&config.url, config.max_connections, config.acquire_timeout())
                .await?,
        ),
    };
    Ok(store)
}

/// Build the configured notifier
pub fn build_notifier(config: &NotifierConfig) -> Result<Arc<dyn Notifier>, ApiError> {
    let notifier: Arc<dyn Notifier> = match config.kind {
        NotifierKind::Log => Arc::new(LogNotifier::default()),
        NotifierKind::Webhook => {
            let url = config.webhook_url.as_deref().ok_or_else(|| {
                ApiError::InvalidConfig("notifier.webhook_url is required for webhook".to_string())
            })?;
            Arc::new(WebhookNotifier::new(url, Duration::from_millis(config.timeout_ms))?)
        }
    };
    Ok(notifier)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Run the server until Ctrl-C, then drain the notification queue
pub async fn run_server(config: ServiceConfig) -> Result<(), ApiError> {
    let metrics = install_metrics()?;
    let store = open_store(&config.store).await?;
    let notifier = build_notifier(&config.notifier)?;
    let (dispatcher, worker) = Dispatcher::spawn(notifier, &config.dispatch);

    let state = Arc::new(AppState::new(store, dispatcher, Some(metrics)));
    let app = create_router(state);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ApiError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("Starting API server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Router and state are gone: the worker sees the queue close and drains it
    let stats = worker.await?;
    info!(
        "Server stopped ({} notifications delivered, {} failed)",
        stats.delivered, stats.failed
    );
    Ok(())
}
