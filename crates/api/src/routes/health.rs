//! Health and Metrics Routes

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub store: StoreHealth,
    pub dispatch: DispatchHealth,
}

/// Membership store health
#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub backend: String,
    pub status: String,
    /// Fingerprints currently tracked as firing
    pub tracked: Option<usize>,
    pub error: Option<String>,
}

/// Dispatch queue health
#[derive(Debug, Serialize)]
pub struct DispatchHealth {
    pub pending: usize,
    pub closed: bool,
}

/// Health check handler
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let store = match state.store.count().await {
        Ok(tracked) => StoreHealth {
            backend: state.store.backend().to_string(),
            status: "ok".to_string(),
            tracked: Some(tracked),
            error: None,
        },
        Err(e) => StoreHealth {
            backend: state.store.backend().to_string(),
            status: "unavailable".to_string(),
            tracked: None,
            error: Some(e.to_string()),
        },
    };

    let dispatch = DispatchHealth {
        pending: state.dispatcher.pending(),
        closed: state.dispatcher.is_closed(),
    };

    let healthy = store.error.is_none() && !dispatch.closed;

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        store,
        dispatch,
    })
}

/// Prometheus exposition of the recorded metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or(ApiError::MetricsDisabled)
}
