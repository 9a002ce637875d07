//! API Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dispatch::DispatchError;
use storage::StorageError;
use thiserror::Error;

/// Errors raised while starting or serving the relay
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StorageError),

    #[error("Notifier error: {0}")]
    Notifier(#[from] DispatchError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Metrics setup failed: {0}")]
    Metrics(String),

    #[error("Metrics are not enabled")]
    MetricsDisabled,

    #[error("Dispatch worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::MetricsDisabled => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
