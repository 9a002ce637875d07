//! Notification Dispatch
//!
//! Hands classified alerts to a notifier on a separate worker task. The
//! queue is bounded: producers wait for room up to a timeout, and the worker
//! drains whatever is queued once every handle has been dropped.
//!
//! A failed delivery is logged and counted. It never feeds back into
//! classification; the membership transition is already committed.

mod notifier;
mod worker;

pub use notifier::{LogNotifier, Notifier, WebhookNotifier};
pub use worker::{DispatchConfig, DispatchHandle, DispatchStats, Dispatcher};

use thiserror::Error;

/// Dispatch errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Queue stayed full for the whole enqueue timeout
    #[error("Dispatch queue full")]
    QueueFull,
    /// Worker has stopped
    #[error("Dispatch queue closed")]
    Closed,
    /// Notifier transport failed
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        DispatchError::Delivery(err.to_string())
    }
}
