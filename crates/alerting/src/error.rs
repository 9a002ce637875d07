//! Alerting Error Types

use storage::StorageError;
use thiserror::Error;

/// Errors raised while classifying alerts
#[derive(Debug, Error)]
pub enum AlertError {
    /// Membership store failed; the alert's transition was not decided
    #[error(transparent)]
    Store(#[from] StorageError),

    /// Upstream sent an alert the classifier cannot act on
    #[error("Protocol violation for alert {fingerprint:?}: {detail}")]
    ProtocolViolation { fingerprint: String, detail: String },

    /// Some alerts of a batch failed; the rest were still classified
    #[error("{failed} of {total} alerts in batch failed classification")]
    PartialBatchFailure { failed: usize, total: usize },
}

impl AlertError {
    /// Whether this error came from an unreachable store
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, AlertError::Store(StorageError::Unavailable(_)))
    }
}
