//! Membership Store Contract

use async_trait::async_trait;

use crate::StorageError;

/// Key-value membership record keyed by alert fingerprint.
///
/// Implementations are shared across concurrent batches behind an `Arc`,
/// so every method takes `&self`. Errors are never folded into "absent":
/// a failed lookup must come back as [`StorageError::Unavailable`].
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    /// Whether a record exists for `fingerprint`
    async fn exists(&self, fingerprint: &str) -> Result<bool, StorageError>;

    /// Create the record for `fingerprint`.
    ///
    /// Idempotent. Returns `true` only when this call created the record.
    /// The existence check and the insert happen as one atomic step, so of
    /// two concurrent callers at most one sees `true`.
    async fn mark(&self, fingerprint: &str) -> Result<bool, StorageError>;

    /// Remove the record for `fingerprint`.
    ///
    /// Idempotent. Returns `true` when a record was actually removed.
    async fn clear(&self, fingerprint: &str) -> Result<bool, StorageError>;

    /// Number of fingerprints currently tracked
    async fn count(&self) -> Result<usize, StorageError>;
}
