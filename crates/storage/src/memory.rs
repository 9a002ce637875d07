//! In-Memory Membership Store

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::{MembershipStore, StorageError};

/// Process-local membership store
pub struct MemoryStore {
    /// Tracked fingerprints
    fingerprints: Mutex<HashSet<String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        info!("Creating in-memory membership store");
        Self {
            fingerprints: Mutex::new(HashSet::new()),
        }
    }

    fn with_set<T>(&self, f: impl FnOnce(&mut HashSet<String>) -> T) -> Result<T, StorageError> {
        let mut set = self.fingerprints.lock().map_err(|e| {
            StorageError::Unavailable(format!("Lock error: {}", e))
        })?;
        Ok(f(&mut set))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn exists(&self, fingerprint: &str) -> Result<bool, StorageError> {
        self.with_set(|set| set.contains(fingerprint))
    }

    async fn mark(&self, fingerprint: &str) -> Result<bool, StorageError> {
        let created = self.with_set(|set| set.insert(fingerprint.to_string()))?;
        debug!("Mark {} (created: {})", fingerprint, created);
        Ok(created)
    }

    async fn clear(&self, fingerprint: &str) -> Result<bool, StorageError> {
        let removed = self.with_set(|set| set.remove(fingerprint))?;
        debug!("Clear {} (removed: {})", fingerprint, removed);
        Ok(removed)
    }

    async fn count(&self) -> Result<usize, StorageError> {
        self.with_set(|set| set.len())
    }
}
