//! Membership store doubles for tests

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use storage::{MemoryStore, MembershipStore, StorageError};
use tokio::sync::Barrier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Exists,
    Mark,
    Clear,
}

/// Memory store that counts calls and fails chosen (op, fingerprint) pairs
pub struct FaultyStore {
    inner: MemoryStore,
    failures: HashSet<(Op, String)>,
    exists_calls: AtomicUsize,
    mark_calls: AtomicUsize,
    clear_calls: AtomicUsize,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failures: HashSet::new(),
            exists_calls: AtomicUsize::new(0),
            mark_calls: AtomicUsize::new(0),
            clear_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_on(mut self, op: Op, fingerprint: &str) -> Self {
        self.failures.insert((op, fingerprint.to_string()));
        self
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn calls_of(&self, op: Op) -> usize {
        self.counter(op).load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls_of(Op::Exists) + self.calls_of(Op::Mark) + self.calls_of(Op::Clear)
    }

    fn counter(&self, op: Op) -> &AtomicUsize {
        match op {
            Op::Exists => &self.exists_calls,
            Op::Mark => &self.mark_calls,
            Op::Clear => &self.clear_calls,
        }
    }

    fn check(&self, op: Op, fingerprint: &str) -> Result<(), StorageError> {
        self.counter(op).fetch_add(1, Ordering::SeqCst);

        if self.failures.contains(&(op, fingerprint.to_string())) {
            Err(StorageError::Unavailable("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MembershipStore for FaultyStore {
    fn backend(&self) -> &'static str {
        "faulty"
    }

    async fn exists(&self, fingerprint: &str) -> Result<bool, StorageError> {
        self.check(Op::Exists, fingerprint)?;
        self.inner.exists(fingerprint).await
    }

    async fn mark(&self, fingerprint: &str) -> Result<bool, StorageError> {
        self.check(Op::Mark, fingerprint)?;
        self.inner.mark(fingerprint).await
    }

    async fn clear(&self, fingerprint: &str) -> Result<bool, StorageError> {
        self.check(Op::Clear, fingerprint)?;
        self.inner.clear(fingerprint).await
    }

    async fn count(&self) -> Result<usize, StorageError> {
        self.inner.count().await
    }
}

/// Memory store whose lookups wait until `n` lookups are in flight
pub struct BarrierStore {
    inner: MemoryStore,
    barrier: Barrier,
}

impl BarrierStore {
    pub fn new(n: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            barrier: Barrier::new(n),
        }
    }
}

#[async_trait]
impl MembershipStore for BarrierStore {
    fn backend(&self) -> &'static str {
        "barrier"
    }

    async fn exists(&self, fingerprint: &str) -> Result<bool, StorageError> {
        let found = self.inner.exists(fingerprint).await?;
        self.barrier.wait().await;
        Ok(found)
    }

    async fn mark(&self, fingerprint: &str) -> Result<bool, StorageError> {
        self.inner.mark(fingerprint).await
    }

    async fn clear(&self, fingerprint: &str) -> Result<bool, StorageError> {
        self.inner.clear(fingerprint).await
    }

    async fn count(&self) -> Result<usize, StorageError> {
        self.inner.count().await
    }
}

/// Memory store that stalls every operation on one fingerprint
pub struct SlowStore {
    inner: MemoryStore,
    slow_fingerprint: String,
    delay: Duration,
}

impl SlowStore {
    pub fn new(slow_fingerprint: &str, delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            slow_fingerprint: slow_fingerprint.to_string(),
            delay,
        }
    }

    async fn stall(&self, fingerprint: &str) {
        if fingerprint == self.slow_fingerprint {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl MembershipStore for SlowStore {
    fn backend(&self) -> &'static str {
        "slow"
    }

    async fn exists(&self, fingerprint: &str) -> Result<bool, StorageError> {
        self.stall(fingerprint).await;
        self.inner.exists(fingerprint).await
    }

    async fn mark(&self, fingerprint: &str) -> Result<bool, StorageError> {
        self.stall(fingerprint).await;
        self.inner.mark(fingerprint).await
    }

    async fn clear(&self, fingerprint: &str) -> Result<bool, StorageError> {
        self.stall(fingerprint).await;
        self.inner.clear(fingerprint).await
    }

    async fn count(&self) -> Result<usize, StorageError> {
        self.inner.count().await
    }
}
