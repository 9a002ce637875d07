//! Test fixtures for the router

use alerting::NotificationIntent;
use async_trait::async_trait;
use dispatch::{DispatchConfig, DispatchError, Dispatcher, Notifier};
use std::sync::Arc;
use std::time::Duration;
use storage::{MembershipStore, MemoryStore, StorageError};
use tokio::sync::mpsc;

use crate::AppState;

/// Forwards every intent to a channel, optionally reporting failure
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<NotificationIntent>,
    fail: bool,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationIntent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender, fail: false }, receiver)
    }

    pub fn failing() -> (Self, mpsc::UnboundedReceiver<NotificationIntent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender, fail: true }, receiver)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    fn name(&self) -> &str {
        "channel"
    }

    async fn notify(&self, intent: &NotificationIntent) -> Result<(), DispatchError> {
        let _ = self.sender.send(intent.clone());
        if self.fail {
            Err(DispatchError::Delivery("transport down".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Memory store whose lookup of one fingerprint hangs for `delay`
pub struct StallingStore {
    inner: MemoryStore,
    fingerprint: String,
    delay: Duration,
}

impl StallingStore {
    pub fn new(fingerprint: &str, delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            fingerprint: fingerprint.to_string(),
            delay,
        }
    }
}

#[async_trait]
impl MembershipStore for StallingStore {
    fn backend(&self) -> &'static str {
        "stalling"
    }

    async fn exists(&self, fingerprint: &str) -> Result<bool, StorageError> {
        if fingerprint == self.fingerprint {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.exists(fingerprint).await
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

/// State over `store` and a running dispatch worker
pub fn test_state_over(store: Arc<dyn MembershipStore>, notifier: Arc<dyn Notifier>) -> Arc<AppState> {
    let (dispatcher, _worker) = Dispatcher::spawn(notifier, &DispatchConfig::default());
    Arc::new(AppState::new(store, dispatcher, None))
}

/// State over a fresh memory store and a running dispatch worker
pub fn test_state(notifier: Arc<dyn Notifier>) -> (Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (test_state_over(store.clone(), notifier), store)
}
