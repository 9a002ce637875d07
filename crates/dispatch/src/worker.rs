//! Dispatch Queue and Worker

use alerting::NotificationIntent;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::{DispatchError, Notifier};

/// Dispatch queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum queued notifications (default: 256)
    pub queue_capacity: usize,
    /// How long a producer waits for queue room (milliseconds)
    pub enqueue_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            enqueue_timeout_ms: 5000,
        }
    }
}

/// Counters returned by the worker when it stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: usize,
    pub failed: usize,
}

/// Producer side of the dispatch queue
#[derive(Clone)]
pub struct DispatchHandle {
    sender: mpsc::Sender<NotificationIntent>,
    enqueue_timeout: Duration,
}

impl DispatchHandle {
    /// Queue one notification, waiting for room up to the enqueue timeout
    pub async fn dispatch(&self, intent: NotificationIntent) -> Result<(), DispatchError> {
        match self.sender.send_timeout(intent, self.enqueue_timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(intent)) => {
                warn!("Dispatch queue full, dropping notification for {}", intent.alert.fingerprint);
                Err(DispatchError::QueueFull)
            }
            Err(SendTimeoutError::Closed(_)) => Err(DispatchError::Closed),
        }
    }

    /// Queue a whole notify set. Returns how many were accepted.
    ///
    /// The enqueue timeout bounds the whole set, not each intent. Once it
    /// runs out, the remaining intents are dropped and logged.
    pub async fn dispatch_all(&self, intents: Vec<NotificationIntent>) -> usize {
        let deadline = Instant::now() + self.enqueue_timeout;
        let total = intents.len();
        let mut accepted = 0;

        for intent in intents {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.sender.send_timeout(intent, remaining).await {
                Ok(()) => accepted += 1,
                Err(SendTimeoutError::Timeout(intent)) => {
                    warn!(
                        "Dispatch queue full, dropping {} of {} notifications (first: {})",
                        total - accepted,
                        total,
                        intent.alert.fingerprint
                    );
                    break;
                }
                Err(SendTimeoutError::Closed(_)) => {
                    error!("Dispatch queue closed, dropping {} notifications", total - accepted);
                    break;
                }
            }
        }
        accepted
    }

    /// Notifications waiting for the worker
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Whether the worker has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Starts dispatch workers
pub struct Dispatcher;

impl Dispatcher {
    /// Spawn a worker delivering through `notifier`.
    ///
    /// The worker exits after every [`DispatchHandle`] clone is dropped and
    /// the queue is drained; the join handle yields its counters.
    pub fn spawn(
        notifier: Arc<dyn Notifier>,
        config: &DispatchConfig,
    ) -> (DispatchHandle, JoinHandle<DispatchStats>) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        info!(
            "Starting dispatch worker: notifier={}, capacity={}",
            notifier.name(),
            config.queue_capacity
        );

        let worker = DispatchWorker { receiver, notifier };
        let join = tokio::spawn(worker.run());

        let handle = DispatchHandle {
            sender,
            enqueue_timeout: Duration::from_millis(config.enqueue_timeout_ms),
        };
        (handle, join)
    }
}

struct DispatchWorker {
    receiver: mpsc::Receiver<NotificationIntent>,
    notifier: Arc<dyn Notifier>,
}

impl DispatchWorker {
    async fn run(mut self) -> DispatchStats {
        let mut stats = DispatchStats::default();
        let name = self.notifier.name().to_string();

        while let Some(intent) = self.receiver.recv().await {
            match self.notifier.notify(&intent).await {
                Ok(()) => {
                    stats.delivered += 1;
                    metrics::counter!("notifications_total", "notifier" => name.clone(), "result" => "delivered")
                        .increment(1);
                    debug!("Delivered {} via {}", intent.alert.fingerprint, name);
                }
                Err(e) => {
                    stats.failed += 1;
                    metrics::counter!("notifications_total", "notifier" => name.clone(), "result" => "failed")
                        .increment(1);
                    error!(
                        "Notification for {} ({}) via {} failed: {}",
                        intent.alert.alert_name(),
                        intent.alert.fingerprint,
                        name,
                        e
                    );
                }
            }
        }

        info!(
            "Dispatch worker stopped: {} delivered, {} failed",
            stats.delivered, stats.failed
        );
        stats
    }
}
