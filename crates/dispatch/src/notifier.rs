//! Notifier Implementations

use alerting::{Alert, EventClass, NotificationIntent};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::DispatchError;

/// Transport for a single notification
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Name for logs and metrics
    fn name(&self) -> &str;

    /// Deliver one notification
    async fn notify(&self, intent: &NotificationIntent) -> Result<(), DispatchError>;
}

/// Writes each notification as a structured log event
#[derive(Debug, Clone)]
pub struct LogNotifier {
    name: String,
}

impl LogNotifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new("log")
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, intent: &NotificationIntent) -> Result<(), DispatchError> {
        let alert = &intent.alert;
        match intent.reason {
            EventClass::NewFiring => warn!(
                fingerprint = %alert.fingerprint,
                severity = %alert.severity(),
                summary = alert.summary().unwrap_or_default(),
                labels = ?alert.labels,
                "{}",
                intent.subject()
            ),
            _ => info!(
                fingerprint = %alert.fingerprint,
                severity = %alert.severity(),
                reason = %intent.reason,
                "{} resolved",
                intent.subject()
            ),
        }
        Ok(())
    }
}

/// JSON body posted by [`WebhookNotifier`]
#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    subject: String,
    reason: EventClass,
    alert: &'a Alert,
}

/// Posts each notification as JSON to an HTTP endpoint
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, intent: &NotificationIntent) -> Result<(), DispatchError> {
        let message = WebhookMessage {
            subject: intent.subject(),
            reason: intent.reason,
            alert: &intent.alert,
        };

        let response = self.client.post(&self.url).json(&message).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Delivery(format!(
                "{} responded with {}",
                self.url, status
            )));
        }

        debug!("Posted {} to {}", intent.alert.fingerprint, self.url);
        Ok(())
    }
}
