//! Alert Data Model
//!
//! Field names follow the Prometheus Alertmanager webhook payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::EventClass;

/// Status reported by the alert source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertStatus {
    Firing,
    Resolved,
    /// Anything else the source sent, kept verbatim for logging
    Unrecognized(String),
}

impl From<String> for AlertStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "firing" => AlertStatus::Firing,
            "resolved" => AlertStatus::Resolved,
            _ => AlertStatus::Unrecognized(status),
        }
    }
}

impl From<&str> for AlertStatus {
    fn from(status: &str) -> Self {
        AlertStatus::from(status.to_string())
    }
}

impl From<AlertStatus> for String {
    fn from(status: AlertStatus) -> Self {
        match status {
            AlertStatus::Firing => "firing".to_string(),
            AlertStatus::Resolved => "resolved".to_string(),
            AlertStatus::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertStatus::Firing => f.write_str("firing"),
            AlertStatus::Resolved => f.write_str("resolved"),
            AlertStatus::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

/// A single alert as delivered by the webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub status: AlertStatus,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "generatorURL")]
    pub generator_url: String,
    /// Stable identity of the underlying condition
    #[serde(default)]
    pub fingerprint: String,
}

impl Alert {
    pub fn new(fingerprint: impl Into<String>, status: impl Into<AlertStatus>) -> Self {
        Self {
            status: status.into(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            starts_at: None,
            ends_at: None,
            generator_url: String::new(),
            fingerprint: fingerprint.into(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// `alertname` label, or `"unknown"`
    pub fn alert_name(&self) -> &str {
        self.labels.get("alertname").map_or("unknown", String::as_str)
    }

    /// `severity` label, or `"unknown"`
    pub fn severity(&self) -> &str {
        self.labels.get("severity").map_or("unknown", String::as_str)
    }

    /// `summary` annotation, if any
    pub fn summary(&self) -> Option<&str> {
        self.annotations.get("summary").map(String::as_str)
    }
}

/// Alertmanager webhook envelope around a batch of alerts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[serde(default)]
    pub receiver: String,
    #[serde(default)]
    pub status: String,
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub group_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub common_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub common_annotations: BTreeMap<String, String>,
    #[serde(default, rename = "externalURL")]
    pub external_url: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub group_key: String,
    #[serde(default)]
    pub truncated_alerts: u64,
}

/// An alert that should be notified, and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationIntent {
    pub alert: Alert,
    pub reason: EventClass,
}

impl NotificationIntent {
    pub fn new(alert: Alert, reason: EventClass) -> Self {
        Self { alert, reason }
    }

    /// Subject line used by notifiers
    pub fn subject(&self) -> String {
        format!("Alarme {} - {}", self.alert.severity(), self.alert.alert_name())
    }
}
