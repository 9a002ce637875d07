//! Transition Classifier
//!
//! Per-fingerprint state lives in the membership store:
//!
//! | state     | status   | next      | event           | notify |
//! |-----------|----------|-----------|-----------------|--------|
//! | untracked | firing   | tracked   | NewFiring       | yes    |
//! | tracked   | firing   | tracked   | RepeatFiring    | no     |
//! | tracked   | resolved | untracked | Resolved        | yes    |
//! | untracked | resolved | untracked | ResolvedUnknown | yes    |
//!
//! Resolutions always notify: a duplicate resolved mail costs less than a
//! missing one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use storage::MembershipStore;
use tracing::debug;

use crate::{Alert, AlertError, AlertStatus};

/// What an alert means given the current membership state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventClass {
    /// First firing delivery since the last resolution
    NewFiring,
    /// Re-delivery of an alert that is already tracked
    RepeatFiring,
    /// Resolution of a tracked alert
    Resolved,
    /// Resolution of an alert that was never tracked
    ResolvedUnknown,
    /// Unrecognized status or missing fingerprint
    Unknown,
}

impl EventClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventClass::NewFiring => "new_firing",
            EventClass::RepeatFiring => "repeat_firing",
            EventClass::Resolved => "resolved",
            EventClass::ResolvedUnknown => "resolved_unknown",
            EventClass::Unknown => "unknown",
        }
    }

    /// Whether this event triggers a notification
    pub fn should_notify(&self) -> bool {
        matches!(
            self,
            EventClass::NewFiring | EventClass::Resolved | EventClass::ResolvedUnknown
        )
    }
}

impl fmt::Display for EventClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier decision for one alert
#[derive(Debug)]
pub struct Classification {
    pub event: EventClass,
    pub should_notify: bool,
    /// Why the alert was skipped, for [`EventClass::Unknown`]
    pub violation: Option<AlertError>,
}

impl Classification {
    fn rejected(alert: &Alert, detail: String) -> Self {
        Self {
            event: EventClass::Unknown,
            should_notify: false,
            violation: Some(AlertError::ProtocolViolation {
                fingerprint: alert.fingerprint.clone(),
                detail,
            }),
        }
    }
}

impl From<EventClass> for Classification {
    fn from(event: EventClass) -> Self {
        Self {
            event,
            should_notify: event.should_notify(),
            violation: None,
        }
    }
}

/// Decides the event class of an alert and applies the store mutation
#[derive(Clone)]
pub struct TransitionClassifier {
    store: Arc<dyn MembershipStore>,
}

impl TransitionClassifier {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// Classify one alert.
    ///
    /// A blank fingerprint or unrecognized status yields
    /// [`EventClass::Unknown`] with the violation attached and no store
    /// access. A store failure is returned as an error and never as a guess
    /// about membership; the caller must treat it as "do not notify".
    pub async fn classify(&self, alert: &Alert) -> Result<Classification, AlertError> {
        let fingerprint = alert.fingerprint.as_str();
        if fingerprint.trim().is_empty() {
            return Ok(Classification::rejected(alert, "missing fingerprint".to_string()));
        }

        let event = match &alert.status {
            AlertStatus::Firing => self.on_firing(fingerprint).await?,
            AlertStatus::Resolved => self.on_resolved(fingerprint).await?,
            AlertStatus::Unrecognized(raw) => {
                return Ok(Classification::rejected(
                    alert,
                    format!("unrecognized status {:?}", raw),
                ));
            }
        };
        Ok(event.into())
    }

    async fn on_firing(&self, fingerprint: &str) -> Result<EventClass, AlertError> {
        if self.store.exists(fingerprint).await? {
            debug!("Alert {} already tracked", fingerprint);
            return Ok(EventClass::RepeatFiring);
        }

        // A concurrent delivery may have marked it since the lookup
        if self.store.mark(fingerprint).await? {
            Ok(EventClass::NewFiring)
        } else {
            debug!("Alert {} marked concurrently", fingerprint);
            Ok(EventClass::RepeatFiring)
        }
    }

    async fn on_resolved(&self, fingerprint: &str) -> Result<EventClass, AlertError> {
        if self.store.clear(fingerprint).await? {
            Ok(EventClass::Resolved)
        } else {
            Ok(EventClass::ResolvedUnknown)
        }
    }
}
