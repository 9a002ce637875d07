//! Alerting System
//!
//! Decides, per incoming alert, whether it is a new firing event, a repeat of
//! one already notified, or a resolution. The decision is backed by a
//! [`storage::MembershipStore`] so that re-delivered firing alerts do not
//! produce duplicate notifications.

mod classifier;
mod error;
mod model;
mod processor;

#[cfg(test)]
mod testing;

pub use classifier::{Classification, EventClass, TransitionClassifier};
pub use error::AlertError;
pub use model::{Alert, AlertStatus, NotificationIntent, WebhookPayload};
pub use processor::{AlertFailure, AlertOutcome, BatchProcessor, BatchReport};
