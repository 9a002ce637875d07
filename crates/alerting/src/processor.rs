//! Batch Processor
//!
//! Runs the classifier over every alert of a webhook batch, in input order,
//! and collects the alerts to notify. A store failure on one alert is
//! recorded and the rest of the batch is still processed.
//!
//! Dropping the future returned by [`BatchProcessor::process`] stops at the
//! current alert; store mutations already applied stay applied.

use std::sync::Arc;
use storage::MembershipStore;
use tracing::{debug, info, warn};

use crate::{Alert, AlertError, EventClass, NotificationIntent, TransitionClassifier};

/// Result of classifying one alert of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertOutcome {
    /// Position in the batch
    pub index: usize,
    pub fingerprint: String,
    /// `None` when classification failed
    pub event: Option<EventClass>,
}

/// An alert whose classification failed
#[derive(Debug)]
pub struct AlertFailure {
    pub index: usize,
    pub fingerprint: String,
    pub error: AlertError,
}

/// Everything learned from one batch
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Alerts to notify, in input order
    pub intents: Vec<NotificationIntent>,
    /// One entry per input alert
    pub outcomes: Vec<AlertOutcome>,
    /// Alerts skipped as protocol violations
    pub violations: Vec<AlertError>,
    /// Alerts whose store calls failed
    pub failures: Vec<AlertFailure>,
}

impl BatchReport {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            intents: Vec::with_capacity(capacity),
            outcomes: Vec::with_capacity(capacity),
            violations: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Number of alerts in the batch
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of alerts that will be notified
    pub fn notify_count(&self) -> usize {
        self.intents.len()
    }

    /// Count outcomes of one event class
    pub fn count_of(&self, event: EventClass) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.event == Some(event))
            .count()
    }

    /// [`AlertError::PartialBatchFailure`] if any alert failed
    pub fn partial_failure(&self) -> Option<AlertError> {
        if self.failures.is_empty() {
            None
        } else {
            Some(AlertError::PartialBatchFailure {
                failed: self.failures.len(),
                total: self.total(),
            })
        }
    }
}

/// Classifies whole webhook batches against a shared membership store
#[derive(Clone)]
pub struct BatchProcessor {
    classifier: TransitionClassifier,
}

impl BatchProcessor {
    /// Create a processor over an injected store
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        info!("Creating batch processor with {} store", store.backend());
        Self {
            classifier: TransitionClassifier::new(store),
        }
    }

    /// Classify every alert of `alerts` and collect the notify set
    pub async fn process(&self, alerts: &[Alert]) -> BatchReport {
        let mut report = BatchReport::with_capacity(alerts.len());

        for (index, alert) in alerts.iter().enumerate() {
            let event = match self.classifier.classify(alert).await {
                Ok(mut classification) => {
                    let event = classification.event;
                    metrics::counter!("alert_classifications_total", "event" => event.as_str())
                        .increment(1);

                    match event {
                        EventClass::NewFiring => {
                            info!("New alert {} is firing ({})", alert.alert_name(), alert.fingerprint)
                        }
                        EventClass::Resolved | EventClass::ResolvedUnknown => {
                            info!("Alert {} is resolved ({})", alert.alert_name(), alert.fingerprint)
                        }
                        EventClass::RepeatFiring => {
                            debug!("Alert {} still firing, suppressed", alert.alert_name())
                        }
                        EventClass::Unknown => {
                            if let Some(violation) = classification.violation.take() {
                                warn!("Skipping alert: {} ({:?})", violation, alert);
                                report.violations.push(violation);
                            }
                        }
                    }

                    if classification.should_notify {
                        report
                            .intents
                            .push(NotificationIntent::new(alert.clone(), event));
                    }
                    Some(event)
                }
                Err(error) => {
                    metrics::counter!("alert_store_failures_total").increment(1);
                    warn!(
                        "Failed to classify alert {} ({}): {}",
                        alert.alert_name(),
                        alert.fingerprint,
                        error
                    );
                    report.failures.push(AlertFailure {
                        index,
                        fingerprint: alert.fingerprint.clone(),
                        error,
                    });
                    None
                }
            };

            report.outcomes.push(AlertOutcome {
                index,
                fingerprint: alert.fingerprint.clone(),
                event,
            });
        }

        debug!(
            "Processed batch of {} alerts: {} to notify, {} failed",
            report.total(),
            report.notify_count(),
            report.failures.len()
        );
        report
    }
}
