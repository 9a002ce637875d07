//! Alert Webhook Route

use alerting::WebhookPayload;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::AppState;

/// Receive an Alertmanager webhook batch.
///
/// Classifies every alert, queues the notify set, and answers `Success`.
/// A store failure on some alerts is logged; the sender still gets 200.
///
/// Classification and queueing run on their own task, so a dropped request
/// still queues a notification for every membership change it committed.
pub async fn receive_alerts(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            metrics::counter!("webhook_requests_total", "result" => "rejected").increment(1);
            warn!("Rejected webhook body: {}", rejection.body_text());
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response();
        }
    };

    info!(
        "Received {} alerts (receiver: {:?}, group: {:?})",
        payload.alerts.len(),
        payload.receiver,
        payload.group_key
    );

    let batch = tokio::spawn(async move {
        let report = state.processor.process(&payload.alerts).await;
        if let Some(error) = report.partial_failure() {
            warn!("{}", error);
        }
        state.dispatcher.dispatch_all(report.intents).await
    });

    match batch.await {
        Ok(queued) => {
            metrics::counter!("webhook_requests_total", "result" => "accepted").increment(1);
            info!("Queued {} notifications", queued);
            (StatusCode::OK, "Success").into_response()
        }
        Err(e) => {
            metrics::counter!("webhook_requests_total", "result" => "failed").increment(1);
            error!("Batch processing task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Batch processing failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{test_state, test_state_over, ChannelNotifier, StallingStore};
    use crate::create_router;
    use alerting::EventClass;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use storage::MembershipStore;
    use tower::ServiceExt;

    fn batch(status: &str, fingerprints: &[&str]) -> String {
        let alerts: Vec<String> = fingerprints
            .iter()
            .map(|fp| {
                format!(
                    r#"{{"status":"{}","labels":{{"alertname":"HighCPU","severity":"critical"}},"fingerprint":"{}"}}"#,
                    status, fp
                )
            })
            .collect();
        format!(r#"{{"receiver":"mail","status":"{}","alerts":[{}]}}"#, status, alerts.join(","))
    }

    fn post(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/alert")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_firing_then_redelivery_then_resolve() {
        let (notifier, mut rx) = ChannelNotifier::new();
        let (state, _store) = test_state(Arc::new(notifier));
        let app = create_router(state);

        let response = app.clone().oneshot(post(batch("firing", &["a", "b"]))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Success");

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.alert.fingerprint, "a");
        assert_eq!(second.alert.fingerprint, "b");
        assert_eq!(first.reason, EventClass::NewFiring);

        // Redelivery of the same firing alerts queues nothing
        app.clone().oneshot(post(batch("firing", &["a", "b"]))).await.unwrap();

        app.clone().oneshot(post(batch("resolved", &["a"]))).await.unwrap();
        let next = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.alert.fingerprint, "a");
        assert_eq!(next.reason, EventClass::Resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_request_still_notifies_committed_alerts() {
        let store = Arc::new(StallingStore::new("b", Duration::from_secs(60)));
        let (notifier, mut rx) = ChannelNotifier::new();
        let state = test_state_over(store.clone(), Arc::new(notifier));
        let app = create_router(state);

        // The client gives up while "b" is still being looked up
        let request = app.clone().oneshot(post(batch("firing", &["a", "b"])));
        assert!(tokio::time::timeout(Duration::from_secs(1), request).await.is_err());
        assert!(store.exists("a").await.unwrap());

        let first = rx.recv().await.unwrap();
        assert_eq!(first.alert.fingerprint, "a");
        assert_eq!(first.reason, EventClass::NewFiring);
        assert_eq!(rx.recv().await.unwrap().alert.fingerprint, "b");

        // Redelivery is a repeat and queues nothing more
        app.oneshot(post(batch("firing", &["a"]))).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (notifier, _rx) = ChannelNotifier::new();
        let (state, _store) = test_state(Arc::new(notifier));
        let app = create_router(state);

        let response = app.oneshot(post("{not json".to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_status_is_accepted_but_not_notified() {
        let (notifier, mut rx) = ChannelNotifier::new();
        let (state, store) = test_state(Arc::new(notifier));
        let app = create_router(state);

        let response = app.clone().oneshot(post(batch("flapping", &["x"]))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!store.exists("x").await.unwrap());

        app.oneshot(post(batch("firing", &["y"]))).await.unwrap();
        let next = rx.recv().await.unwrap();
        assert_eq!(next.alert.fingerprint, "y");
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_membership() {
        let (notifier, mut rx) = ChannelNotifier::failing();
        let (state, store) = test_state(Arc::new(notifier));
        let app = create_router(state);

        app.clone().oneshot(post(batch("firing", &["a"]))).await.unwrap();
        // The notifier saw it once and failed
        assert_eq!(rx.recv().await.unwrap().alert.fingerprint, "a");
        assert!(store.exists("a").await.unwrap());

        // Redelivery is still a repeat: no second attempt
        app.clone().oneshot(post(batch("firing", &["a"]))).await.unwrap();
        app.oneshot(post(batch("firing", &["b"]))).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().alert.fingerprint, "b");
    }
}
