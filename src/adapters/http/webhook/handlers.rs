//! HTTP handler for inbound Stripe webhooks.
//!
//! The endpoint is public and unauthenticated; requests are accepted
//! solely on signature verification against the raw body. Response
//! semantics preserve the provider's binary retry contract:
//!
//! - `200 {"received": true}` - handled, or graceful no-op
//! - `400 {"error": "Invalid signature"}` - verification failure, no retry
//! - `500 {"error": ...}` - reconciliation failure, provider retries

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::webhook::{WebhookProcessing, WebhookVerifier};

/// Shared state for the webhook endpoint.
#[derive(Clone)]
pub struct WebhookAppState {
    pub verifier: Arc<WebhookVerifier>,
    pub processor: Arc<dyn WebhookProcessing>,
}

/// POST /webhooks/stripe
pub async fn handle_stripe_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Webhook request without Stripe-Signature header");
        return error_response(StatusCode::BAD_REQUEST, "Invalid signature");
    };

    // The raw body is verified unparsed; any re-serialization would
    // break the signature.
    let event = match state.verifier.verify_and_parse(&body, signature) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(error = %err, "Webhook verification failed");
            return error_response(err.status_code(), &err.to_string());
        }
    };

    tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Webhook verified");

    match state.processor.process_event(event).await {
        Ok(_) => (StatusCode::OK, Json(json!({"received": true}))).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Webhook processing failed");
            error_response(err.status_code(), &err.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::webhook::{StripeEvent, WebhookError};
    use crate::ports::WebhookResult;
    use async_trait::async_trait;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TEST_SECRET: &str = "whsec_handler_test";

    struct MockProcessor {
        calls: AtomicU32,
        fail: bool,
    }

    impl MockProcessor {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl WebhookProcessing for MockProcessor {
        async fn process_event(
            &self,
            _event: StripeEvent,
        ) -> Result<WebhookResult, WebhookError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(WebhookError::Database("pool exhausted".to_string()))
            } else {
                Ok(WebhookResult::Processed)
            }
        }
    }

    fn signed_headers(payload: &str) -> HeaderMap {
        let timestamp = chrono::Utc::now().timestamp();
        let signed_payload = format!("{}.{}", timestamp, payload);
        let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SECRET.as_bytes()).unwrap();
        mac.update(signed_payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let mut headers = HeaderMap::new();
        headers.insert(
            "Stripe-Signature",
            format!("t={},v1={}", timestamp, signature).parse().unwrap(),
        );
        headers
    }

    fn event_payload() -> String {
        serde_json::json!({
            "id": "evt_http_test",
            "type": "checkout.session.completed",
            "created": chrono::Utc::now().timestamp(),
            "data": {"object": {}},
            "livemode": false,
            "api_version": "2023-10-16"
        })
        .to_string()
    }

    fn state(processor: Arc<MockProcessor>) -> WebhookAppState {
        WebhookAppState {
            verifier: Arc::new(WebhookVerifier::new(TEST_SECRET)),
            processor,
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn valid_webhook_returns_received_true() {
        let processor = Arc::new(MockProcessor::new());
        let payload = event_payload();
        let headers = signed_headers(&payload);

        let response = handle_stripe_webhook(
            State(state(processor.clone())),
            headers,
            Bytes::from(payload),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({"received": true}));
        assert_eq!(processor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_signature_header_is_rejected() {
        let processor = Arc::new(MockProcessor::new());

        let response = handle_stripe_webhook(
            State(state(processor.clone())),
            HeaderMap::new(),
            Bytes::from(event_payload()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(processor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn tampered_body_is_rejected_without_processing() {
        let processor = Arc::new(MockProcessor::new());
        let headers = signed_headers(&event_payload());

        let response = handle_stripe_webhook(
            State(state(processor.clone())),
            headers,
            Bytes::from(r#"{"id":"evt_forged"}"#),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid signature");
        assert_eq!(processor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn processing_failure_returns_500_for_retry() {
        let processor = Arc::new(MockProcessor::failing());
        let payload = event_payload();
        let headers = signed_headers(&payload);

        let response =
            handle_stripe_webhook(State(state(processor)), headers, Bytes::from(payload)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("pool exhausted"));
    }
}
