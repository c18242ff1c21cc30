//! Axum router for the webhook endpoint.
//!
//! Webhooks are kept on their own router because they carry no user
//! authentication; requests are authenticated by signature instead.

use axum::{routing::post, Router};

use super::handlers::{handle_stripe_webhook, WebhookAppState};

/// Create the webhook router.
///
/// # Routes
/// - `POST /stripe` - Handle Stripe webhooks
///
/// Mount under `/webhooks`:
///
/// ```ignore
/// let app = Router::new()
///     .nest("/webhooks", webhook_routes())
///     .with_state(webhook_state);
/// ```
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}
