//! Stripe webhook HTTP endpoint.

mod handlers;
mod routes;

pub use handlers::{handle_stripe_webhook, WebhookAppState};
pub use routes::webhook_routes;
