//! PaymentProvider port - read-only payment provider API access.
//!
//! The reconcilers call the provider only to fetch subscription
//! metadata when an event payload doesn't already carry it. All write
//! operations against the provider live in the checkout flow, outside
//! this subsystem.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::webhook::SubscriptionObject;

/// Errors from payment provider API calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network-level failure reaching the provider.
    #[error("Provider request failed: {0}")]
    Request(String),

    /// Provider answered with a non-success status.
    #[error("Provider returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// Provider response could not be decoded.
    #[error("Provider response decode failed: {0}")]
    Decode(String),
}

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Fetch a subscription by its provider id.
    ///
    /// Returns `None` when the subscription does not exist.
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionObject>, ProviderError>;
}
