//! Stripe API client.
//!
//! Implements the `PaymentProvider` port. This subsystem only reads
//! from Stripe: subscription metadata is fetched when a webhook payload
//! doesn't already carry it. The API key is held in a
//! `secrecy::SecretString` so it never appears in debug output.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::webhook::SubscriptionObject;
use crate::ports::{PaymentProvider, ProviderError};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeClientConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for the Stripe API.
    api_base_url: String,
}

impl StripeClientConfig {
    /// Create a new configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Stripe API client implementing the `PaymentProvider` port.
pub struct StripeClient {
    config: StripeClientConfig,
    http_client: reqwest::Client,
}

impl StripeClient {
    /// Create a new client with the given configuration.
    ///
    /// The underlying HTTP client carries a bounded timeout so a slow
    /// provider cannot hold a webhook request past its delivery window.
    pub fn new(config: StripeClientConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionObject>, ProviderError> {
        let url = format!(
            "{}/v1/subscriptions/{}",
            self.config.api_base_url, subscription_id
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                subscription_id,
                status = status.as_u16(),
                "Stripe subscription fetch failed"
            );
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let subscription: SubscriptionObject = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(Some(subscription))
    }
}
