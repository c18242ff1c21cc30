//! Resend mailer - transactional email via the Resend HTTP API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::ports::{Email, Mailer, MailerError};

/// Resend API configuration.
#[derive(Clone)]
pub struct ResendConfig {
    /// Resend API key (re_...).
    api_key: SecretString,

    /// Formatted From header ("Name <address>").
    from: String,

    /// Base URL for the Resend API.
    api_base_url: String,
}

impl ResendConfig {
    /// Create a new configuration.
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            from: from.into(),
            api_base_url: "https://api.resend.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Mailer adapter delivering through Resend.
pub struct ResendMailer {
    config: ResendConfig,
    http_client: reqwest::Client,
}

impl ResendMailer {
    /// Create a new mailer with the given configuration.
    ///
    /// Sends carry a bounded timeout: slow email delivery may delay a
    /// webhook response, but never blocks it indefinitely.
    pub fn new(config: ResendConfig) -> Self {
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
impl Mailer for ResendMailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        let request = SendRequest {
            from: &self.config.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
        };

        let response = self
            .http_client
            .post(format!("{}/emails", self.config.api_base_url))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| MailerError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailerError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(to = %email.to, subject = %email.subject, "Email delivered");
        Ok(())
    }
}
