//! Mailer port - transactional email delivery.
//!
//! All sends from the reconcilers are fire-and-forget: failure is
//! logged, never propagated as a reconciliation failure.

use async_trait::async_trait;
use thiserror::Error;

/// An email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    /// Recipient address.
    pub to: String,

    /// Subject line.
    pub subject: String,

    /// Rendered HTML body.
    pub html: String,
}

impl Email {
    /// Creates an email with the given recipient and subject.
    pub fn new(to: impl Into<String>, subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html: html.into(),
        }
    }
}

/// Errors from email delivery.
#[derive(Debug, Error)]
pub enum MailerError {
    /// Network-level failure reaching the email provider.
    #[error("Email request failed: {0}")]
    Request(String),

    /// Provider answered with a non-success status.
    #[error("Email provider returned status {status}: {body}")]
    Api { status: u16, body: String },
}

/// Port for sending transactional email.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one email.
    async fn send(&self, email: &Email) -> Result<(), MailerError>;
}
