//! Console mailer for development.
//!
//! Logs emails instead of sending them. Body content is redacted by
//! default: stdout is often captured by log shippers, and email bodies
//! can carry personal data.

use async_trait::async_trait;

use crate::ports::{Email, Mailer, MailerError};

/// A mailer that logs emails instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct ConsoleMailer {
    /// Whether to log full email bodies (development only).
    show_full_content: bool,
}

impl ConsoleMailer {
    /// Create a new console mailer with redacted bodies.
    pub fn new() -> Self {
        Self {
            show_full_content: false,
        }
    }

    /// Enable full body output. Development only.
    pub fn with_full_output(mut self) -> Self {
        tracing::warn!("ConsoleMailer: full output enabled, email bodies will appear in logs");
        self.show_full_content = true;
        self
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        if self.show_full_content {
            tracing::info!(
                to = %email.to,
                subject = %email.subject,
                body = %email.html,
                "[EMAIL] would send"
            );
        } else {
            tracing::info!(
                to = %email.to,
                subject = %email.subject,
                body_bytes = email.html.len(),
                "[EMAIL] would send (body redacted)"
            );
        }
        Ok(())
    }
}
