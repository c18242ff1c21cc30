//! Webhook error types.
//!
//! All error conditions that can occur during webhook processing, with
//! HTTP status code mapping and retryability semantics.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is outside the acceptable window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required metadata field missing from webhook event.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// Required field missing from webhook payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Event was acknowledged without action (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Outbound payment provider API call failed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Invoice document generation failed.
    #[error("Document error: {0}")]
    Document(String),
}

impl WebhookError {
    /// Returns true if Stripe should retry delivering this webhook.
    ///
    /// Retryable errors indicate temporary failures that may succeed on
    /// subsequent attempts.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Database(_) | WebhookError::Provider(_) | WebhookError::Document(_)
        )
    }

    /// Maps the error to an appropriate HTTP status code.
    ///
    /// Status codes determine Stripe's retry behavior:
    /// - 2xx: event acknowledged, no retry
    /// - 4xx: client error, no retry
    /// - 5xx: server error, will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Verification failures are terminal: the request is not
            // provably from the provider, so reject without retry.
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::MissingMetadata(_)
            | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,

            // Ignored events are acknowledged as success
            WebhookError::Ignored(_) => StatusCode::OK,

            // Server errors trigger a provider retry
            WebhookError::Database(_)
            | WebhookError::Provider(_)
            | WebhookError::Document(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
