//! WebhookEventRepository port - ledger of processed Stripe webhooks.
//!
//! Enables idempotent webhook handling by tracking which provider events
//! have been processed, with the full payload retained for auditing.
//!
//! ## Why webhook idempotency matters
//!
//! Stripe delivers at-least-once. The same event arrives again after
//! network timeouts, 5xx responses from this endpoint, or a success
//! response the provider never received. Every handler must be
//! idempotent, and the ledger's PRIMARY KEY on event id resolves
//! concurrent duplicate deliveries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::DomainError;

/// Record of a processed webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Stripe event ID (evt_xxx format).
    pub event_id: String,

    /// Type of Stripe event (e.g., "checkout.session.completed").
    pub event_type: String,

    /// When the event was processed.
    pub processed_at: DateTime<Utc>,

    /// Result of processing: "success", "ignored", or "failed".
    pub result: String,

    /// Error message if processing failed or was ignored.
    pub error_message: Option<String>,

    /// Original event payload for debugging.
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    /// Creates a new success record.
    pub fn success(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            result: "success".to_string(),
            error_message: None,
            payload,
        }
    }

    /// Creates a new ignored record.
    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            result: "ignored".to_string(),
            error_message: Some(reason.into()),
            payload,
        }
    }

    /// Creates a new failure record.
    pub fn failed(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        error: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            result: "failed".to_string(),
            error_message: Some(error.into()),
            payload,
        }
    }
}

/// Result of attempting to save a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was inserted (first time seeing this event).
    Inserted,
    /// Record already exists (duplicate event).
    AlreadyExists,
}

/// Result of webhook processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookResult {
    /// Event was processed successfully.
    Processed,
    /// Event was already processed (idempotent skip).
    AlreadyProcessed,
}

/// Port for storing and retrieving processed webhook events.
///
/// Implementations must use a database constraint (PRIMARY KEY on
/// event_id) so concurrent webhook deliveries cannot both insert.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Find a previously processed event by its Stripe event ID.
    ///
    /// Returns `None` if the event hasn't been processed yet.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Attempt to save a webhook event record.
    ///
    /// Uses `ON CONFLICT DO NOTHING` semantics: returns
    /// `SaveResult::Inserted` for the first writer and
    /// `SaveResult::AlreadyExists` for everyone who lost the race.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Delete records older than the specified timestamp.
    ///
    /// Returns the number of records deleted. Used for the retention
    /// policy (e.g. keep 30 days).
    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError>;
}
