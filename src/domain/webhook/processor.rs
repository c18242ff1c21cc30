//! Idempotent webhook event processing.
//!
//! Coordination layer between verified Stripe events and the
//! reconcilers, ensuring each event takes effect exactly once.
//!
//! ## Processing steps
//!
//! 1. Check the processed-event ledger (idempotency)
//! 2. Dispatch to the handler registered for the event type
//! 3. Record the result (success, ignored, or failed)
//!
//! ## Race condition handling
//!
//! When the provider delivers the same event concurrently, the first
//! process to save its ledger record wins (PRIMARY KEY on event id);
//! the others observe `AlreadyExists` and acknowledge without acting.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult};

use super::errors::WebhookError;
use super::event::{EventType, StripeEvent};

/// Handler for one or more Stripe webhook event types.
///
/// Implementations are stateless reconcilers. A handler receives the
/// parsed event and performs the necessary domain operations; every
/// operation it performs must be safe to re-run.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// Returns the event type(s) this handler processes.
    fn handles(&self) -> Vec<EventType>;

    /// Handles the webhook event.
    ///
    /// Returns `Ok(())` on success,
    /// `Err(WebhookError::Ignored(_))` when the event should be
    /// acknowledged without action, and other `Err` variants for real
    /// failures (which make the provider retry).
    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError>;
}

/// Dispatches webhook events to the appropriate handler.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    /// Find a handler for the given event type.
    fn get_handler(&self, event_type: &EventType) -> Option<&dyn WebhookEventHandler>;

    /// Dispatch an event to its handler.
    ///
    /// Exactly one handler runs per event. Unknown or unregistered
    /// types resolve to `Ignored` so the provider never retries a
    /// harmless event forever.
    async fn dispatch(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let event_type = event.parsed_type();
        match self.get_handler(&event_type) {
            Some(handler) => handler.handle(event).await,
            None => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "No handler registered for event type, acknowledging"
                );
                Err(WebhookError::Ignored(format!(
                    "no handler for event type {}",
                    event.event_type
                )))
            }
        }
    }
}

/// Registry-backed dispatcher mapping event types to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EventType, Arc<dyn WebhookEventHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler for every event type it declares.
    ///
    /// A later registration for the same event type replaces the
    /// earlier one, preserving the one-handler-per-event invariant.
    pub fn register(mut self, handler: Arc<dyn WebhookEventHandler>) -> Self {
        for event_type in handler.handles() {
            self.handlers.insert(event_type, handler.clone());
        }
        self
    }
}

#[async_trait]
impl WebhookDispatcher for HandlerRegistry {
    fn get_handler(&self, event_type: &EventType) -> Option<&dyn WebhookEventHandler> {
        self.handlers.get(event_type).map(AsRef::as_ref)
    }
}

/// Processes webhook events with exactly-once guarantees.
///
/// Main entry point for webhook processing; coordinates the
/// processed-event ledger and the handler registry.
pub struct IdempotentWebhookProcessor<R: WebhookEventRepository, D: WebhookDispatcher> {
    repository: R,
    dispatcher: D,
}

impl<R: WebhookEventRepository, D: WebhookDispatcher> IdempotentWebhookProcessor<R, D> {
    /// Creates a new processor with the given ledger and dispatcher.
    pub fn new(repository: R, dispatcher: D) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Process a webhook event exactly once.
    ///
    /// # Returns
    ///
    /// - `Ok(WebhookResult::Processed)` - event took effect (or was ignored)
    /// - `Ok(WebhookResult::AlreadyProcessed)` - duplicate delivery, skipped
    /// - `Err(_)` - processing failed; the HTTP layer answers 500 so the
    ///   provider retries with the same event id
    pub async fn process(&self, event: StripeEvent) -> Result<WebhookResult, WebhookError> {
        if self.repository.find_by_event_id(&event.id).await?.is_some() {
            tracing::debug!(event_id = %event.id, "Duplicate webhook delivery, skipping");
            return Ok(WebhookResult::AlreadyProcessed);
        }

        let result = self.dispatcher.dispatch(&event).await;

        let payload = serde_json::to_value(&event)
            .map_err(|e| WebhookError::ParseError(format!("failed to serialize event: {}", e)))?;

        let record = match &result {
            Ok(()) => WebhookEventRecord::success(&event.id, &event.event_type, payload),
            Err(WebhookError::Ignored(reason)) => {
                WebhookEventRecord::ignored(&event.id, &event.event_type, reason, payload)
            }
            Err(e) => {
                WebhookEventRecord::failed(&event.id, &event.event_type, e.to_string(), payload)
            }
        };

        match self.repository.save(record).await? {
            SaveResult::Inserted => match result {
                Ok(()) => Ok(WebhookResult::Processed),
                // Ignored events are still "processed" for idempotency
                Err(WebhookError::Ignored(_)) => Ok(WebhookResult::Processed),
                Err(e) => Err(e),
            },
            SaveResult::AlreadyExists => {
                // Lost the race; another delivery already handled it
                Ok(WebhookResult::AlreadyProcessed)
            }
        }
    }
}

/// Object-safe view of webhook processing for the HTTP layer.
#[async_trait]
pub trait WebhookProcessing: Send + Sync {
    /// Process a verified event exactly once.
    async fn process_event(&self, event: StripeEvent) -> Result<WebhookResult, WebhookError>;
}

#[async_trait]
impl<R: WebhookEventRepository, D: WebhookDispatcher> WebhookProcessing
    for IdempotentWebhookProcessor<R, D>
{
    async fn process_event(&self, event: StripeEvent) -> Result<WebhookResult, WebhookError> {
        self.process(event).await
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}
