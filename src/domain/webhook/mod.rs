//! Stripe webhook domain: event envelope, signature verification, and
//! idempotent event processing.

mod errors;
mod event;
mod payloads;
mod processor;
mod verifier;

pub use errors::WebhookError;
pub use event::{EventType, StripeEvent, StripeEventData};
pub use payloads::{
    CheckoutSessionObject, InvoiceObject, PaymentIntentObject, SubscriptionObject,
};
pub use processor::{
    HandlerRegistry, IdempotentWebhookProcessor, WebhookDispatcher, WebhookEventHandler,
    WebhookProcessing,
};
pub use verifier::{SignatureHeader, WebhookVerifier};

#[cfg(test)]
pub use event::StripeEventBuilder;
