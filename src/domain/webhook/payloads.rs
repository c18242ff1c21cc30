//! Typed views over the polymorphic `data.object` of a Stripe event.
//!
//! Each struct captures only the fields the reconcilers read; unknown
//! fields are ignored on deserialization.

use serde::Deserialize;
use std::collections::HashMap;

/// `data.object` of a `checkout.session.completed` event.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    /// Checkout session id (cs_xxx).
    pub id: String,

    /// Stripe customer reference, when the session created/used one.
    #[serde(default)]
    pub customer: Option<String>,

    /// Subscription created by the session, for subscription-mode checkouts.
    #[serde(default)]
    pub subscription: Option<String>,

    /// Payment intent settled by the session, for payment-mode checkouts.
    #[serde(default)]
    pub payment_intent: Option<String>,

    /// Arbitrary key/value metadata attached at session creation.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionObject {
    /// Booking id carried in session metadata, if present.
    ///
    /// Accepts both `booking_id` and the legacy `bookingId` key.
    pub fn booking_id(&self) -> Option<&str> {
        self.metadata
            .get("booking_id")
            .or_else(|| self.metadata.get("bookingId"))
            .map(String::as_str)
    }
}

/// `data.object` of a `payment_intent.succeeded` event.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentObject {
    /// Payment intent id (pi_xxx).
    pub id: String,

    /// Stripe customer reference, if attached.
    #[serde(default)]
    pub customer: Option<String>,

    /// Arbitrary key/value metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// `data.object` of `invoice.payment_succeeded` / `invoice.payment_failed`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    /// Invoice id (in_xxx).
    pub id: String,

    /// Stripe customer the invoice was billed to.
    #[serde(default)]
    pub customer: Option<String>,

    /// Subscription the invoice belongs to, absent for one-off invoices.
    #[serde(default)]
    pub subscription: Option<String>,
}

/// `data.object` of `customer.subscription.*` events, and the shape
/// returned by the subscriptions API.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    /// Subscription id (sub_xxx).
    pub id: String,

    /// Owning Stripe customer.
    pub customer: String,

    /// Provider-side status string ("active", "past_due", "canceled", ...).
    pub status: String,

    /// Metadata carrying plan name and billing period.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SubscriptionObject {
    /// Plan name from subscription metadata, if present.
    pub fn plan(&self) -> Option<&str> {
        self.metadata.get("plan").map(String::as_str)
    }

    /// Billing period from subscription metadata ("monthly"/"yearly").
    ///
    /// Read for email copy only, never persisted.
    pub fn billing_period(&self) -> Option<&str> {
        self.metadata.get("billing_period").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn checkout_session_reads_booking_id_from_metadata() {
        let session: CheckoutSessionObject = serde_json::from_value(json!({
            "id": "cs_test_123",
            "customer": "cus_abc",
            "payment_intent": "pi_xyz",
            "metadata": {"booking_id": "4c8e9f3a-1111-2222-3333-444455556666"}
        }))
        .unwrap();

        assert_eq!(
            session.booking_id(),
            Some("4c8e9f3a-1111-2222-3333-444455556666")
        );
        assert_eq!(session.payment_intent.as_deref(), Some("pi_xyz"));
    }

    #[test]
    fn checkout_session_accepts_legacy_metadata_key() {
        let session: CheckoutSessionObject = serde_json::from_value(json!({
            "id": "cs_test_123",
            "metadata": {"bookingId": "abc"}
        }))
        .unwrap();

        assert_eq!(session.booking_id(), Some("abc"));
    }

    #[test]
    fn checkout_session_without_metadata() {
        let session: CheckoutSessionObject = serde_json::from_value(json!({
            "id": "cs_test_123"
        }))
        .unwrap();

        assert!(session.booking_id().is_none());
        assert!(session.customer.is_none());
        assert!(session.subscription.is_none());
    }

    #[test]
    fn invoice_without_subscription_is_one_off() {
        let invoice: InvoiceObject = serde_json::from_value(json!({
            "id": "in_123",
            "customer": "cus_abc"
        }))
        .unwrap();

        assert!(invoice.subscription.is_none());
    }

    #[test]
    fn subscription_reads_plan_metadata() {
        let sub: SubscriptionObject = serde_json::from_value(json!({
            "id": "sub_123",
            "customer": "cus_abc",
            "status": "active",
            "metadata": {"plan": "pro", "billing_period": "yearly"}
        }))
        .unwrap();

        assert_eq!(sub.plan(), Some("pro"));
        assert_eq!(sub.billing_period(), Some("yearly"));
    }

    #[test]
    fn subscription_without_metadata_has_no_plan() {
        let sub: SubscriptionObject = serde_json::from_value(json!({
            "id": "sub_123",
            "customer": "cus_abc",
            "status": "canceled"
        }))
        .unwrap();

        assert!(sub.plan().is_none());
        assert!(sub.billing_period().is_none());
    }

    #[test]
    fn payment_intent_ignores_extra_fields() {
        let intent: PaymentIntentObject = serde_json::from_value(json!({
            "id": "pi_123",
            "amount_received": 10000,
            "currency": "usd"
        }))
        .unwrap();

        assert_eq!(intent.id, "pi_123");
    }
}
