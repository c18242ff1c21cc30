//! Booking aggregate entity.
//!
//! A Booking is one scheduled appointment for a client at a business.
//! Bookings are created by the booking flow; this subsystem only
//! transitions them to paid/confirmed, exactly once.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    BookingId, BusinessId, ClientId, DomainError, ErrorCode, Money, ServiceId, Timestamp,
};

/// Payment state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// No successful payment recorded.
    Unpaid,
    /// Payment settled; invoice issued and earnings accrued.
    Paid,
}

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created, awaiting payment.
    Pending,
    /// Payment received, appointment confirmed.
    Confirmed,
    /// Appointment took place.
    Completed,
    /// Appointment cancelled.
    Cancelled,
}

/// External payment reference that identified a successful payment.
///
/// Stored on the booking for idempotent matching of later deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentReference {
    /// Checkout session id (cs_xxx).
    CheckoutSession(String),
    /// Payment intent id (pi_xxx).
    PaymentIntent(String),
}

/// Booking aggregate.
///
/// # Invariants
///
/// - The paid transition happens at most once; a second successful-payment
///   event for an already-paid booking is a no-op.
/// - `total` is a decimal currency amount; the platform fee split is
///   derived from it, never stored redundantly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier.
    pub id: BookingId,

    /// Business the appointment belongs to.
    pub business_id: BusinessId,

    /// Client who booked.
    pub client_id: ClientId,

    /// Booked service.
    pub service_id: ServiceId,

    /// Scheduled start.
    pub starts_at: Timestamp,

    /// Scheduled end.
    pub ends_at: Timestamp,

    /// Total amount charged for the appointment.
    pub total: Money,

    /// Payment state.
    pub payment_status: PaymentStatus,

    /// Lifecycle state.
    pub status: BookingStatus,

    /// Stripe payment intent reference, once known.
    pub payment_intent_ref: Option<String>,

    /// Stripe checkout session reference, once known.
    pub checkout_session_ref: Option<String>,

    /// When the booking was created.
    pub created_at: Timestamp,

    /// When the booking was last updated.
    pub updated_at: Timestamp,
}

impl Booking {
    /// True once the booking has been paid.
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Transition this booking to paid and confirmed.
    ///
    /// Stores the external reference that identified the payment so later
    /// deliveries of the same event match this booking.
    ///
    /// # Errors
    ///
    /// Returns `BookingAlreadyPaid` if the booking was paid before; callers
    /// treat that as the idempotent no-op case, not a failure.
    pub fn mark_paid(&mut self, reference: PaymentReference) -> Result<(), DomainError> {
        if self.is_paid() {
            return Err(DomainError::new(
                ErrorCode::BookingAlreadyPaid,
                format!("Booking {} is already paid", self.id),
            ));
        }

        match reference {
            PaymentReference::CheckoutSession(id) => self.checkout_session_ref = Some(id),
            PaymentReference::PaymentIntent(id) => self.payment_intent_ref = Some(id),
        }

        self.payment_status = PaymentStatus::Paid;
        self.status = BookingStatus::Confirmed;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Amount credited to the business when this booking is paid.
    pub fn earnings_delta(&self) -> Money {
        self.total.net_of_platform_fee()
    }
}
