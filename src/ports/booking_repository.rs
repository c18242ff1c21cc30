//! BookingRepository port - booking lookup and the atomic paid claim.

use async_trait::async_trait;

use crate::domain::booking::{Booking, PaymentReference};
use crate::domain::foundation::{BookingId, DomainError};

/// Outcome of attempting to claim a booking's paid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaidClaim {
    /// This caller transitioned the booking to paid.
    Claimed,
    /// The booking was already paid; nothing changed.
    AlreadyPaid,
}

/// Port for booking persistence.
///
/// Concurrent webhook deliveries race on the paid transition. The
/// transition is therefore expressed as a single conditional update
/// (`... WHERE payment_status <> 'PAID'`), never as read-then-write.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Find a booking by its id.
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, DomainError>;

    /// Find a booking by its stored checkout session reference.
    async fn find_by_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Booking>, DomainError>;

    /// Find a booking by its stored payment intent reference.
    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Booking>, DomainError>;

    /// Atomically transition a booking to paid/confirmed and store the
    /// external payment reference.
    ///
    /// Exactly one concurrent caller observes `PaidClaim::Claimed`; all
    /// others observe `PaidClaim::AlreadyPaid`. This is the idempotency
    /// gate that prevents double invoicing and double earnings accrual.
    async fn claim_paid_transition(
        &self,
        id: &BookingId,
        reference: PaymentReference,
    ) -> Result<PaidClaim, DomainError>;
}
