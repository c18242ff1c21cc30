//! InvoiceRepository port - exactly-once invoice persistence.

use async_trait::async_trait;

use crate::domain::booking::Invoice;
use crate::domain::foundation::{BookingId, DomainError};

/// Result of attempting to insert an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceInsert {
    /// The invoice row was created.
    Created,
    /// An invoice already exists for this booking; nothing changed.
    AlreadyExists,
}

/// Port for invoice persistence.
///
/// A booking has at most one invoice; the database enforces a unique
/// constraint on `booking_id` and inserts use conflict-ignore semantics.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Insert an invoice unless one already exists for the booking.
    async fn create(&self, invoice: &Invoice) -> Result<InvoiceInsert, DomainError>;

    /// Find the invoice issued for a booking, if any.
    async fn find_by_booking(&self, booking_id: &BookingId)
        -> Result<Option<Invoice>, DomainError>;
}
