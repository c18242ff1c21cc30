//! Invoice entity and invoice number scheme.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{BookingId, InvoiceId, Money, Timestamp};

/// Human-legible, unique invoice number.
///
/// Format: `INV-<YYYYMMDD>-<booking fragment>`. The booking-id fragment
/// makes numbers collision-free across concurrently reconciled bookings,
/// since a booking has at most one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    /// Generates the invoice number for a booking paid at `issued_at`.
    pub fn generate(issued_at: Timestamp, booking_id: BookingId) -> Self {
        Self(format!(
            "INV-{}-{}",
            issued_at.compact_date(),
            booking_id.short().to_uppercase()
        ))
    }

    /// Wraps an existing invoice number (e.g. loaded from storage).
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Invoice issued for a paid booking.
///
/// Exactly one per booking; the database enforces uniqueness on
/// `booking_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier.
    pub id: InvoiceId,

    /// Booking this invoice belongs to.
    pub booking_id: BookingId,

    /// Human-legible invoice number.
    pub number: InvoiceNumber,

    /// Invoiced amount (the booking total).
    pub amount: Money,

    /// URL of the generated document artifact.
    pub document_url: String,

    /// When the invoice was issued.
    pub issued_at: Timestamp,
}

impl Invoice {
    /// Creates an invoice for a paid booking.
    ///
    /// The number is generated up front (see [`InvoiceNumber::generate`])
    /// because the document artifact is rendered before the row is
    /// persisted.
    pub fn issue(
        booking_id: BookingId,
        number: InvoiceNumber,
        amount: Money,
        document_url: impl Into<String>,
    ) -> Self {
        Self {
            id: InvoiceId::new(),
            booking_id,
            number,
            amount,
            document_url: document_url.into(),
            issued_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_number_format() {
        let issued_at = Timestamp::from_unix_secs(1705276800); // 2024-01-15
        let booking_id = BookingId::new();
        let number = InvoiceNumber::generate(issued_at, booking_id);

        let expected_prefix = "INV-20240115-";
        assert!(number.as_str().starts_with(expected_prefix));
        assert_eq!(number.as_str().len(), expected_prefix.len() + 8);
    }

    #[test]
    fn invoice_numbers_differ_per_booking() {
        let issued_at = Timestamp::from_unix_secs(1705276800);
        let a = InvoiceNumber::generate(issued_at, BookingId::new());
        let b = InvoiceNumber::generate(issued_at, BookingId::new());

        assert_ne!(a, b);
    }

    #[test]
    fn issue_builds_invoice_for_booking() {
        let booking_id = BookingId::new();
        let number = InvoiceNumber::generate(Timestamp::now(), booking_id);
        let invoice = Invoice::issue(
            booking_id,
            number.clone(),
            Money::from_major_minor(65, 0),
            "https://chairside.app/invoices/inv.html",
        );

        assert_eq!(invoice.booking_id, booking_id);
        assert_eq!(invoice.amount, Money::from_major_minor(65, 0));
        assert_eq!(invoice.number, number);
    }

    #[test]
    fn invoice_number_serializes_transparently() {
        let number = InvoiceNumber::from_string("INV-20240115-ABCDEF01");
        let json = serde_json::to_string(&number).unwrap();
        assert_eq!(json, "\"INV-20240115-ABCDEF01\"");
    }
}
