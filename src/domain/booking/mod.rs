//! Booking domain: appointment aggregate and invoice artifacts.

mod aggregate;
mod invoice;

pub use aggregate::{Booking, BookingStatus, PaymentReference, PaymentStatus};
pub use invoice::{Invoice, InvoiceNumber};

#[cfg(test)]
pub use aggregate::test_support;
