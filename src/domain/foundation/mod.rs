//! Foundation value objects shared across the domain.

mod errors;
mod ids;
mod money;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use ids::{BookingId, BusinessId, ClientId, InvoiceId, ServiceId};
pub use money::Money;
pub use timestamp::Timestamp;
