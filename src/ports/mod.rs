//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `BookingRepository` - Booking lookup and the atomic paid-transition claim
//! - `BusinessAccountRepository` - Account lookup, subscription state, earnings accrual
//! - `InvoiceRepository` - Exactly-once invoice persistence
//! - `DirectoryReader` - Read-only client/service lookups for notifications
//! - `WebhookEventRepository` - Processed-event ledger for webhook idempotency
//!
//! ## Collaborator Ports
//!
//! - `PaymentProvider` - Read-only payment provider API (subscription metadata)
//! - `InvoiceDocumentGenerator` - Invoice artifact rendering
//! - `Mailer` - Transactional email delivery

mod booking_repository;
mod business_repository;
mod directory_reader;
mod invoice_generator;
mod invoice_repository;
mod mailer;
mod payment_provider;
mod webhook_event_repository;

pub use booking_repository::{BookingRepository, PaidClaim};
pub use business_repository::BusinessAccountRepository;
pub use directory_reader::{ClientDetails, DirectoryReader, ServiceDetails};
pub use invoice_generator::{DocumentError, InvoiceDetails, InvoiceDocumentGenerator};
pub use invoice_repository::{InvoiceInsert, InvoiceRepository};
pub use mailer::{Email, Mailer, MailerError};
pub use payment_provider::{PaymentProvider, ProviderError};
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult,
};
