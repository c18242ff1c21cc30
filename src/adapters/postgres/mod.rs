//! PostgreSQL adapters for the persistence ports.

mod booking_repository;
mod business_repository;
mod directory_reader;
mod invoice_repository;
mod webhook_event_repository;

pub use booking_repository::PostgresBookingRepository;
pub use business_repository::PostgresBusinessAccountRepository;
pub use directory_reader::PostgresDirectoryReader;
pub use invoice_repository::PostgresInvoiceRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;
