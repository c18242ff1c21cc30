//! InvoiceDocumentGenerator port - invoice artifact rendering.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::booking::InvoiceNumber;
use crate::domain::foundation::{BookingId, Money};

/// Everything the generator needs to render one invoice document.
#[derive(Debug, Clone)]
pub struct InvoiceDetails {
    pub booking_id: BookingId,
    pub number: InvoiceNumber,
    pub business_name: String,
    pub client_name: String,
    pub service_name: String,
    pub amount: Money,
}

/// Errors from invoice document generation.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The artifact could not be written to storage.
    #[error("Document storage failed: {0}")]
    Storage(String),

    /// The document could not be rendered from the details.
    #[error("Document rendering failed: {0}")]
    Render(String),
}

/// Port for generating invoice document artifacts.
///
/// # Contract
///
/// `generate` must be safe to call again for the same invoice number:
/// re-rendering overwrites the previous artifact and returns the same
/// URL, so a retried reconciliation never produces a second document.
#[async_trait]
pub trait InvoiceDocumentGenerator: Send + Sync {
    /// Render the invoice and store it, returning the document URL.
    async fn generate(&self, details: &InvoiceDetails) -> Result<String, DocumentError>;
}
