//! HTML invoice generator.
//!
//! Renders an invoice as a standalone HTML document and writes it under
//! the configured storage directory. Rendering the same invoice number
//! again overwrites the artifact and returns the same URL, so retried
//! reconciliations never produce a second document.

use async_trait::async_trait;

use crate::config::DocumentsConfig;
use crate::ports::{DocumentError, InvoiceDetails, InvoiceDocumentGenerator};

/// Invoice generator writing HTML artifacts to local storage.
pub struct HtmlInvoiceGenerator {
    storage_dir: std::path::PathBuf,
    public_base: String,
}

impl HtmlInvoiceGenerator {
    /// Create a generator from documents configuration and the
    /// deployment's public base URL.
    pub fn new(config: &DocumentsConfig, public_base_url: &str) -> Self {
        let public_base = format!(
            "{}{}",
            public_base_url.trim_end_matches('/'),
            &config.public_path
        );
        Self {
            storage_dir: std::path::PathBuf::from(&config.storage_dir),
            public_base,
        }
    }

    fn render(details: &InvoiceDetails) -> String {
        format!(
            "<!DOCTYPE html>\n\
             <html>\n<head><meta charset=\"utf-8\"><title>Invoice {number}</title></head>\n\
             <body>\n\
             <h1>{business}</h1>\n\
             <h2>Invoice {number}</h2>\n\
             <table>\n\
             <tr><td>Billed to</td><td>{client}</td></tr>\n\
             <tr><td>Service</td><td>{service}</td></tr>\n\
             <tr><td>Amount</td><td>{amount}</td></tr>\n\
             <tr><td>Booking</td><td>{booking}</td></tr>\n\
             </table>\n\
             </body>\n</html>\n",
            number = details.number,
            business = details.business_name,
            client = details.client_name,
            service = details.service_name,
            amount = details.amount,
            booking = details.booking_id,
        )
    }

    fn file_name(details: &InvoiceDetails) -> String {
        format!("{}.html", details.number)
    }
}

#[async_trait]
impl InvoiceDocumentGenerator for HtmlInvoiceGenerator {
    async fn generate(&self, details: &InvoiceDetails) -> Result<String, DocumentError> {
        let html = Self::render(details);
        let file_name = Self::file_name(details);
        let path = self.storage_dir.join(&file_name);

        tokio::fs::create_dir_all(&self.storage_dir)
            .await
            .map_err(|e| DocumentError::Storage(e.to_string()))?;
        tokio::fs::write(&path, html)
            .await
            .map_err(|e| DocumentError::Storage(e.to_string()))?;

        let url = format!("{}/{}", self.public_base, file_name);
        tracing::debug!(invoice = %details.number, %url, "Invoice document written");
        Ok(url)
    }
}
