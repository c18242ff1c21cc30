//! Invoice document adapters.

mod html_generator;

pub use html_generator::HtmlInvoiceGenerator;
