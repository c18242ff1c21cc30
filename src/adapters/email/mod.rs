//! Email adapters for the Mailer port.
//!
//! - `ResendMailer` - delivers via the Resend HTTP API (production)
//! - `ConsoleMailer` - prints redacted emails to the log (development)

mod console;
mod resend;

pub use console::ConsoleMailer;
pub use resend::{ResendConfig, ResendMailer};
