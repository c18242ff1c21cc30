//! Adapters - implementations of the ports against real infrastructure.
//!
//! - `postgres` - sqlx/PostgreSQL persistence
//! - `stripe` - payment provider HTTP client
//! - `email` - Resend and console mailers, plus in-memory test double
//! - `documents` - invoice artifact rendering and storage
//! - `http` - Axum webhook endpoint

pub mod documents;
pub mod email;
pub mod http;
pub mod postgres;
pub mod stripe;
