//! Stripe payment provider adapter.

mod client;

pub use client::{StripeClient, StripeClientConfig};
