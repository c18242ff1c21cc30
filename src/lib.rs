//! Chairside - Salon Booking & Payment Reconciliation Backend
//!
//! This crate implements the payment-reconciliation subsystem of the
//! Chairside booking platform: Stripe webhook verification, idempotent
//! event processing, and booking/subscription state reconciliation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
