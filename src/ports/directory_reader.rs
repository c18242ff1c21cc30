//! DirectoryReader port - read-only client/service lookups.
//!
//! Clients and services are owned by the booking-management flows; this
//! subsystem only reads display fields for invoices and email copy.

use async_trait::async_trait;

use crate::domain::foundation::{ClientId, DomainError, ServiceId};

/// Client display fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDetails {
    pub id: ClientId,
    pub name: String,
    pub email: String,
}

/// Service display fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDetails {
    pub id: ServiceId,
    pub name: String,
    pub duration_minutes: i32,
}

/// Port for reading client and service details.
#[async_trait]
pub trait DirectoryReader: Send + Sync {
    /// Look up a client by id.
    async fn get_client(&self, id: &ClientId) -> Result<Option<ClientDetails>, DomainError>;

    /// Look up a service by id.
    async fn get_service(&self, id: &ServiceId) -> Result<Option<ServiceDetails>, DomainError>;
}
