//! PostgreSQL implementation of DirectoryReader.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{ClientId, DomainError, ServiceId};
use crate::ports::{ClientDetails, DirectoryReader, ServiceDetails};

/// PostgreSQL implementation of the DirectoryReader port.
pub struct PostgresDirectoryReader {
    pool: PgPool,
}

impl PostgresDirectoryReader {
    /// Creates a new reader with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: Uuid,
    name: String,
    email: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: Uuid,
    name: String,
    duration_minutes: i32,
}

#[async_trait]
impl DirectoryReader for PostgresDirectoryReader {
    async fn get_client(&self, id: &ClientId) -> Result<Option<ClientDetails>, DomainError> {
        let row: Option<ClientRow> =
            sqlx::query_as("SELECT id, name, email FROM clients WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find client: {}", e)))?;

        Ok(row.map(|r| ClientDetails {
            id: ClientId::from_uuid(r.id),
            name: r.name,
            email: r.email,
        }))
    }

    async fn get_service(&self, id: &ServiceId) -> Result<Option<ServiceDetails>, DomainError> {
        let row: Option<ServiceRow> =
            sqlx::query_as("SELECT id, name, duration_minutes FROM services WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find service: {}", e)))?;

        Ok(row.map(|r| ServiceDetails {
            id: ServiceId::from_uuid(r.id),
            name: r.name,
            duration_minutes: r.duration_minutes,
        }))
    }
}
