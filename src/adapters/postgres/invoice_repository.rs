//! PostgreSQL implementation of InvoiceRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::booking::{Invoice, InvoiceNumber};
use crate::domain::foundation::{BookingId, DomainError, InvoiceId, Money, Timestamp};
use crate::ports::{InvoiceInsert, InvoiceRepository};

/// PostgreSQL implementation of the InvoiceRepository port.
pub struct PostgresInvoiceRepository {
    pool: PgPool,
}

impl PostgresInvoiceRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an invoice.
#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    booking_id: Uuid,
    number: String,
    amount: Decimal,
    document_url: String,
    issued_at: DateTime<Utc>,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Invoice {
            id: InvoiceId::from_uuid(row.id),
            booking_id: BookingId::from_uuid(row.booking_id),
            number: InvoiceNumber::from_string(row.number),
            amount: Money::new(row.amount),
            document_url: row.document_url,
            issued_at: Timestamp::from_datetime(row.issued_at),
        }
    }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    async fn create(&self, invoice: &Invoice) -> Result<InvoiceInsert, DomainError> {
        // Unique index on booking_id makes the insert race-safe:
        // the loser's insert affects zero rows.
        let result = sqlx::query(
            r#"
            INSERT INTO invoices (id, booking_id, number, amount, document_url, issued_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (booking_id) DO NOTHING
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.booking_id.as_uuid())
        .bind(invoice.number.as_str())
        .bind(invoice.amount.amount())
        .bind(&invoice.document_url)
        .bind(invoice.issued_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to create invoice: {}", e)))?;

        if result.rows_affected() == 1 {
            Ok(InvoiceInsert::Created)
        } else {
            Ok(InvoiceInsert::AlreadyExists)
        }
    }

    async fn find_by_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Invoice>, DomainError> {
        let row: Option<InvoiceRow> = sqlx::query_as(
            r#"
            SELECT id, booking_id, number, amount, document_url, issued_at
            FROM invoices
            WHERE booking_id = $1
            "#,
        )
        .bind(booking_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find invoice: {}", e)))?;

        Ok(row.map(Invoice::from))
    }
}
