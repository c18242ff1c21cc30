//! PostgreSQL implementation of BookingRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingStatus, PaymentReference, PaymentStatus};
use crate::domain::foundation::{
    BookingId, BusinessId, ClientId, DomainError, ErrorCode, Money, ServiceId, Timestamp,
};
use crate::ports::{BookingRepository, PaidClaim};

/// PostgreSQL implementation of the BookingRepository port.
pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a booking.
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    business_id: Uuid,
    client_id: Uuid,
    service_id: Uuid,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    total: Decimal,
    payment_status: String,
    status: String,
    payment_intent_ref: Option<String>,
    checkout_session_ref: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = DomainError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: BookingId::from_uuid(row.id),
            business_id: BusinessId::from_uuid(row.business_id),
            client_id: ClientId::from_uuid(row.client_id),
            service_id: ServiceId::from_uuid(row.service_id),
            starts_at: Timestamp::from_datetime(row.starts_at),
            ends_at: Timestamp::from_datetime(row.ends_at),
            total: Money::new(row.total),
            payment_status: parse_payment_status(&row.payment_status)?,
            status: parse_booking_status(&row.status)?,
            payment_intent_ref: row.payment_intent_ref,
            checkout_session_ref: row.checkout_session_ref,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_payment_status(s: &str) -> Result<PaymentStatus, DomainError> {
    match s {
        "UNPAID" => Ok(PaymentStatus::Unpaid),
        "PAID" => Ok(PaymentStatus::Paid),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payment status value: {}", s),
        )),
    }
}

fn parse_booking_status(s: &str) -> Result<BookingStatus, DomainError> {
    match s {
        "pending" => Ok(BookingStatus::Pending),
        "confirmed" => Ok(BookingStatus::Confirmed),
        "completed" => Ok(BookingStatus::Completed),
        "cancelled" => Ok(BookingStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid booking status value: {}", s),
        )),
    }
}

const SELECT_BOOKING: &str = r#"
    SELECT id, business_id, client_id, service_id, starts_at, ends_at,
           total, payment_status, status, payment_intent_ref,
           checkout_session_ref, created_at, updated_at
    FROM bookings
"#;

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, DomainError> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_BOOKING))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to find booking: {}", e))
                })?;

        row.map(Booking::try_from).transpose()
    }

    async fn find_by_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Booking>, DomainError> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("{} WHERE checkout_session_ref = $1", SELECT_BOOKING))
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to find booking: {}", e))
                })?;

        row.map(Booking::try_from).transpose()
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Booking>, DomainError> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("{} WHERE payment_intent_ref = $1", SELECT_BOOKING))
                .bind(payment_intent_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to find booking: {}", e))
                })?;

        row.map(Booking::try_from).transpose()
    }

    async fn claim_paid_transition(
        &self,
        id: &BookingId,
        reference: PaymentReference,
    ) -> Result<PaidClaim, DomainError> {
        let (payment_intent_ref, checkout_session_ref) = match reference {
            PaymentReference::PaymentIntent(pi) => (Some(pi), None),
            PaymentReference::CheckoutSession(cs) => (None, Some(cs)),
        };

        // Single conditional update: only one concurrent delivery can
        // move the row out of UNPAID.
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                payment_status = 'PAID',
                status = 'confirmed',
                payment_intent_ref = COALESCE($2, payment_intent_ref),
                checkout_session_ref = COALESCE($3, checkout_session_ref),
                updated_at = NOW()
            WHERE id = $1 AND payment_status <> 'PAID'
            "#,
        )
        .bind(id.as_uuid())
        .bind(payment_intent_ref)
        .bind(checkout_session_ref)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::database(format!("Failed to claim paid transition: {}", e))
        })?;

        if result.rows_affected() == 1 {
            Ok(PaidClaim::Claimed)
        } else {
            Ok(PaidClaim::AlreadyPaid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_payment_status_accepts_known_values() {
        assert_eq!(parse_payment_status("UNPAID").unwrap(), PaymentStatus::Unpaid);
        assert_eq!(parse_payment_status("PAID").unwrap(), PaymentStatus::Paid);
    }

    #[test]
    fn parse_payment_status_rejects_unknown_values() {
        assert!(parse_payment_status("paid").is_err());
        assert!(parse_payment_status("").is_err());
    }

    #[test]
    fn parse_booking_status_accepts_known_values() {
        assert_eq!(parse_booking_status("pending").unwrap(), BookingStatus::Pending);
        assert_eq!(parse_booking_status("confirmed").unwrap(), BookingStatus::Confirmed);
        assert_eq!(parse_booking_status("completed").unwrap(), BookingStatus::Completed);
        assert_eq!(parse_booking_status("cancelled").unwrap(), BookingStatus::Cancelled);
    }

    #[test]
    fn parse_booking_status_rejects_unknown_values() {
        assert!(parse_booking_status("Confirmed").is_err());
        assert!(parse_booking_status("done").is_err());
    }
}
