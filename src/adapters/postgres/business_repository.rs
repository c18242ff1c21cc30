//! PostgreSQL implementation of BusinessAccountRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::business::{BusinessAccount, Plan, SubscriptionStatus};
use crate::domain::foundation::{BusinessId, DomainError, ErrorCode, Money, Timestamp};
use crate::ports::BusinessAccountRepository;

/// PostgreSQL implementation of the BusinessAccountRepository port.
pub struct PostgresBusinessAccountRepository {
    pool: PgPool,
}

impl PostgresBusinessAccountRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a business account.
#[derive(Debug, sqlx::FromRow)]
struct BusinessAccountRow {
    id: Uuid,
    name: String,
    owner_email: String,
    stripe_customer_ref: String,
    stripe_subscription_ref: Option<String>,
    plan: String,
    subscription_status: Option<String>,
    total_earnings: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BusinessAccountRow> for BusinessAccount {
    type Error = DomainError;

    fn try_from(row: BusinessAccountRow) -> Result<Self, Self::Error> {
        Ok(BusinessAccount {
            id: BusinessId::from_uuid(row.id),
            name: row.name,
            owner_email: row.owner_email,
            stripe_customer_ref: row.stripe_customer_ref,
            stripe_subscription_ref: row.stripe_subscription_ref,
            plan: parse_plan(&row.plan)?,
            subscription_status: row
                .subscription_status
                .as_deref()
                .map(parse_subscription_status)
                .transpose()?,
            total_earnings: Money::new(row.total_earnings),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_plan(s: &str) -> Result<Plan, DomainError> {
    Plan::from_tag(s).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid plan value: {}", s),
        )
    })
}

fn parse_subscription_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    match s {
        "active" => Ok(SubscriptionStatus::Active),
        "past_due" => Ok(SubscriptionStatus::PastDue),
        "canceled" => Ok(SubscriptionStatus::Canceled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid subscription status value: {}", s),
        )),
    }
}

const SELECT_ACCOUNT: &str = r#"
    SELECT id, name, owner_email, stripe_customer_ref, stripe_subscription_ref,
           plan, subscription_status, total_earnings, created_at, updated_at
    FROM business_accounts
"#;

#[async_trait]
impl BusinessAccountRepository for PostgresBusinessAccountRepository {
    async fn find_by_id(&self, id: &BusinessId) -> Result<Option<BusinessAccount>, DomainError> {
        let row: Option<BusinessAccountRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_ACCOUNT))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to find business account: {}", e))
                })?;

        row.map(BusinessAccount::try_from).transpose()
    }

    async fn find_by_customer_ref(
        &self,
        customer_ref: &str,
    ) -> Result<Option<BusinessAccount>, DomainError> {
        let row: Option<BusinessAccountRow> =
            sqlx::query_as(&format!("{} WHERE stripe_customer_ref = $1", SELECT_ACCOUNT))
                .bind(customer_ref)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to find business account: {}", e))
                })?;

        row.map(BusinessAccount::try_from).transpose()
    }

    async fn update_subscription_state(
        &self,
        account: &BusinessAccount,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE business_accounts SET
                plan = $2,
                subscription_status = $3,
                stripe_subscription_ref = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(account.plan.as_tag())
        .bind(account.subscription_status.map(|s| s.as_tag()))
        .bind(&account.stripe_subscription_ref)
        .bind(account.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::database(format!("Failed to update business account: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::BusinessNotFound,
                "Business account not found",
            ));
        }

        Ok(())
    }

    async fn accrue_earnings(&self, id: &BusinessId, delta: Money) -> Result<(), DomainError> {
        // Additive update: concurrent accruals from different bookings
        // never lose increments.
        let result = sqlx::query(
            r#"
            UPDATE business_accounts SET
                total_earnings = total_earnings + $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(delta.amount())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to accrue earnings: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::BusinessNotFound,
                "Business account not found",
            ));
        }

        Ok(())
    }
}
