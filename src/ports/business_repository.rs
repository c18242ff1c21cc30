//! BusinessAccountRepository port - tenant account persistence.

use async_trait::async_trait;

use crate::domain::business::BusinessAccount;
use crate::domain::foundation::{BusinessId, DomainError, Money};

/// Port for business account persistence.
#[async_trait]
pub trait BusinessAccountRepository: Send + Sync {
    /// Find an account by its id.
    async fn find_by_id(&self, id: &BusinessId) -> Result<Option<BusinessAccount>, DomainError>;

    /// Find an account by its unique Stripe customer reference.
    async fn find_by_customer_ref(
        &self,
        customer_ref: &str,
    ) -> Result<Option<BusinessAccount>, DomainError>;

    /// Persist subscription state (plan, status, subscription reference).
    ///
    /// Earnings are not written through this method; see
    /// [`accrue_earnings`](Self::accrue_earnings).
    async fn update_subscription_state(&self, account: &BusinessAccount)
        -> Result<(), DomainError>;

    /// Add `delta` to the account's cumulative earnings.
    ///
    /// Implementations apply this as a single additive UPDATE
    /// (`total_earnings = total_earnings + $delta`) so concurrent
    /// accruals from different bookings never lose increments.
    async fn accrue_earnings(&self, id: &BusinessId, delta: Money) -> Result<(), DomainError>;
}
