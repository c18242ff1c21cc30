//! Business account aggregate entity.
//!
//! A BusinessAccount is a tenant: one salon or beauty business. Plan and
//! subscription status are mutated only by the subscription reconciler,
//! earnings only by the booking reconciler. Accounts are never deleted
//! by this subsystem.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{BusinessId, Money, Timestamp};

use super::plan::{Plan, SubscriptionStatus};

/// Business account aggregate.
///
/// # Invariants
///
/// - `stripe_customer_ref` is unique across accounts.
/// - `total_earnings` equals the sum of (booking total − platform fee)
///   over all bookings paid under this account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessAccount {
    /// Unique identifier.
    pub id: BusinessId,

    /// Business display name, used in invoices and email copy.
    pub name: String,

    /// Owner's email address.
    pub owner_email: String,

    /// Stripe customer reference for subscription billing.
    pub stripe_customer_ref: String,

    /// Stripe subscription reference, while one exists.
    pub stripe_subscription_ref: Option<String>,

    /// Current plan.
    pub plan: Plan,

    /// Subscription status mirrored from the provider; absent until the
    /// first subscription event arrives.
    pub subscription_status: Option<SubscriptionStatus>,

    /// Cumulative earnings accrued from paid bookings.
    pub total_earnings: Money,

    /// When the account was created.
    pub created_at: Timestamp,

    /// When the account was last updated.
    pub updated_at: Timestamp,
}

impl BusinessAccount {
    /// True while the subscription is in the active state.
    pub fn is_subscription_active(&self) -> bool {
        self.subscription_status == Some(SubscriptionStatus::Active)
    }

    /// Apply a subscription created/updated/paid event.
    ///
    /// The plan is only overwritten while the incoming status is
    /// `active`; for any other status the previous plan is retained so a
    /// lapsed payment does not silently downgrade features mid-cycle.
    /// A missing plan tag on an active subscription defaults to `free`.
    ///
    /// Returns `true` when this call transitioned the account *into*
    /// `active` — the gate for the one-time welcome email.
    pub fn apply_subscription_state(
        &mut self,
        plan: Option<Plan>,
        status: SubscriptionStatus,
        subscription_ref: Option<String>,
    ) -> bool {
        let was_active = self.is_subscription_active();

        if status == SubscriptionStatus::Active {
            self.plan = plan.unwrap_or_default();
        }
        self.subscription_status = Some(status);
        if let Some(sub_ref) = subscription_ref {
            self.stripe_subscription_ref = Some(sub_ref);
        }
        self.updated_at = Timestamp::now();

        !was_active && self.is_subscription_active()
    }

    /// Mark the subscription past due after a failed payment.
    ///
    /// The plan is left unchanged; the provider keeps retrying.
    pub fn mark_past_due(&mut self) {
        self.subscription_status = Some(SubscriptionStatus::PastDue);
        self.updated_at = Timestamp::now();
    }

    /// Apply a subscription deletion: back to the free plan.
    pub fn cancel_subscription(&mut self) {
        self.stripe_subscription_ref = None;
        self.subscription_status = Some(SubscriptionStatus::Canceled);
        self.plan = Plan::Free;
        self.updated_at = Timestamp::now();
    }

    /// Accrue earnings from a paid booking.
    ///
    /// The persistent adapter applies this as a single additive UPDATE;
    /// this method keeps the in-memory aggregate consistent.
    pub fn accrue_earnings(&mut self, delta: Money) {
        self.total_earnings = self.total_earnings + delta;
        self.updated_at = Timestamp::now();
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::free_account;
    use super::*;

    #[test]
    fn first_activation_sets_plan_and_reports_transition() {
        let mut account = free_account("cus_123");

        let became_active = account.apply_subscription_state(
            Some(Plan::Pro),
            SubscriptionStatus::Active,
            Some("sub_123".to_string()),
        );

        assert!(became_active);
        assert_eq!(account.plan, Plan::Pro);
        assert_eq!(account.subscription_status, Some(SubscriptionStatus::Active));
        assert_eq!(account.stripe_subscription_ref.as_deref(), Some("sub_123"));
    }

    #[test]
    fn repeated_activation_does_not_report_transition() {
        let mut account = free_account("cus_123");
        account.apply_subscription_state(
            Some(Plan::Pro),
            SubscriptionStatus::Active,
            Some("sub_123".to_string()),
        );

        let became_active = account.apply_subscription_state(
            Some(Plan::Pro),
            SubscriptionStatus::Active,
            None,
        );

        assert!(!became_active);
    }

    #[test]
    fn non_active_status_retains_previous_plan() {
        let mut account = free_account("cus_123");
        account.apply_subscription_state(
            Some(Plan::Business),
            SubscriptionStatus::Active,
            Some("sub_123".to_string()),
        );

        account.apply_subscription_state(
            Some(Plan::Free),
            SubscriptionStatus::PastDue,
            None,
        );

        assert_eq!(account.plan, Plan::Business);
        assert_eq!(account.subscription_status, Some(SubscriptionStatus::PastDue));
    }

    #[test]
    fn active_without_plan_metadata_defaults_to_free() {
        let mut account = free_account("cus_123");

        account.apply_subscription_state(None, SubscriptionStatus::Active, None);

        assert_eq!(account.plan, Plan::Free);
    }

    #[test]
    fn cancellation_downgrades_to_free_and_clears_ref() {
        let mut account = free_account("cus_123");
        account.apply_subscription_state(
            Some(Plan::Business),
            SubscriptionStatus::Active,
            Some("sub_123".to_string()),
        );

        account.cancel_subscription();

        assert_eq!(account.plan, Plan::Free);
        assert_eq!(account.subscription_status, Some(SubscriptionStatus::Canceled));
        assert!(account.stripe_subscription_ref.is_none());
    }

    #[test]
    fn past_due_keeps_plan() {
        let mut account = free_account("cus_123");
        account.apply_subscription_state(
            Some(Plan::Pro),
            SubscriptionStatus::Active,
            Some("sub_123".to_string()),
        );

        account.mark_past_due();

        assert_eq!(account.plan, Plan::Pro);
        assert_eq!(account.subscription_status, Some(SubscriptionStatus::PastDue));
    }

    #[test]
    fn earnings_accumulate() {
        let mut account = free_account("cus_123");

        account.accrue_earnings(Money::from_major_minor(95, 0));
        account.accrue_earnings(Money::from_major_minor(47, 50));

        assert_eq!(account.total_earnings, Money::from_major_minor(142, 50));
    }
}
