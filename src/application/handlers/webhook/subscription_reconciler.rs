//! SubscriptionReconciler - maps subscription lifecycle events onto
//! business account plan/status state.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::business::{BusinessAccount, Plan, SubscriptionStatus};
use crate::domain::webhook::{
    EventType, InvoiceObject, StripeEvent, SubscriptionObject, WebhookError, WebhookEventHandler,
};
use crate::ports::{BusinessAccountRepository, Mailer, PaymentProvider};

use super::templates;

/// Reconciler for subscription billing events.
///
/// Drives the `(plan, subscription_status)` state machine per business
/// account. Accounts are never created here; a webhook for an unknown
/// customer is logged and acknowledged (account creation belongs to the
/// signup flow).
pub struct SubscriptionReconciler {
    accounts: Arc<dyn BusinessAccountRepository>,
    provider: Arc<dyn PaymentProvider>,
    mailer: Arc<dyn Mailer>,
}

impl SubscriptionReconciler {
    pub fn new(
        accounts: Arc<dyn BusinessAccountRepository>,
        provider: Arc<dyn PaymentProvider>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            accounts,
            provider,
            mailer,
        }
    }

    /// Find the account for a customer reference, or resolve to the
    /// acknowledged no-action case.
    async fn account_for_customer(
        &self,
        customer_ref: &str,
        event_id: &str,
    ) -> Result<BusinessAccount, WebhookError> {
        match self.accounts.find_by_customer_ref(customer_ref).await? {
            Some(account) => Ok(account),
            None => {
                tracing::warn!(
                    event_id,
                    customer_ref,
                    "No business account for customer reference, acknowledging"
                );
                Err(WebhookError::Ignored(format!(
                    "no account for customer {}",
                    customer_ref
                )))
            }
        }
    }

    /// `customer.subscription.created` / `customer.subscription.updated`
    async fn handle_subscription_changed(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let sub: SubscriptionObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        let mut account = self.account_for_customer(&sub.customer, &event.id).await?;

        let Some(status) = SubscriptionStatus::from_provider(&sub.status) else {
            tracing::info!(
                event_id = %event.id,
                provider_status = %sub.status,
                "Subscription status outside local model, acknowledging"
            );
            return Err(WebhookError::Ignored(format!(
                "unmapped subscription status {}",
                sub.status
            )));
        };

        let plan = sub.plan().and_then(Plan::from_tag);
        account.apply_subscription_state(plan, status, Some(sub.id.clone()));
        self.accounts.update_subscription_state(&account).await?;

        tracing::info!(
            event_id = %event.id,
            business_id = %account.id,
            plan = account.plan.as_tag(),
            status = status.as_tag(),
            "Subscription state reconciled"
        );
        Ok(())
    }

    /// `invoice.payment_succeeded`
    async fn handle_invoice_paid(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let invoice: InvoiceObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        // Invoices without a subscription belong to one-time payments,
        // which the booking reconciler owns.
        let Some(subscription_ref) = invoice.subscription else {
            return Err(WebhookError::Ignored(
                "invoice has no subscription reference".to_string(),
            ));
        };

        let customer_ref = invoice
            .customer
            .ok_or(WebhookError::MissingField("customer"))?;

        let mut account = self.account_for_customer(&customer_ref, &event.id).await?;

        // The invoice payload doesn't carry plan metadata; read it from
        // the subscription itself.
        let sub = self
            .provider
            .get_subscription(&subscription_ref)
            .await
            .map_err(|e| WebhookError::Provider(e.to_string()))?;

        let Some(sub) = sub else {
            tracing::warn!(
                event_id = %event.id,
                subscription_ref = %subscription_ref,
                "Paid invoice references a subscription the provider no longer knows"
            );
            return Err(WebhookError::Ignored(format!(
                "subscription {} not found at provider",
                subscription_ref
            )));
        };

        let Some(status) = SubscriptionStatus::from_provider(&sub.status) else {
            return Err(WebhookError::Ignored(format!(
                "unmapped subscription status {}",
                sub.status
            )));
        };

        let plan = sub.plan().and_then(Plan::from_tag);
        let became_active =
            account.apply_subscription_state(plan, status, Some(subscription_ref.clone()));
        self.accounts.update_subscription_state(&account).await?;

        if became_active {
            // Best-effort: a lost welcome email never fails the request.
            let email = templates::subscription_welcome(
                &account.owner_email,
                &account.name,
                account.plan,
                sub.billing_period(),
            );
            if let Err(e) = self.mailer.send(&email).await {
                tracing::error!(
                    event_id = %event.id,
                    business_id = %account.id,
                    error = %e,
                    "Failed to send welcome email"
                );
            }
        }

        Ok(())
    }

    /// `invoice.payment_failed`
    async fn handle_invoice_failed(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let invoice: InvoiceObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        let customer_ref = invoice
            .customer
            .ok_or(WebhookError::MissingField("customer"))?;

        let mut account = self.account_for_customer(&customer_ref, &event.id).await?;

        account.mark_past_due();
        self.accounts.update_subscription_state(&account).await?;

        tracing::info!(
            event_id = %event.id,
            business_id = %account.id,
            "Subscription marked past due"
        );

        let email = templates::payment_failed_notice(&account.owner_email, &account.name);
        if let Err(e) = self.mailer.send(&email).await {
            tracing::error!(
                event_id = %event.id,
                business_id = %account.id,
                error = %e,
                "Failed to send payment-failed notice"
            );
        }

        Ok(())
    }

    /// `customer.subscription.deleted`
    async fn handle_subscription_deleted(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let sub: SubscriptionObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        let mut account = self.account_for_customer(&sub.customer, &event.id).await?;

        account.cancel_subscription();
        self.accounts.update_subscription_state(&account).await?;

        tracing::info!(
            event_id = %event.id,
            business_id = %account.id,
            "Subscription cancelled, account back on free plan"
        );
        Ok(())
    }
}

#[async_trait]
impl WebhookEventHandler for SubscriptionReconciler {
    fn handles(&self) -> Vec<EventType> {
        vec![
            EventType::SubscriptionCreated,
            EventType::SubscriptionUpdated,
            EventType::SubscriptionDeleted,
            EventType::InvoicePaymentSucceeded,
            EventType::InvoicePaymentFailed,
        ]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        match event.parsed_type() {
            EventType::SubscriptionCreated | EventType::SubscriptionUpdated => {
                self.handle_subscription_changed(event).await
            }
            EventType::SubscriptionDeleted => self.handle_subscription_deleted(event).await,
            EventType::InvoicePaymentSucceeded => self.handle_invoice_paid(event).await,
            EventType::InvoicePaymentFailed => self.handle_invoice_failed(event).await,
            other => Err(WebhookError::Ignored(format!(
                "subscription reconciler does not handle {}",
                other.as_tag()
            ))),
        }
    }
}
