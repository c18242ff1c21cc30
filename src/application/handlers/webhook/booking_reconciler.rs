//! BookingReconciler - transitions bookings to paid/confirmed on
//! successful one-time payments.
//!
//! Handles `checkout.session.completed` (booking id in session metadata
//! or stored session reference) and `payment_intent.succeeded` (exact
//! match on the stored payment intent reference). Every step is safe to
//! re-run; the atomic paid claim in the booking repository makes the
//! invoice and earnings effects exactly-once under concurrent
//! duplicate delivery.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::booking::{Booking, Invoice, InvoiceNumber, PaymentReference};
use crate::domain::business::BusinessAccount;
use crate::domain::foundation::{BookingId, Timestamp};
use crate::domain::webhook::{
    CheckoutSessionObject, EventType, PaymentIntentObject, StripeEvent, WebhookError,
    WebhookEventHandler,
};
use crate::ports::{
    BookingRepository, BusinessAccountRepository, DirectoryReader, InvoiceDetails,
    InvoiceDocumentGenerator, InvoiceRepository, Mailer, PaidClaim,
};

use super::templates;

/// Reconciler for one-time booking payments.
pub struct BookingReconciler {
    bookings: Arc<dyn BookingRepository>,
    accounts: Arc<dyn BusinessAccountRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    directory: Arc<dyn DirectoryReader>,
    documents: Arc<dyn InvoiceDocumentGenerator>,
    mailer: Arc<dyn Mailer>,
}

impl BookingReconciler {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        accounts: Arc<dyn BusinessAccountRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        directory: Arc<dyn DirectoryReader>,
        documents: Arc<dyn InvoiceDocumentGenerator>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            bookings,
            accounts,
            invoices,
            directory,
            documents,
            mailer,
        }
    }

    /// `checkout.session.completed`
    ///
    /// Resolution order: booking id from session metadata first, stored
    /// checkout session reference second.
    async fn handle_checkout_completed(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let session: CheckoutSessionObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        let booking = match session.booking_id() {
            Some(raw_id) => match raw_id.parse::<BookingId>() {
                Ok(id) => self.bookings.find_by_id(&id).await?,
                Err(_) => {
                    tracing::warn!(
                        event_id = %event.id,
                        booking_id = raw_id,
                        "Checkout session metadata carries a malformed booking id"
                    );
                    None
                }
            },
            None => self.bookings.find_by_checkout_session(&session.id).await?,
        };

        let Some(booking) = booking else {
            // Subscription-mode checkouts and sessions from other
            // subsystems land here; nothing to reconcile.
            tracing::info!(
                event_id = %event.id,
                session_id = %session.id,
                "No booking matches checkout session, acknowledging"
            );
            return Err(WebhookError::Ignored(format!(
                "no booking for checkout session {}",
                session.id
            )));
        };

        self.reconcile_paid_booking(
            event,
            booking,
            PaymentReference::CheckoutSession(session.id.clone()),
            true,
        )
        .await
    }

    /// `payment_intent.succeeded`
    ///
    /// Matches only on the stored payment intent reference. Intents that
    /// match no booking belong to other flows (e.g. subscription
    /// billing) and are acknowledged without error.
    async fn handle_payment_intent_succeeded(
        &self,
        event: &StripeEvent,
    ) -> Result<(), WebhookError> {
        let intent: PaymentIntentObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        let Some(booking) = self.bookings.find_by_payment_intent(&intent.id).await? else {
            tracing::info!(
                event_id = %event.id,
                payment_intent = %intent.id,
                "No booking matches payment intent, acknowledging"
            );
            return Err(WebhookError::Ignored(format!(
                "no booking for payment intent {}",
                intent.id
            )));
        };

        self.reconcile_paid_booking(
            event,
            booking,
            PaymentReference::PaymentIntent(intent.id.clone()),
            false,
        )
        .await
    }

    /// Shared reconciliation for a booking whose payment settled.
    ///
    /// Ordering matters for retry safety: the document render and the
    /// invoice insert are idempotent and happen while the booking is
    /// still unpaid, so a failure there leaves the event fully
    /// retryable. The conditional paid claim then picks exactly one
    /// winner among concurrent deliveries; only the winner accrues
    /// earnings.
    async fn reconcile_paid_booking(
        &self,
        event: &StripeEvent,
        booking: Booking,
        reference: PaymentReference,
        link_invoice_in_email: bool,
    ) -> Result<(), WebhookError> {
        if booking.is_paid() {
            tracing::debug!(
                event_id = %event.id,
                booking_id = %booking.id,
                "Booking already paid, duplicate delivery"
            );
            return Err(WebhookError::Ignored(format!(
                "booking {} already paid",
                booking.id
            )));
        }

        let account = self
            .accounts
            .find_by_id(&booking.business_id)
            .await?
            .ok_or_else(|| {
                WebhookError::Database(format!(
                    "booking {} references missing business {}",
                    booking.id, booking.business_id
                ))
            })?;

        let client = self.directory.get_client(&booking.client_id).await?;
        let service = self.directory.get_service(&booking.service_id).await?;
        let service_name = service
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "appointment".to_string());

        // Render and persist the invoice before the paid claim: both are
        // idempotent, so a crash here leaves the booking unpaid and the
        // provider's retry re-runs everything.
        let number = InvoiceNumber::generate(Timestamp::now(), booking.id);
        let details = InvoiceDetails {
            booking_id: booking.id,
            number: number.clone(),
            business_name: account.name.clone(),
            client_name: client
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Client".to_string()),
            service_name: service_name.clone(),
            amount: booking.total,
        };
        let document_url = self
            .documents
            .generate(&details)
            .await
            .map_err(|e| WebhookError::Document(e.to_string()))?;

        let invoice = Invoice::issue(booking.id, number, booking.total, document_url);
        self.invoices.create(&invoice).await?;

        // The idempotency gate: exactly one concurrent delivery wins.
        match self
            .bookings
            .claim_paid_transition(&booking.id, reference)
            .await?
        {
            PaidClaim::Claimed => {}
            PaidClaim::AlreadyPaid => {
                tracing::debug!(
                    event_id = %event.id,
                    booking_id = %booking.id,
                    "Lost paid-transition race to a concurrent delivery"
                );
                return Err(WebhookError::Ignored(format!(
                    "booking {} already paid",
                    booking.id
                )));
            }
        }

        let delta = booking.earnings_delta();
        self.accounts
            .accrue_earnings(&booking.business_id, delta)
            .await?;

        tracing::info!(
            event_id = %event.id,
            booking_id = %booking.id,
            business_id = %booking.business_id,
            total = %booking.total,
            fee = %booking.total.platform_fee(),
            earnings_delta = %delta,
            invoice = %invoice.number,
            "Booking reconciled as paid"
        );

        self.notify_client(event, &booking, &account, &service_name, &invoice, link_invoice_in_email, client)
            .await;

        Ok(())
    }

    /// Best-effort confirmation email; failure never rolls back the
    /// financial state persisted above.
    #[allow(clippy::too_many_arguments)]
    async fn notify_client(
        &self,
        event: &StripeEvent,
        booking: &Booking,
        account: &BusinessAccount,
        service_name: &str,
        invoice: &Invoice,
        link_invoice: bool,
        client: Option<crate::ports::ClientDetails>,
    ) {
        let Some(client) = client else {
            tracing::warn!(
                event_id = %event.id,
                booking_id = %booking.id,
                "No client record for booking, skipping confirmation email"
            );
            return;
        };

        let invoice_link = link_invoice.then_some((&invoice.number, invoice.document_url.as_str()));
        let email = templates::booking_confirmation(
            &client.email,
            &client.name,
            &account.name,
            service_name,
            booking.starts_at,
            booking.total,
            invoice_link,
        );

        if let Err(e) = self.mailer.send(&email).await {
            tracing::error!(
                event_id = %event.id,
                booking_id = %booking.id,
                error = %e,
                "Failed to send booking confirmation email"
            );
        }
    }
}

#[async_trait]
impl WebhookEventHandler for BookingReconciler {
    fn handles(&self) -> Vec<EventType> {
        vec![
            EventType::CheckoutSessionCompleted,
            EventType::PaymentIntentSucceeded,
        ]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        match event.parsed_type() {
            EventType::CheckoutSessionCompleted => self.handle_checkout_completed(event).await,
            EventType::PaymentIntentSucceeded => {
                self.handle_payment_intent_succeeded(event).await
            }
            other => Err(WebhookError::Ignored(format!(
                "booking reconciler does not handle {}",
                other.as_tag()
            ))),
        }
    }
}
