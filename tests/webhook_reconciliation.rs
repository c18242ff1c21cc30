//! Integration tests for the webhook reconciliation pipeline.
//!
//! These tests run the full flow a provider delivery takes:
//! 1. Signature verification over the raw body
//! 2. Idempotent processing against the event ledger
//! 3. Dispatch to the booking/subscription reconcilers
//! 4. State mutation through the persistence ports
//!
//! Uses in-memory implementations of every port; no network, no database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chairside::application::handlers::webhook::{BookingReconciler, SubscriptionReconciler};
use chairside::domain::booking::{
    Booking, BookingStatus, Invoice, PaymentReference, PaymentStatus,
};
use chairside::domain::business::{BusinessAccount, Plan, SubscriptionStatus};
use chairside::domain::foundation::{
    BookingId, BusinessId, ClientId, DomainError, Money, ServiceId, Timestamp,
};
use chairside::domain::webhook::{
    HandlerRegistry, IdempotentWebhookProcessor, SubscriptionObject, WebhookError,
    WebhookVerifier,
};
use chairside::ports::{
    BookingRepository, BusinessAccountRepository, ClientDetails, DirectoryReader, DocumentError,
    Email, InvoiceDetails, InvoiceDocumentGenerator, InvoiceInsert, InvoiceRepository, Mailer,
    MailerError, PaidClaim, PaymentProvider, ProviderError, SaveResult, ServiceDetails,
    WebhookEventRecord, WebhookEventRepository, WebhookResult,
};

const WEBHOOK_SECRET: &str = "whsec_integration_test";

// =============================================================================
// Test Infrastructure
// =============================================================================

#[derive(Default)]
struct InMemoryLedger {
    records: Mutex<HashMap<String, WebhookEventRecord>>,
}

#[async_trait]
impl WebhookEventRepository for InMemoryLedger {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.records.lock().unwrap().get(event_id).cloned())
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.event_id) {
            Ok(SaveResult::AlreadyExists)
        } else {
            records.insert(record.event_id.clone(), record);
            Ok(SaveResult::Inserted)
        }
    }

    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|_, r| r.processed_at >= timestamp);
        Ok((before - records.len()) as u64)
    }
}

#[derive(Default)]
struct InMemoryBookings {
    bookings: Mutex<Vec<Booking>>,
}

impl InMemoryBookings {
    fn insert(&self, booking: Booking) {
        self.bookings.lock().unwrap().push(booking);
    }

    fn get(&self, id: &BookingId) -> Booking {
        self.bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| &b.id == id)
            .cloned()
            .expect("booking exists")
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookings {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, DomainError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| &b.id == id)
            .cloned())
    }

    async fn find_by_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Booking>, DomainError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.checkout_session_ref.as_deref() == Some(session_id))
            .cloned())
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Booking>, DomainError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.payment_intent_ref.as_deref() == Some(payment_intent_id))
            .cloned())
    }

    async fn claim_paid_transition(
        &self,
        id: &BookingId,
        reference: PaymentReference,
    ) -> Result<PaidClaim, DomainError> {
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings
            .iter_mut()
            .find(|b| &b.id == id)
            .ok_or_else(|| DomainError::database("booking vanished"))?;

        if booking.is_paid() {
            return Ok(PaidClaim::AlreadyPaid);
        }
        booking
            .mark_paid(reference)
            .map_err(|e| DomainError::database(e.to_string()))?;
        Ok(PaidClaim::Claimed)
    }
}

#[derive(Default)]
struct InMemoryAccounts {
    accounts: Mutex<Vec<BusinessAccount>>,
    accrual_count: Mutex<u32>,
}

impl InMemoryAccounts {
    fn insert(&self, account: BusinessAccount) {
        self.accounts.lock().unwrap().push(account);
    }

    fn get(&self, id: &BusinessId) -> BusinessAccount {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| &a.id == id)
            .cloned()
            .expect("account exists")
    }

    fn accrual_count(&self) -> u32 {
        *self.accrual_count.lock().unwrap()
    }
}

#[async_trait]
impl BusinessAccountRepository for InMemoryAccounts {
    async fn find_by_id(&self, id: &BusinessId) -> Result<Option<BusinessAccount>, DomainError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| &a.id == id)
            .cloned())
    }

    async fn find_by_customer_ref(
        &self,
        customer_ref: &str,
    ) -> Result<Option<BusinessAccount>, DomainError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.stripe_customer_ref == customer_ref)
            .cloned())
    }

    async fn update_subscription_state(
        &self,
        account: &BusinessAccount,
    ) -> Result<(), DomainError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(a) = accounts.iter_mut().find(|a| a.id == account.id) {
            *a = account.clone();
        }
        Ok(())
    }

    async fn accrue_earnings(&self, id: &BusinessId, delta: Money) -> Result<(), DomainError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| DomainError::database("account vanished"))?;
        account.accrue_earnings(delta);
        *self.accrual_count.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryInvoices {
    invoices: Mutex<Vec<Invoice>>,
}

impl InMemoryInvoices {
    fn count(&self) -> usize {
        self.invoices.lock().unwrap().len()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoices {
    async fn create(&self, invoice: &Invoice) -> Result<InvoiceInsert, DomainError> {
        let mut invoices = self.invoices.lock().unwrap();
        if invoices.iter().any(|i| i.booking_id == invoice.booking_id) {
            return Ok(InvoiceInsert::AlreadyExists);
        }
        invoices.push(invoice.clone());
        Ok(InvoiceInsert::Created)
    }

    async fn find_by_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Invoice>, DomainError> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .find(|i| &i.booking_id == booking_id)
            .cloned())
    }
}

struct InMemoryDirectory {
    clients: HashMap<ClientId, ClientDetails>,
    services: HashMap<ServiceId, ServiceDetails>,
}

#[async_trait]
impl DirectoryReader for InMemoryDirectory {
    async fn get_client(&self, id: &ClientId) -> Result<Option<ClientDetails>, DomainError> {
        Ok(self.clients.get(id).cloned())
    }

    async fn get_service(&self, id: &ServiceId) -> Result<Option<ServiceDetails>, DomainError> {
        Ok(self.services.get(id).cloned())
    }
}

struct StaticProvider {
    subscription: Option<SubscriptionObject>,
}

#[async_trait]
impl PaymentProvider for StaticProvider {
    async fn get_subscription(
        &self,
        _subscription_id: &str,
    ) -> Result<Option<SubscriptionObject>, ProviderError> {
        Ok(self.subscription.clone())
    }
}

struct RecordingGenerator;

#[async_trait]
impl InvoiceDocumentGenerator for RecordingGenerator {
    async fn generate(&self, details: &InvoiceDetails) -> Result<String, DocumentError> {
        Ok(format!(
            "https://chairside.test/invoices/{}.html",
            details.number
        ))
    }
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
}

impl RecordingMailer {
    fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// =============================================================================
// World Fixture
// =============================================================================

struct World {
    bookings: Arc<InMemoryBookings>,
    accounts: Arc<InMemoryAccounts>,
    invoices: Arc<InMemoryInvoices>,
    mailer: Arc<RecordingMailer>,
    verifier: WebhookVerifier,
    processor: IdempotentWebhookProcessor<InMemoryLedger, HandlerRegistry>,
    business_id: BusinessId,
    booking_id: BookingId,
}

/// Builds a world with one business account and one unpaid booking.
fn world(provider_subscription: Option<SubscriptionObject>) -> World {
    let business_id = BusinessId::new();
    let booking_id = BookingId::new();
    let client_id = ClientId::new();
    let service_id = ServiceId::new();
    let now = Timestamp::now();

    let accounts = Arc::new(InMemoryAccounts::default());
    accounts.insert(BusinessAccount {
        id: business_id,
        name: "Golden Comb Studio".to_string(),
        owner_email: "owner@goldencomb.example".to_string(),
        stripe_customer_ref: "cus_world".to_string(),
        stripe_subscription_ref: None,
        plan: Plan::Free,
        subscription_status: None,
        total_earnings: Money::ZERO,
        created_at: now,
        updated_at: now,
    });

    let bookings = Arc::new(InMemoryBookings::default());
    bookings.insert(Booking {
        id: booking_id,
        business_id,
        client_id,
        service_id,
        starts_at: now.add_days(2),
        ends_at: now.add_days(2),
        total: Money::from_major_minor(100, 0),
        payment_status: PaymentStatus::Unpaid,
        status: BookingStatus::Pending,
        payment_intent_ref: Some("pi_world".to_string()),
        checkout_session_ref: None,
        created_at: now,
        updated_at: now,
    });

    let invoices = Arc::new(InMemoryInvoices::default());
    let mailer = Arc::new(RecordingMailer::default());

    let directory = Arc::new(InMemoryDirectory {
        clients: HashMap::from([(
            client_id,
            ClientDetails {
                id: client_id,
                name: "Priya".to_string(),
                email: "priya@example.com".to_string(),
            },
        )]),
        services: HashMap::from([(
            service_id,
            ServiceDetails {
                id: service_id,
                name: "Cut & Finish".to_string(),
                duration_minutes: 60,
            },
        )]),
    });

    let registry = HandlerRegistry::new()
        .register(Arc::new(SubscriptionReconciler::new(
            accounts.clone(),
            Arc::new(StaticProvider {
                subscription: provider_subscription,
            }),
            mailer.clone(),
        )))
        .register(Arc::new(BookingReconciler::new(
            bookings.clone(),
            accounts.clone(),
            invoices.clone(),
            directory,
            Arc::new(RecordingGenerator),
            mailer.clone(),
        )));

    let processor = IdempotentWebhookProcessor::new(InMemoryLedger::default(), registry);

    World {
        bookings,
        accounts,
        invoices,
        mailer,
        verifier: WebhookVerifier::new(WEBHOOK_SECRET),
        processor,
        business_id,
        booking_id,
    }
}

/// Signs a payload the way the provider does.
fn sign(payload: &str) -> String {
    let timestamp = Utc::now().timestamp();
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(signed_payload.as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

fn event_json(id: &str, event_type: &str, object: serde_json::Value) -> String {
    json!({
        "id": id,
        "type": event_type,
        "created": Utc::now().timestamp(),
        "data": {"object": object},
        "livemode": false,
        "api_version": "2023-10-16"
    })
    .to_string()
}

/// Verifies and processes one delivery, as the HTTP handler does.
async fn deliver(world: &World, payload: &str) -> Result<WebhookResult, WebhookError> {
    let event = world.verifier.verify_and_parse(payload.as_bytes(), &sign(payload))?;
    world.processor.process(event).await
}

fn checkout_payload(event_id: &str, booking_id: BookingId) -> String {
    event_json(
        event_id,
        "checkout.session.completed",
        json!({
            "id": "cs_world",
            "customer": "cus_world",
            "payment_intent": "pi_world",
            "metadata": {"booking_id": booking_id.to_string()}
        }),
    )
}

// =============================================================================
// Booking Reconciliation
// =============================================================================

#[tokio::test]
async fn checkout_completion_reconciles_booking_end_to_end() {
    let w = world(None);

    let result = deliver(&w, &checkout_payload("evt_1", w.booking_id)).await.unwrap();
    assert_eq!(result, WebhookResult::Processed);

    let booking = w.bookings.get(&w.booking_id);
    assert_eq!(booking.payment_status, PaymentStatus::Paid);
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.checkout_session_ref.as_deref(), Some("cs_world"));

    assert_eq!(w.invoices.count(), 1);

    let account = w.accounts.get(&w.business_id);
    assert_eq!(account.total_earnings, Money::from_major_minor(95, 0));

    let sent = w.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "priya@example.com");
    assert!(sent[0].html.contains("Cut & Finish"));
}

#[tokio::test]
async fn duplicate_event_id_is_skipped_by_the_ledger() {
    let w = world(None);
    let payload = checkout_payload("evt_dup", w.booking_id);

    let first = deliver(&w, &payload).await.unwrap();
    let second = deliver(&w, &payload).await.unwrap();

    assert_eq!(first, WebhookResult::Processed);
    assert_eq!(second, WebhookResult::AlreadyProcessed);
    assert_eq!(w.invoices.count(), 1);
    assert_eq!(w.accounts.accrual_count(), 1);
    assert_eq!(w.mailer.sent().len(), 1);
}

#[tokio::test]
async fn redelivery_under_new_event_id_is_stopped_by_the_paid_gate() {
    let w = world(None);

    deliver(&w, &checkout_payload("evt_a", w.booking_id)).await.unwrap();
    // The provider occasionally re-emits the same real-world payment
    // under a fresh event id; only the paid gate catches that.
    let second = deliver(&w, &checkout_payload("evt_b", w.booking_id)).await.unwrap();

    assert_eq!(second, WebhookResult::Processed);
    assert_eq!(w.invoices.count(), 1);
    assert_eq!(w.accounts.accrual_count(), 1);
    assert_eq!(
        w.accounts.get(&w.business_id).total_earnings,
        Money::from_major_minor(95, 0)
    );
    assert_eq!(w.mailer.sent().len(), 1);
}

#[tokio::test]
async fn fee_split_is_exact() {
    let w = world(None);

    deliver(&w, &checkout_payload("evt_fee", w.booking_id)).await.unwrap();

    let account = w.accounts.get(&w.business_id);
    let booking = w.bookings.get(&w.booking_id);
    assert_eq!(booking.total, Money::from_major_minor(100, 0));
    assert_eq!(booking.total.platform_fee(), Money::from_major_minor(5, 0));
    assert_eq!(account.total_earnings, Money::from_major_minor(95, 0));
}

#[tokio::test]
async fn payment_intent_succeeded_matches_stored_reference() {
    let w = world(None);

    let payload = event_json(
        "evt_pi",
        "payment_intent.succeeded",
        json!({"id": "pi_world"}),
    );
    deliver(&w, &payload).await.unwrap();

    let booking = w.bookings.get(&w.booking_id);
    assert_eq!(booking.payment_status, PaymentStatus::Paid);
    // The payment-intent path sends the confirmation without a link.
    let sent = w.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].html.contains("https://chairside.test/invoices/"));
}

#[tokio::test]
async fn unmatched_payment_intent_is_acknowledged() {
    let w = world(None);

    let payload = event_json(
        "evt_stray",
        "payment_intent.succeeded",
        json!({"id": "pi_someone_elses"}),
    );
    let result = deliver(&w, &payload).await.unwrap();

    assert_eq!(result, WebhookResult::Processed);
    assert_eq!(w.bookings.get(&w.booking_id).payment_status, PaymentStatus::Unpaid);
    assert_eq!(w.invoices.count(), 0);
}

// =============================================================================
// Signature Verification
// =============================================================================

#[tokio::test]
async fn tampered_body_is_rejected_with_no_state_change() {
    let w = world(None);
    let genuine = checkout_payload("evt_sig", w.booking_id);
    let signature = sign(&genuine);
    let forged = genuine.replace("evt_sig", "evt_evil");

    let result = w.verifier.verify_and_parse(forged.as_bytes(), &signature);

    assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    assert_eq!(w.bookings.get(&w.booking_id).payment_status, PaymentStatus::Unpaid);
    assert_eq!(w.invoices.count(), 0);
    assert_eq!(w.accounts.accrual_count(), 0);
}

// =============================================================================
// Event Routing
// =============================================================================

#[tokio::test]
async fn unknown_event_type_is_acknowledged_without_side_effects() {
    let w = world(None);

    let payload = event_json("evt_unknown", "some.unhandled.type", json!({}));
    let result = deliver(&w, &payload).await.unwrap();

    assert_eq!(result, WebhookResult::Processed);
    assert_eq!(w.bookings.get(&w.booking_id).payment_status, PaymentStatus::Unpaid);
    assert_eq!(w.invoices.count(), 0);
    assert!(w.mailer.sent().is_empty());
}

// =============================================================================
// Subscription Reconciliation
// =============================================================================

fn provider_subscription(status: &str, plan: &str) -> SubscriptionObject {
    serde_json::from_value(json!({
        "id": "sub_world",
        "customer": "cus_world",
        "status": status,
        "metadata": {"plan": plan, "billing_period": "monthly"}
    }))
    .unwrap()
}

#[tokio::test]
async fn subscription_lifecycle_activation_and_cancellation() {
    let w = world(Some(provider_subscription("active", "business")));

    // Activate via paid invoice
    let paid = event_json(
        "evt_sub_paid",
        "invoice.payment_succeeded",
        json!({"id": "in_1", "customer": "cus_world", "subscription": "sub_world"}),
    );
    deliver(&w, &paid).await.unwrap();

    let account = w.accounts.get(&w.business_id);
    assert_eq!(account.plan, Plan::Business);
    assert_eq!(account.subscription_status, Some(SubscriptionStatus::Active));
    assert_eq!(w.mailer.sent().len(), 1, "welcome email sent once");

    // Cancel
    let deleted = event_json(
        "evt_sub_del",
        "customer.subscription.deleted",
        json!({
            "id": "sub_world",
            "customer": "cus_world",
            "status": "canceled",
            "metadata": {}
        }),
    );
    deliver(&w, &deleted).await.unwrap();

    let account = w.accounts.get(&w.business_id);
    assert_eq!(account.plan, Plan::Free);
    assert_eq!(account.subscription_status, Some(SubscriptionStatus::Canceled));
    assert!(account.stripe_subscription_ref.is_none());
}

#[tokio::test]
async fn welcome_email_is_sent_only_on_first_activation() {
    let w = world(Some(provider_subscription("active", "pro")));

    for (i, event_id) in ["evt_p1", "evt_p2", "evt_p3"].iter().enumerate() {
        let paid = event_json(
            event_id,
            "invoice.payment_succeeded",
            json!({"id": format!("in_{}", i), "customer": "cus_world", "subscription": "sub_world"}),
        );
        deliver(&w, &paid).await.unwrap();
    }

    assert_eq!(w.mailer.sent().len(), 1);
}

#[tokio::test]
async fn failed_invoice_marks_account_past_due() {
    let w = world(Some(provider_subscription("active", "pro")));

    let paid = event_json(
        "evt_ok",
        "invoice.payment_succeeded",
        json!({"id": "in_1", "customer": "cus_world", "subscription": "sub_world"}),
    );
    deliver(&w, &paid).await.unwrap();

    let failed = event_json(
        "evt_fail",
        "invoice.payment_failed",
        json!({"id": "in_2", "customer": "cus_world", "subscription": "sub_world"}),
    );
    deliver(&w, &failed).await.unwrap();

    let account = w.accounts.get(&w.business_id);
    assert_eq!(account.subscription_status, Some(SubscriptionStatus::PastDue));
    assert_eq!(account.plan, Plan::Pro, "plan survives a failed payment");
}

#[tokio::test]
async fn webhook_for_unknown_customer_takes_no_action() {
    let w = world(None);

    let payload = event_json(
        "evt_ghost",
        "customer.subscription.updated",
        json!({
            "id": "sub_ghost",
            "customer": "cus_ghost",
            "status": "active",
            "metadata": {"plan": "pro"}
        }),
    );
    let result = deliver(&w, &payload).await.unwrap();

    assert_eq!(result, WebhookResult::Processed);
    let account = w.accounts.get(&w.business_id);
    assert_eq!(account.plan, Plan::Free);
    assert!(account.subscription_status.is_none());
}
