//! Chairside service entry point.
//!
//! Wires configuration, the PostgreSQL pool, the Stripe/Resend
//! collaborators, and the webhook reconcilers into an Axum server.

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Json, Router};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use chairside::adapters::documents::HtmlInvoiceGenerator;
use chairside::adapters::email::{ConsoleMailer, ResendConfig, ResendMailer};
use chairside::adapters::http::webhook::{webhook_routes, WebhookAppState};
use chairside::adapters::postgres::{
    PostgresBookingRepository, PostgresBusinessAccountRepository, PostgresDirectoryReader,
    PostgresInvoiceRepository, PostgresWebhookEventRepository,
};
use chairside::adapters::stripe::{StripeClient, StripeClientConfig};
use chairside::application::handlers::webhook::{BookingReconciler, SubscriptionReconciler};
use chairside::config::AppConfig;
use chairside::domain::webhook::{HandlerRegistry, IdempotentWebhookProcessor, WebhookVerifier};
use chairside::ports::Mailer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let mailer: Arc<dyn Mailer> = if config.is_production() {
        Arc::new(ResendMailer::new(ResendConfig::new(
            config.email.resend_api_key.clone(),
            config.email.from_header(),
        )))
    } else {
        Arc::new(ConsoleMailer::new())
    };

    let bookings = Arc::new(PostgresBookingRepository::new(pool.clone()));
    let accounts = Arc::new(PostgresBusinessAccountRepository::new(pool.clone()));
    let invoices = Arc::new(PostgresInvoiceRepository::new(pool.clone()));
    let directory = Arc::new(PostgresDirectoryReader::new(pool.clone()));
    let ledger = PostgresWebhookEventRepository::new(pool.clone());

    let stripe = Arc::new(StripeClient::new(StripeClientConfig::new(
        config.payment.stripe_api_key.clone(),
    )));
    let documents = Arc::new(HtmlInvoiceGenerator::new(
        &config.documents,
        &config.server.public_base_url,
    ));

    let registry = HandlerRegistry::new()
        .register(Arc::new(SubscriptionReconciler::new(
            accounts.clone(),
            stripe,
            mailer.clone(),
        )))
        .register(Arc::new(BookingReconciler::new(
            bookings,
            accounts,
            invoices,
            directory,
            documents,
            mailer,
        )));

    let state = WebhookAppState {
        verifier: Arc::new(WebhookVerifier::new(
            config.payment.stripe_webhook_secret.clone(),
        )),
        processor: Arc::new(IdempotentWebhookProcessor::new(ledger, registry)),
    };

    let app = Router::new()
        .route("/health", get(health))
        .nest("/webhooks", webhook_routes())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_secs,
                )))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state);

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Chairside webhook service listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
