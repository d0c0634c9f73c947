//! Billsync service entry point.
//!
//! Bootstraps configuration, logging, the database pool and the webhook
//! HTTP surface. Missing required configuration aborts startup.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use billsync::adapters::http::webhooks::{webhook_router, WebhookAppState};
use billsync::adapters::postgres::{
    PostgresCustomerStore, PostgresInvoiceStore, PostgresPlanStore, PostgresProductStore,
    PostgresSubscriptionStore,
};
use billsync::config::AppConfig;
use billsync::domain::billing::WebhookVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .max_lifetime(config.database.max_lifetime())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let state = WebhookAppState {
        verifier: Arc::new(WebhookVerifier::new(
            config.payment.stripe_webhook_secret.clone(),
        )),
        customers: Arc::new(PostgresCustomerStore::new(pool.clone())),
        plans: Arc::new(PostgresPlanStore::new(pool.clone())),
        products: Arc::new(PostgresProductStore::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionStore::new(pool.clone())),
        invoices: Arc::new(PostgresInvoiceStore::new(pool)),
    };

    let app = webhook_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let addr = config.server.socket_addr();
    tracing::info!(
        %addr,
        test_mode = config.payment.is_test_mode(),
        "billsync listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
