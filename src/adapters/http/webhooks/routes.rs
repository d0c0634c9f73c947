//! Axum router configuration for the webhook endpoints.
//!
//! One route per event family. Webhooks carry no user authentication; they
//! are verified via the signature header. POST only — other methods get 405
//! from the method router.

use axum::{routing::post, Router};

use super::handlers::{
    handle_invoice_webhook, handle_plan_webhook, handle_subscription_webhook, WebhookAppState,
};

/// Create the webhook router.
///
/// # Routes
/// - `POST /plans` - plan.created/updated, product.created/updated
/// - `POST /subscriptions` - customer.subscription.created/updated/deleted
/// - `POST /invoices` - customer.updated, invoice.created/updated
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new()
        .route("/plans", post(handle_plan_webhook))
        .route("/subscriptions", post(handle_subscription_webhook))
        .route("/invoices", post(handle_invoice_webhook))
}

/// Create the complete webhook module router, mounted at `/webhooks`.
pub fn webhook_router() -> Router<WebhookAppState> {
    Router::new().nest("/webhooks", webhook_routes())
}
