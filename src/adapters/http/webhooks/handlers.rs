//! HTTP handlers for the webhook endpoints.
//!
//! Each endpoint owns one event family and runs the shared ingestion
//! pipeline: extract the signature header, verify, route, apply. All
//! failures inside a handler are converted here into a single JSON
//! acknowledgement; nothing propagates past the request boundary.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;

use crate::application::handlers::billing::{
    CustomerInvoiceHandler, PlanProductHandler, SubscriptionHandler,
};
use crate::domain::billing::{WebhookError, WebhookIngestion, WebhookVerifier};
use crate::ports::{CustomerStore, InvoiceStore, PlanStore, ProductStore, SubscriptionStore};

use super::dto::AckResponse;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all webhook dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped
/// dependencies injected at construction; handlers hold no implicit module
/// state.
#[derive(Clone)]
pub struct WebhookAppState {
    pub verifier: Arc<WebhookVerifier>,
    pub customers: Arc<dyn CustomerStore>,
    pub plans: Arc<dyn PlanStore>,
    pub products: Arc<dyn ProductStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub invoices: Arc<dyn InvoiceStore>,
}

impl WebhookAppState {
    /// Pipeline for the plan/product surface.
    pub fn plan_product_ingestion(&self) -> WebhookIngestion<PlanProductHandler> {
        WebhookIngestion::new(
            self.verifier.clone(),
            PlanProductHandler::new(self.plans.clone(), self.products.clone()),
        )
    }

    /// Pipeline for the subscription surface.
    pub fn subscription_ingestion(&self) -> WebhookIngestion<SubscriptionHandler> {
        WebhookIngestion::new(
            self.verifier.clone(),
            SubscriptionHandler::new(
                self.plans.clone(),
                self.customers.clone(),
                self.subscriptions.clone(),
            ),
        )
    }

    /// Pipeline for the customer/invoice surface.
    pub fn customer_invoice_ingestion(&self) -> WebhookIngestion<CustomerInvoiceHandler> {
        WebhookIngestion::new(
            self.verifier.clone(),
            CustomerInvoiceHandler::new(
                self.customers.clone(),
                self.products.clone(),
                self.invoices.clone(),
            ),
        )
    }
}

/// Extracts the Stripe signature header, rejecting the request without it.
fn extract_signature(headers: &HeaderMap) -> Result<String, WebhookApiError> {
    headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| {
            WebhookApiError(WebhookError::ParseError(
                "missing Stripe-Signature header".to_string(),
            ))
        })
}

// ════════════════════════════════════════════════════════════════════════════════
// Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/plans - plan.* and product.* events
pub async fn handle_plan_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = extract_signature(&headers)?;
    let outcome = state
        .plan_product_ingestion()
        .ingest(&body, &signature)
        .await?;
    Ok(Json(AckResponse::accepted(outcome.message())))
}

/// POST /webhooks/subscriptions - customer.subscription.* events
pub async fn handle_subscription_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = extract_signature(&headers)?;
    let outcome = state
        .subscription_ingestion()
        .ingest(&body, &signature)
        .await?;
    Ok(Json(AckResponse::accepted(outcome.message())))
}

/// POST /webhooks/invoices - customer.updated and invoice.* events
pub async fn handle_invoice_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = extract_signature(&headers)?;
    let outcome = state
        .customer_invoice_ingestion()
        .ingest(&body, &signature)
        .await?;
    Ok(Json(AckResponse::accepted(outcome.message())))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook errors to HTTP responses.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        tracing::warn!(status = %status, error = %self.0, "webhook request rejected");
        let body = AckResponse::rejected(self.0.to_string());
        (status, Json(body)).into_response()
    }
}
