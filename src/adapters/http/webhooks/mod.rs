//! Webhook HTTP surface.

mod dto;
mod handlers;
mod routes;

pub use dto::AckResponse;
pub use handlers::{
    handle_invoice_webhook, handle_plan_webhook, handle_subscription_webhook, WebhookApiError,
    WebhookAppState,
};
pub use routes::{webhook_router, webhook_routes};
