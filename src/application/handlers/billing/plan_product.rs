//! Event-family handler for plan and product events.
//!
//! Plans upsert directly. Products must resolve their owning plan through the
//! `default_price` external id first; an unresolved plan is fatal so the
//! sender retries once the plan event lands.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::billing::{
    apply_policy, EventFamilyHandler, EventKind, IngestOutcome, PlanPayload, ProductPayload,
    ReferencePolicy, Resolved, StripeEvent, WebhookError,
};
use crate::ports::{PlanStore, ProductStore};

const HANDLED_KINDS: &[EventKind] = &[
    EventKind::PlanCreated,
    EventKind::PlanUpdated,
    EventKind::ProductCreated,
    EventKind::ProductUpdated,
];

/// Handles `plan.*` and `product.*` events.
pub struct PlanProductHandler {
    plans: Arc<dyn PlanStore>,
    products: Arc<dyn ProductStore>,
}

impl PlanProductHandler {
    pub fn new(plans: Arc<dyn PlanStore>, products: Arc<dyn ProductStore>) -> Self {
        Self { plans, products }
    }

    async fn apply_plan(&self, event: &StripeEvent) -> Result<IngestOutcome, WebhookError> {
        let payload = PlanPayload::decode(&event.data.object)?;
        let row = self.plans.upsert(payload.record()).await?;
        tracing::info!(plan_id = %row.id, stripe_id = %row.stripe_id, "plan synchronized");
        Ok(IngestOutcome::written("plan", row.stripe_id))
    }

    async fn apply_product(&self, event: &StripeEvent) -> Result<IngestOutcome, WebhookError> {
        let payload = ProductPayload::decode(&event.data.object)?;

        let found = self.plans.find_by_stripe_id(&payload.default_price).await?;
        let plan = match apply_policy(
            found,
            ReferencePolicy::Fatal,
            "plan",
            &payload.default_price,
        )? {
            Resolved::Found(plan) => plan,
            Resolved::SkipWrite(reason) => return Ok(IngestOutcome::Skipped { reason }),
        };

        let row = self.products.upsert(payload.record(plan.id)).await?;
        tracing::info!(product_id = %row.id, stripe_id = %row.stripe_id, "product synchronized");
        Ok(IngestOutcome::written("product", row.stripe_id))
    }
}

#[async_trait]
impl EventFamilyHandler for PlanProductHandler {
    fn family(&self) -> &'static str {
        "plan-product"
    }

    fn handles(&self) -> &'static [EventKind] {
        HANDLED_KINDS
    }

    async fn apply(&self, event: &StripeEvent) -> Result<IngestOutcome, WebhookError> {
        match event.kind() {
            EventKind::PlanCreated | EventKind::PlanUpdated => self.apply_plan(event).await,
            EventKind::ProductCreated | EventKind::ProductUpdated => {
                self.apply_product(event).await
            }
            _ => Ok(IngestOutcome::Ignored {
                event_type: event.event_type.clone(),
            }),
        }
    }
}
