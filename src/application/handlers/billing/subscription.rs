//! Event-family handler for subscription lifecycle events.
//!
//! Created, updated and deleted all converge on the same upsert; a deleted
//! subscription is a status change, not a row delete. Both references (plan
//! and customer) are soft: an event arriving before its plan or customer is
//! accepted and dropped, because rejecting it would make the sender retry an
//! event that may never become resolvable.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::billing::{
    apply_policy, EventFamilyHandler, EventKind, IngestOutcome, ReferencePolicy, Resolved,
    StripeEvent, SubscriptionPayload, WebhookError,
};
use crate::ports::{CustomerStore, PlanStore, SubscriptionStore};

const HANDLED_KINDS: &[EventKind] = &[
    EventKind::SubscriptionCreated,
    EventKind::SubscriptionUpdated,
    EventKind::SubscriptionDeleted,
];

/// Handles `customer.subscription.*` events.
pub struct SubscriptionHandler {
    plans: Arc<dyn PlanStore>,
    customers: Arc<dyn CustomerStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl SubscriptionHandler {
    pub fn new(
        plans: Arc<dyn PlanStore>,
        customers: Arc<dyn CustomerStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
    ) -> Self {
        Self {
            plans,
            customers,
            subscriptions,
        }
    }
}

#[async_trait]
impl EventFamilyHandler for SubscriptionHandler {
    fn family(&self) -> &'static str {
        "subscription"
    }

    fn handles(&self) -> &'static [EventKind] {
        HANDLED_KINDS
    }

    async fn apply(&self, event: &StripeEvent) -> Result<IngestOutcome, WebhookError> {
        let payload = SubscriptionPayload::decode(&event.data.object)?;

        let found = self.plans.find_by_stripe_id(&payload.plan_id).await?;
        let plan = match apply_policy(found, ReferencePolicy::Soft, "plan", &payload.plan_id)? {
            Resolved::Found(plan) => plan,
            Resolved::SkipWrite(reason) => return Ok(IngestOutcome::Skipped { reason }),
        };

        let found = self.customers.find_by_stripe_id(&payload.customer).await?;
        let customer =
            match apply_policy(found, ReferencePolicy::Soft, "customer", &payload.customer)? {
                Resolved::Found(customer) => customer,
                Resolved::SkipWrite(reason) => return Ok(IngestOutcome::Skipped { reason }),
            };

        let row = self
            .subscriptions
            .upsert(payload.record(customer.id, plan.id))
            .await?;
        tracing::info!(
            subscription_id = %row.id,
            stripe_id = %row.stripe_id,
            status = %row.status,
            "subscription synchronized"
        );
        Ok(IngestOutcome::written("subscription", row.stripe_id))
    }
}
