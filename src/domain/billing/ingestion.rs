//! Webhook ingestion pipeline.
//!
//! One pipeline serves every event family: verify the signature, check the
//! kind against the family's closed set, then hand the verified event to the
//! family handler. Per-kind differences live entirely in the handlers — the
//! payload field mapping and the fatal-vs-soft reference policy.
//!
//! Idempotency comes from the store upserts keyed on external ids; the
//! pipeline itself keeps no state and deduplicates nothing. Repeated or
//! out-of-order delivery of the same external id converges to the last
//! writer's values.

use std::sync::Arc;

use async_trait::async_trait;

use crate::ports::StoreError;

use super::stripe_event::{EventKind, StripeEvent};
use super::webhook_errors::WebhookError;
use super::webhook_verifier::WebhookVerifier;

/// What to do when a foreign-key lookup finds nothing.
///
/// The sender retries on non-2xx responses, so a fatal policy on a reference
/// that will never resolve means retries until the event expires. Which
/// policy applies is a per-entity decision and is spelled out at each
/// resolution site rather than unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencePolicy {
    /// Reject the event; the sender will retry it.
    Fatal,
    /// Accept the event but skip the write.
    Soft,
}

/// Outcome of resolving one reference under a policy.
#[derive(Debug)]
pub enum Resolved<T> {
    /// The reference resolved to a stored row.
    Found(T),
    /// Soft policy: the event is accepted, the write is skipped.
    SkipWrite(String),
}

/// Applies the per-entity policy to a reference lookup result.
pub fn apply_policy<T>(
    found: Option<T>,
    policy: ReferencePolicy,
    entity: &'static str,
    stripe_id: &str,
) -> Result<Resolved<T>, WebhookError> {
    match (found, policy) {
        (Some(row), _) => Ok(Resolved::Found(row)),
        (None, ReferencePolicy::Fatal) => {
            Err(WebhookError::reference_not_found(entity, stripe_id))
        }
        (None, ReferencePolicy::Soft) => {
            let reason = format!("{} {} not found, skipping write", entity, stripe_id);
            tracing::warn!(entity, stripe_id, "unresolved reference accepted");
            Ok(Resolved::SkipWrite(reason))
        }
    }
}

/// Result of ingesting one verified event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// An entity row was written.
    Written {
        entity: &'static str,
        stripe_id: String,
    },
    /// The event was accepted but no row was written (soft reference miss).
    Skipped { reason: String },
    /// The event kind is not handled by this receiver.
    Ignored { event_type: String },
}

impl IngestOutcome {
    /// Convenience constructor for a successful write.
    pub fn written(entity: &'static str, stripe_id: impl Into<String>) -> Self {
        Self::Written {
            entity,
            stripe_id: stripe_id.into(),
        }
    }

    /// Human-readable acknowledgement message.
    pub fn message(&self) -> String {
        match self {
            Self::Written { entity, stripe_id } => {
                format!("{} {} synchronized", entity, stripe_id)
            }
            Self::Skipped { reason } => format!("event accepted: {}", reason),
            Self::Ignored { event_type } => format!("event {} not handled", event_type),
        }
    }
}

/// Handler for one event family.
///
/// Implementations are stateless apart from their injected store ports and
/// process every kind their family declares.
#[async_trait]
pub trait EventFamilyHandler: Send + Sync {
    /// Family name for logging.
    fn family(&self) -> &'static str;

    /// The closed set of kinds this family processes.
    fn handles(&self) -> &'static [EventKind];

    /// Applies a verified event of a handled kind.
    async fn apply(&self, event: &StripeEvent) -> Result<IngestOutcome, WebhookError>;
}

/// The ingestion pipeline shared by every webhook surface.
///
/// Verification always runs before the payload is inspected; kinds outside
/// the family's set (including unknown kinds) are logged and acknowledged so
/// the sender does not retry them.
pub struct WebhookIngestion<H> {
    verifier: Arc<WebhookVerifier>,
    handler: H,
}

impl<H: EventFamilyHandler> WebhookIngestion<H> {
    /// Creates a pipeline for one family handler.
    pub fn new(verifier: Arc<WebhookVerifier>, handler: H) -> Self {
        Self { verifier, handler }
    }

    /// Verifies, routes and applies one raw webhook request.
    pub async fn ingest(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<IngestOutcome, WebhookError> {
        let event = self.verifier.verify_and_parse(payload, signature)?;

        let kind = event.kind();
        if !self.handler.handles().contains(&kind) {
            tracing::info!(
                family = self.handler.family(),
                event_id = %event.id,
                event_type = %event.event_type,
                "unhandled event kind acknowledged"
            );
            return Ok(IngestOutcome::Ignored {
                event_type: event.event_type,
            });
        }

        tracing::info!(
            family = self.handler.family(),
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.livemode,
            api_version = %event.api_version,
            "processing webhook event"
        );
        self.handler.apply(&event).await
    }
}

impl From<StoreError> for WebhookError {
    fn from(err: StoreError) -> Self {
        WebhookError::Store(err.to_string())
    }
}
