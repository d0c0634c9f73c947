//! Billing webhook domain.
//!
//! Everything between the raw HTTP request and the store ports: signature
//! verification, the event envelope and kind routing, typed payload decoding,
//! timestamp normalization, and the ingestion pipeline with its per-entity
//! reference policies.

mod ingestion;
mod payloads;
mod stripe_event;
mod timestamp;
mod webhook_errors;
mod webhook_verifier;

pub use ingestion::{
    apply_policy, EventFamilyHandler, IngestOutcome, ReferencePolicy, Resolved, WebhookIngestion,
};
pub use payloads::{
    CustomerPayload, DecodeError, InvoicePayload, PlanPayload, ProductPayload,
    SubscriptionPayload,
};
pub use stripe_event::{EventKind, StripeEvent, StripeEventData};
pub use timestamp::epoch_to_utc;
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{sign_payload, SignatureHeader, WebhookVerifier};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
