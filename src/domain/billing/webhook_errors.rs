//! Webhook error types.
//!
//! Defines all error conditions that can occur while receiving and persisting
//! a webhook event, with HTTP status code mapping and retryability semantics.

use axum::http::StatusCode;
use thiserror::Error;

use super::payloads::DecodeError;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is outside the acceptable window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse the signature header or JSON envelope.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Payload decoding failed at the boundary.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A reference the handler treats as fatal could not be resolved.
    #[error("{entity} not found for {stripe_id}")]
    ReferenceNotFound {
        entity: &'static str,
        stripe_id: String,
    },

    /// Query or upsert against the backing store failed.
    #[error("Store error: {0}")]
    Store(String),
}

impl WebhookError {
    /// Convenience constructor for a fatal unresolved reference.
    pub fn reference_not_found(entity: &'static str, stripe_id: impl Into<String>) -> Self {
        Self::ReferenceNotFound {
            entity,
            stripe_id: stripe_id.into(),
        }
    }

    /// Returns true if Stripe should retry delivering this webhook.
    ///
    /// Retryable errors indicate temporary failures that may succeed on
    /// subsequent attempts (store issues, eventual consistency of references).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Store(_) | WebhookError::ReferenceNotFound { .. }
        )
    }

    /// Maps the error to an appropriate HTTP status code.
    ///
    /// Status codes determine Stripe's retry behavior:
    /// - 2xx: Event acknowledged, no retry
    /// - 4xx: Client error, no retry
    /// - 5xx: Server error, will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Signature and envelope failures: reject, never process the payload
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::Decode(_) => StatusCode::BAD_REQUEST,

            // Fatal-policy reference miss
            WebhookError::ReferenceNotFound { .. } => StatusCode::NOT_FOUND,

            // Store errors: will retry
            WebhookError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
