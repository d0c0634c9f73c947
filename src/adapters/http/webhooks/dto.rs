//! HTTP DTOs for the webhook endpoints.
//!
//! Every webhook response carries the same shape: a boolean `ok` flag and a
//! human-readable message. Exactly one response is produced per request.

use serde::{Deserialize, Serialize};

/// Acknowledgement body returned by every webhook endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    /// Whether the event was accepted.
    pub ok: bool,
    /// Human-readable detail.
    pub message: String,
}

impl AckResponse {
    /// Success acknowledgement.
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    /// Failure acknowledgement.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_serializes_with_ok_true() {
        let body = serde_json::to_value(AckResponse::accepted("done")).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["message"], "done");
    }

    #[test]
    fn rejected_serializes_with_ok_false() {
        let body = serde_json::to_value(AckResponse::rejected("bad signature")).unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["message"], "bad signature");
    }
}
