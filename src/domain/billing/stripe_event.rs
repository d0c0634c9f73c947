//! Stripe webhook event envelope.
//!
//! Defines the verified wrapper `{ type, data: { object } }` delivered by the
//! webhook sender, and the closed enumeration of event kinds this service
//! synchronizes. Fields outside the envelope contract are ignored.

use serde::{Deserialize, Serialize};

/// Stripe webhook event (simplified).
///
/// Contains the essential envelope fields needed for routing and decoding.
/// Additional fields from Stripe's full event schema are ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "customer.subscription.updated").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    /// Whether this is a live mode event (vs test mode).
    pub livemode: bool,

    /// API version used to render this event.
    pub api_version: String,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,

    /// Previous values for updated attributes (only for update events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<serde_json::Value>,
}

impl StripeEvent {
    /// Returns true if this is a live mode event.
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    /// Returns true if this is a test mode event.
    pub fn is_test(&self) -> bool {
        !self.livemode
    }

    /// Parse the event type into a known kind.
    pub fn kind(&self) -> EventKind {
        EventKind::from_type(&self.event_type)
    }
}

/// Event kinds this service handles, grouped by family.
///
/// Matching is exact and case-sensitive; anything else is `Unknown` and is
/// acknowledged without processing so the sender does not retry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A billing plan (price) was created.
    PlanCreated,
    /// A billing plan (price) was updated.
    PlanUpdated,
    /// A product was created.
    ProductCreated,
    /// A product was updated.
    ProductUpdated,
    /// A customer subscription was created.
    SubscriptionCreated,
    /// A customer subscription was updated.
    SubscriptionUpdated,
    /// A customer subscription was deleted (status change, not a row delete).
    SubscriptionDeleted,
    /// A customer's details were updated.
    CustomerUpdated,
    /// An invoice was created.
    InvoiceCreated,
    /// An invoice was updated.
    InvoiceUpdated,
    /// Unknown or unhandled event type.
    Unknown,
}

impl EventKind {
    /// Parse an event kind from the envelope's `type` string.
    pub fn from_type(s: &str) -> Self {
        match s {
            "plan.created" => Self::PlanCreated,
            "plan.updated" => Self::PlanUpdated,
            "product.created" => Self::ProductCreated,
            "product.updated" => Self::ProductUpdated,
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            "customer.updated" => Self::CustomerUpdated,
            "invoice.created" => Self::InvoiceCreated,
            "invoice.updated" => Self::InvoiceUpdated,
            _ => Self::Unknown,
        }
    }

    /// The Stripe event type string for this kind.
    pub fn as_type(&self) -> &'static str {
        match self {
            Self::PlanCreated => "plan.created",
            Self::PlanUpdated => "plan.updated",
            Self::ProductCreated => "product.created",
            Self::ProductUpdated => "product.updated",
            Self::SubscriptionCreated => "customer.subscription.created",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::CustomerUpdated => "customer.updated",
            Self::InvoiceCreated => "invoice.created",
            Self::InvoiceUpdated => "invoice.updated",
            Self::Unknown => "unknown",
        }
    }
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    previous_attributes: Option<serde_json::Value>,
    livemode: bool,
    api_version: String,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "plan.created".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
            previous_attributes: None,
            livemode: false,
            api_version: "2025-03-31".to_string(),
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn created(mut self, created: i64) -> Self {
        self.created = created;
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
                previous_attributes: self.previous_attributes,
            },
            livemode: self.livemode,
            api_version: self.api_version,
        }
    }
}
