//! Typed webhook payload decoding.
//!
//! Every handler decodes `event.data.object` into one of these records before
//! touching the store. Decoding fails fast with a [`DecodeError`] naming the
//! offending field instead of threading absent values through the handlers.
//!
//! Field sets mirror the payment platform's payload shapes; only the fields
//! this service persists are decoded, the rest of the object is ignored.

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::ports::{
    CustomerRecord, InvoiceRecord, PlanRecord, ProductRecord, SubscriptionRecord,
};

use super::timestamp::epoch_to_utc;

/// Errors produced while decoding a payload object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A required field is absent or null.
    #[error("missing field: {0}")]
    Missing(&'static str),

    /// A field is present but has the wrong shape.
    #[error("invalid field {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl DecodeError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Field extraction helpers
// ════════════════════════════════════════════════════════════════════════════════

fn required<'a>(object: &'a Value, field: &'static str) -> Result<&'a Value, DecodeError> {
    match object.pointer(field_pointer(field).as_str()) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(DecodeError::Missing(field)),
    }
}

fn optional<'a>(object: &'a Value, field: &'static str) -> Option<&'a Value> {
    object
        .pointer(field_pointer(field).as_str())
        .filter(|v| !v.is_null())
}

/// Translates a dotted field path ("items.data[0].plan.id") into a JSON pointer.
fn field_pointer(field: &str) -> String {
    let mut pointer = String::new();
    for segment in field.split('.') {
        match segment.split_once('[') {
            Some((name, index)) => {
                pointer.push('/');
                pointer.push_str(name);
                pointer.push('/');
                pointer.push_str(index.trim_end_matches(']'));
            }
            None => {
                pointer.push('/');
                pointer.push_str(segment);
            }
        }
    }
    pointer
}

fn string(object: &Value, field: &'static str) -> Result<String, DecodeError> {
    required(object, field)?
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| DecodeError::invalid(field, "expected a string"))
}

fn opt_string(object: &Value, field: &'static str) -> Result<Option<String>, DecodeError> {
    match optional(object, field) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_owned()))
            .ok_or_else(|| DecodeError::invalid(field, "expected a string")),
    }
}

fn boolean(object: &Value, field: &'static str) -> Result<bool, DecodeError> {
    required(object, field)?
        .as_bool()
        .ok_or_else(|| DecodeError::invalid(field, "expected a boolean"))
}

fn integer(object: &Value, field: &'static str) -> Result<i64, DecodeError> {
    required(object, field)?
        .as_i64()
        .ok_or_else(|| DecodeError::invalid(field, "expected an integer"))
}

fn opt_integer(object: &Value, field: &'static str) -> Result<Option<i64>, DecodeError> {
    match optional(object, field) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| DecodeError::invalid(field, "expected an integer")),
    }
}

fn quantity(object: &Value, field: &'static str) -> Result<i32, DecodeError> {
    let raw = opt_integer(object, field)?.unwrap_or(1);
    i32::try_from(raw).map_err(|_| DecodeError::invalid(field, "quantity out of range"))
}

/// Flattens a Stripe address object into a single display line.
fn address_line(object: &Value, field: &'static str) -> Option<String> {
    let address = optional(object, field)?;
    let parts: Vec<&str> = ["line1", "line2", "city", "state", "postal_code", "country"]
        .iter()
        .filter_map(|key| address.get(*key).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Plan
// ════════════════════════════════════════════════════════════════════════════════

/// Decoded `plan.*` payload.
#[derive(Debug, Clone)]
pub struct PlanPayload {
    pub id: String,
    pub active: bool,
    pub amount: i64,
    pub amount_decimal: String,
    pub currency: String,
    pub interval: String,
    pub interval_count: i32,
    pub created: Option<i64>,
}

impl PlanPayload {
    pub fn decode(object: &Value) -> Result<Self, DecodeError> {
        Ok(Self {
            id: string(object, "id")?,
            active: boolean(object, "active")?,
            amount: integer(object, "amount")?,
            amount_decimal: string(object, "amount_decimal")?,
            currency: string(object, "currency")?,
            interval: string(object, "interval")?,
            interval_count: integer(object, "interval_count")?
                .try_into()
                .map_err(|_| DecodeError::invalid("interval_count", "out of range"))?,
            created: opt_integer(object, "created")?,
        })
    }

    /// Maps the payload onto the plans upsert record.
    pub fn record(&self) -> PlanRecord {
        PlanRecord {
            stripe_id: self.id.clone(),
            active: self.active,
            amount: self.amount,
            amount_decimal: self.amount_decimal.clone(),
            currency: self.currency.clone(),
            interval: self.interval.clone(),
            interval_count: self.interval_count,
            created_at: epoch_to_utc(self.created),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Product
// ════════════════════════════════════════════════════════════════════════════════

/// Decoded `product.*` payload.
#[derive(Debug, Clone)]
pub struct ProductPayload {
    pub id: String,
    /// External id of the default price; resolves the owning plan.
    pub default_price: String,
    pub name: String,
    pub active: bool,
    pub created: Option<i64>,
}

impl ProductPayload {
    pub fn decode(object: &Value) -> Result<Self, DecodeError> {
        Ok(Self {
            id: string(object, "id")?,
            default_price: string(object, "default_price")?,
            name: string(object, "name")?,
            active: boolean(object, "active")?,
            created: opt_integer(object, "created")?,
        })
    }

    /// Maps the payload onto the products upsert record.
    pub fn record(&self, plan_id: Uuid) -> ProductRecord {
        ProductRecord {
            stripe_id: self.id.clone(),
            plan_id,
            name: self.name.clone(),
            active: self.active,
            created_at: epoch_to_utc(self.created),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Customer
// ════════════════════════════════════════════════════════════════════════════════

/// Decoded `customer.updated` payload.
#[derive(Debug, Clone)]
pub struct CustomerPayload {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Internal owner reference carried in the platform metadata.
    pub user_id: Option<Uuid>,
    pub created: Option<i64>,
}

impl CustomerPayload {
    pub fn decode(object: &Value) -> Result<Self, DecodeError> {
        Ok(Self {
            id: string(object, "id")?,
            email: opt_string(object, "email")?,
            name: opt_string(object, "name")?,
            phone: opt_string(object, "phone")?,
            address: address_line(object, "address"),
            user_id: opt_string(object, "metadata.user_id")?
                .and_then(|raw| Uuid::parse_str(&raw).ok()),
            created: opt_integer(object, "created")?,
        })
    }

    /// Maps the payload onto the customers upsert record.
    pub fn record(&self) -> CustomerRecord {
        CustomerRecord {
            stripe_id: self.id.clone(),
            user_id: self.user_id,
            email: self.email.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            created_at: epoch_to_utc(self.created),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscription
// ════════════════════════════════════════════════════════════════════════════════

/// Decoded `customer.subscription.*` payload.
///
/// Deleted events carry the same object with a changed status, so all three
/// kinds decode identically. Identifiers always come from the verified
/// payload, never from anywhere else.
#[derive(Debug, Clone)]
pub struct SubscriptionPayload {
    pub id: String,
    /// External id of the subscribed customer.
    pub customer: String,
    /// External id of the plan on the first subscription item.
    pub plan_id: String,
    pub status: String,
    pub billing_cycle_anchor: Option<i64>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub cancel_at: Option<i64>,
    pub canceled_at: Option<i64>,
    pub cancel_at_period_end: bool,
    pub quantity: i32,
    pub created: Option<i64>,
}

impl SubscriptionPayload {
    pub fn decode(object: &Value) -> Result<Self, DecodeError> {
        Ok(Self {
            id: string(object, "id")?,
            customer: string(object, "customer")?,
            plan_id: string(object, "items.data[0].plan.id")?,
            status: string(object, "status")?,
            billing_cycle_anchor: opt_integer(object, "billing_cycle_anchor")?,
            current_period_start: opt_integer(object, "items.data[0].current_period_start")?,
            current_period_end: opt_integer(object, "items.data[0].current_period_end")?,
            cancel_at: opt_integer(object, "cancel_at")?,
            canceled_at: opt_integer(object, "canceled_at")?,
            cancel_at_period_end: boolean(object, "cancel_at_period_end")?,
            quantity: quantity(object, "quantity")?,
            created: opt_integer(object, "created")?,
        })
    }

    /// Maps the payload onto the subscriptions upsert record, given the
    /// resolved internal references.
    pub fn record(&self, customer_id: Uuid, plan_id: Uuid) -> SubscriptionRecord {
        SubscriptionRecord {
            stripe_id: self.id.clone(),
            customer_id,
            plan_id,
            status: self.status.clone(),
            billing_cycle_anchor: epoch_to_utc(self.billing_cycle_anchor),
            current_period_start: epoch_to_utc(self.current_period_start),
            current_period_end: epoch_to_utc(self.current_period_end),
            cancel_at: epoch_to_utc(self.cancel_at),
            canceled_at: epoch_to_utc(self.canceled_at),
            cancel_at_period_end: self.cancel_at_period_end,
            quantity: self.quantity,
            created_at: epoch_to_utc(self.created),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Invoice
// ════════════════════════════════════════════════════════════════════════════════

/// Decoded `invoice.*` payload.
#[derive(Debug, Clone)]
pub struct InvoicePayload {
    pub id: String,
    /// External id of the billed customer.
    pub customer: String,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    /// External id of the product on the first invoice line.
    pub product_id: String,
    pub status: String,
    pub amount_due: i64,
    pub amount_paid: i64,
    pub amount_remaining: i64,
    pub currency: String,
    pub period_start: Option<i64>,
    pub period_end: Option<i64>,
    pub quantity: i32,
    pub created: Option<i64>,
}

impl InvoicePayload {
    pub fn decode(object: &Value) -> Result<Self, DecodeError> {
        Ok(Self {
            id: string(object, "id")?,
            customer: string(object, "customer")?,
            customer_email: opt_string(object, "customer_email")?,
            customer_name: opt_string(object, "customer_name")?,
            customer_phone: opt_string(object, "customer_phone")?,
            customer_address: address_line(object, "customer_address"),
            product_id: string(object, "lines.data[0].price.product")?,
            status: string(object, "status")?,
            amount_due: integer(object, "amount_due")?,
            amount_paid: integer(object, "amount_paid")?,
            amount_remaining: integer(object, "amount_remaining")?,
            currency: string(object, "currency")?,
            period_start: opt_integer(object, "period_start")?,
            period_end: opt_integer(object, "period_end")?,
            quantity: quantity(object, "lines.data[0].quantity")?,
            created: opt_integer(object, "created")?,
        })
    }

    /// Maps the payload onto the invoices upsert record, given the resolved
    /// internal references.
    pub fn record(&self, product_id: Uuid, customer_id: Uuid) -> InvoiceRecord {
        InvoiceRecord {
            stripe_id: self.id.clone(),
            product_id,
            customer_id,
            status: self.status.clone(),
            amount_due: self.amount_due,
            amount_paid: self.amount_paid,
            amount_remaining: self.amount_remaining,
            currency: self.currency.clone(),
            period_start: epoch_to_utc(self.period_start),
            period_end: epoch_to_utc(self.period_end),
            quantity: self.quantity,
            created_at: epoch_to_utc(self.created),
        }
    }

    /// Customer record for first-sight creation from an invoice event.
    pub fn customer_record(&self) -> CustomerRecord {
        CustomerRecord {
            stripe_id: self.customer.clone(),
            user_id: None,
            email: self.customer_email.clone(),
            name: self.customer_name.clone(),
            phone: self.customer_phone.clone(),
            address: self.customer_address.clone(),
            created_at: None,
        }
    }
}
