//! Store ports for synchronized billing entities.
//!
//! One port per table. Each port combines the two contracts every webhook
//! handler needs:
//!
//! - **Reference resolution**: `find_by_*` returns `Ok(Some(row))` for a hit,
//!   `Ok(None)` for "not found" (not a failure), and `Err(StoreError)` only
//!   for an actual query error. Callers decide per entity whether an
//!   unresolved reference is fatal or soft.
//! - **Upsert**: insert-or-update keyed on the `stripe_id` unique column.
//!   All supplied fields overwrite on conflict; calling twice with identical
//!   input yields the same single row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Errors from the backing store.
///
/// "Not found" is never an error; it is the `None` side of a lookup.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A lookup query failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// An insert-or-update failed.
    #[error("Upsert failed: {0}")]
    UpsertFailed(String),
}

// ════════════════════════════════════════════════════════════════════════════════
// Customers
// ════════════════════════════════════════════════════════════════════════════════

/// A stored customer row.
#[derive(Debug, Clone)]
pub struct CustomerRow {
    pub id: Uuid,
    pub stripe_id: String,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Upsert input for a customer.
#[derive(Debug, Clone)]
pub struct CustomerRecord {
    pub stripe_id: String,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Port for the `customers` table.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Find a customer by its Stripe external id.
    async fn find_by_stripe_id(&self, stripe_id: &str)
        -> Result<Option<CustomerRow>, StoreError>;

    /// Find a customer by email.
    ///
    /// Fallback matching for rows created before the Stripe id was known.
    async fn find_by_email(&self, email: &str) -> Result<Option<CustomerRow>, StoreError>;

    /// Insert or update a customer, keyed on `stripe_id`.
    async fn upsert(&self, record: CustomerRecord) -> Result<CustomerRow, StoreError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Plans
// ════════════════════════════════════════════════════════════════════════════════

/// A stored plan row.
#[derive(Debug, Clone)]
pub struct PlanRow {
    pub id: Uuid,
    pub stripe_id: String,
    pub active: bool,
    pub amount: i64,
    pub amount_decimal: String,
    pub currency: String,
    pub interval: String,
    pub interval_count: i32,
    pub created_at: Option<DateTime<Utc>>,
}

/// Upsert input for a plan.
#[derive(Debug, Clone)]
pub struct PlanRecord {
    pub stripe_id: String,
    pub active: bool,
    pub amount: i64,
    pub amount_decimal: String,
    pub currency: String,
    pub interval: String,
    pub interval_count: i32,
    pub created_at: Option<DateTime<Utc>>,
}

/// Port for the `plans` table.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Find a plan by its Stripe external id (a price id).
    async fn find_by_stripe_id(&self, stripe_id: &str) -> Result<Option<PlanRow>, StoreError>;

    /// Insert or update a plan, keyed on `stripe_id`.
    async fn upsert(&self, record: PlanRecord) -> Result<PlanRow, StoreError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Products
// ════════════════════════════════════════════════════════════════════════════════

/// A stored product row.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: Uuid,
    pub stripe_id: String,
    pub plan_id: Uuid,
    pub name: String,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Upsert input for a product.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub stripe_id: String,
    pub plan_id: Uuid,
    pub name: String,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Port for the `products` table.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Find a product by its Stripe external id.
    async fn find_by_stripe_id(&self, stripe_id: &str) -> Result<Option<ProductRow>, StoreError>;

    /// Insert or update a product, keyed on `stripe_id`.
    async fn upsert(&self, record: ProductRecord) -> Result<ProductRow, StoreError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

/// A stored subscription row.
#[derive(Debug, Clone)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub stripe_id: String,
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub status: String,
    pub billing_cycle_anchor: Option<DateTime<Utc>>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub quantity: i32,
    pub created_at: Option<DateTime<Utc>>,
}

/// Upsert input for a subscription.
///
/// Deleted subscriptions flow through the same record with a changed status;
/// there is no hard delete.
#[derive(Debug, Clone)]
pub struct SubscriptionRecord {
    pub stripe_id: String,
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub status: String,
    pub billing_cycle_anchor: Option<DateTime<Utc>>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub quantity: i32,
    pub created_at: Option<DateTime<Utc>>,
}

/// Port for the `subscriptions` table.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Insert or update a subscription, keyed on `stripe_id`.
    async fn upsert(&self, record: SubscriptionRecord) -> Result<SubscriptionRow, StoreError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Invoices
// ════════════════════════════════════════════════════════════════════════════════

/// A stored invoice row.
#[derive(Debug, Clone)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub stripe_id: String,
    pub product_id: Uuid,
    pub customer_id: Uuid,
    pub status: String,
    pub amount_due: i64,
    pub amount_paid: i64,
    pub amount_remaining: i64,
    pub currency: String,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub quantity: i32,
    pub created_at: Option<DateTime<Utc>>,
}

/// Upsert input for an invoice.
#[derive(Debug, Clone)]
pub struct InvoiceRecord {
    pub stripe_id: String,
    pub product_id: Uuid,
    pub customer_id: Uuid,
    pub status: String,
    pub amount_due: i64,
    pub amount_paid: i64,
    pub amount_remaining: i64,
    pub currency: String,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub quantity: i32,
    pub created_at: Option<DateTime<Utc>>,
}

/// Port for the `invoices` table.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Insert or update an invoice, keyed on `stripe_id`.
    async fn upsert(&self, record: InvoiceRecord) -> Result<InvoiceRow, StoreError>;
}
