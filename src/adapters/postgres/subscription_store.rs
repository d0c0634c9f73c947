//! PostgreSQL implementation of SubscriptionStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::ports::{StoreError, SubscriptionRecord, SubscriptionRow, SubscriptionStore};

/// PostgreSQL implementation of the SubscriptionStore port.
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    /// Creates a new PostgresSubscriptionStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionDbRow {
    id: Uuid,
    stripe_id: String,
    customer_id: Uuid,
    plan_id: Uuid,
    status: String,
    billing_cycle_anchor: Option<DateTime<Utc>>,
    current_period_start: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    cancel_at: Option<DateTime<Utc>>,
    canceled_at: Option<DateTime<Utc>>,
    cancel_at_period_end: bool,
    quantity: i32,
    created_at: Option<DateTime<Utc>>,
}

impl From<SubscriptionDbRow> for SubscriptionRow {
    fn from(row: SubscriptionDbRow) -> Self {
        SubscriptionRow {
            id: row.id,
            stripe_id: row.stripe_id,
            customer_id: row.customer_id,
            plan_id: row.plan_id,
            status: row.status,
            billing_cycle_anchor: row.billing_cycle_anchor,
            current_period_start: row.current_period_start,
            current_period_end: row.current_period_end,
            cancel_at: row.cancel_at,
            canceled_at: row.canceled_at,
            cancel_at_period_end: row.cancel_at_period_end,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn upsert(&self, record: SubscriptionRecord) -> Result<SubscriptionRow, StoreError> {
        let row: SubscriptionDbRow = sqlx::query_as(
            r#"
            INSERT INTO subscriptions (
                id, stripe_id, customer_id, plan_id, status, billing_cycle_anchor,
                current_period_start, current_period_end, cancel_at, canceled_at,
                cancel_at_period_end, quantity, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (stripe_id) DO UPDATE SET
                customer_id = EXCLUDED.customer_id,
                plan_id = EXCLUDED.plan_id,
                status = EXCLUDED.status,
                billing_cycle_anchor = EXCLUDED.billing_cycle_anchor,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                cancel_at = EXCLUDED.cancel_at,
                canceled_at = EXCLUDED.canceled_at,
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                quantity = EXCLUDED.quantity,
                created_at = EXCLUDED.created_at
            RETURNING id, stripe_id, customer_id, plan_id, status, billing_cycle_anchor,
                      current_period_start, current_period_end, cancel_at, canceled_at,
                      cancel_at_period_end, quantity, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.stripe_id)
        .bind(record.customer_id)
        .bind(record.plan_id)
        .bind(&record.status)
        .bind(record.billing_cycle_anchor)
        .bind(record.current_period_start)
        .bind(record.current_period_end)
        .bind(record.cancel_at)
        .bind(record.canceled_at)
        .bind(record.cancel_at_period_end)
        .bind(record.quantity)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::UpsertFailed(format!("Failed to upsert subscription: {}", e)))?;

        Ok(row.into())
    }
}
