//! PostgreSQL implementation of PlanStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::ports::{PlanRecord, PlanRow, PlanStore, StoreError};

/// PostgreSQL implementation of the PlanStore port.
///
/// Uses sqlx for type-safe database operations with connection pooling.
pub struct PostgresPlanStore {
    pool: PgPool,
}

impl PostgresPlanStore {
    /// Creates a new PostgresPlanStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a plan.
#[derive(Debug, sqlx::FromRow)]
struct PlanDbRow {
    id: Uuid,
    stripe_id: String,
    active: bool,
    amount: i64,
    amount_decimal: String,
    currency: String,
    interval: String,
    interval_count: i32,
    created_at: Option<DateTime<Utc>>,
}

impl From<PlanDbRow> for PlanRow {
    fn from(row: PlanDbRow) -> Self {
        PlanRow {
            id: row.id,
            stripe_id: row.stripe_id,
            active: row.active,
            amount: row.amount,
            amount_decimal: row.amount_decimal,
            currency: row.currency,
            interval: row.interval,
            interval_count: row.interval_count,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PlanStore for PostgresPlanStore {
    async fn find_by_stripe_id(&self, stripe_id: &str) -> Result<Option<PlanRow>, StoreError> {
        let row: Option<PlanDbRow> = sqlx::query_as(
            r#"
            SELECT id, stripe_id, active, amount, amount_decimal, currency,
                   "interval", interval_count, created_at
            FROM plans
            WHERE stripe_id = $1
            "#,
        )
        .bind(stripe_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Failed to find plan: {}", e)))?;

        Ok(row.map(PlanRow::from))
    }

    async fn upsert(&self, record: PlanRecord) -> Result<PlanRow, StoreError> {
        let row: PlanDbRow = sqlx::query_as(
            r#"
            INSERT INTO plans (
                id, stripe_id, active, amount, amount_decimal, currency,
                "interval", interval_count, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (stripe_id) DO UPDATE SET
                active = EXCLUDED.active,
                amount = EXCLUDED.amount,
                amount_decimal = EXCLUDED.amount_decimal,
                currency = EXCLUDED.currency,
                "interval" = EXCLUDED."interval",
                interval_count = EXCLUDED.interval_count,
                created_at = EXCLUDED.created_at
            RETURNING id, stripe_id, active, amount, amount_decimal, currency,
                      "interval", interval_count, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.stripe_id)
        .bind(record.active)
        .bind(record.amount)
        .bind(&record.amount_decimal)
        .bind(&record.currency)
        .bind(&record.interval)
        .bind(record.interval_count)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::UpsertFailed(format!("Failed to upsert plan: {}", e)))?;

        Ok(row.into())
    }
}
