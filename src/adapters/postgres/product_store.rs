//! PostgreSQL implementation of ProductStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::ports::{ProductRecord, ProductRow, ProductStore, StoreError};

/// PostgreSQL implementation of the ProductStore port.
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    /// Creates a new PostgresProductStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a product.
#[derive(Debug, sqlx::FromRow)]
struct ProductDbRow {
    id: Uuid,
    stripe_id: String,
    plan_id: Uuid,
    name: String,
    active: bool,
    created_at: Option<DateTime<Utc>>,
}

impl From<ProductDbRow> for ProductRow {
    fn from(row: ProductDbRow) -> Self {
        ProductRow {
            id: row.id,
            stripe_id: row.stripe_id,
            plan_id: row.plan_id,
            name: row.name,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    async fn find_by_stripe_id(&self, stripe_id: &str) -> Result<Option<ProductRow>, StoreError> {
        let row: Option<ProductDbRow> = sqlx::query_as(
            r#"
            SELECT id, stripe_id, plan_id, name, active, created_at
            FROM products
            WHERE stripe_id = $1
            "#,
        )
        .bind(stripe_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Failed to find product: {}", e)))?;

        Ok(row.map(ProductRow::from))
    }

    async fn upsert(&self, record: ProductRecord) -> Result<ProductRow, StoreError> {
        let row: ProductDbRow = sqlx::query_as(
            r#"
            INSERT INTO products (id, stripe_id, plan_id, name, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (stripe_id) DO UPDATE SET
                plan_id = EXCLUDED.plan_id,
                name = EXCLUDED.name,
                active = EXCLUDED.active,
                created_at = EXCLUDED.created_at
            RETURNING id, stripe_id, plan_id, name, active, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.stripe_id)
        .bind(record.plan_id)
        .bind(&record.name)
        .bind(record.active)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::UpsertFailed(format!("Failed to upsert product: {}", e)))?;

        Ok(row.into())
    }
}
