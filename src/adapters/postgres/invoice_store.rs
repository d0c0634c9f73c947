//! PostgreSQL implementation of InvoiceStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::ports::{InvoiceRecord, InvoiceRow, InvoiceStore, StoreError};

/// PostgreSQL implementation of the InvoiceStore port.
pub struct PostgresInvoiceStore {
    pool: PgPool,
}

impl PostgresInvoiceStore {
    /// Creates a new PostgresInvoiceStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an invoice.
#[derive(Debug, sqlx::FromRow)]
struct InvoiceDbRow {
    id: Uuid,
    stripe_id: String,
    product_id: Uuid,
    customer_id: Uuid,
    status: String,
    amount_due: i64,
    amount_paid: i64,
    amount_remaining: i64,
    currency: String,
    period_start: Option<DateTime<Utc>>,
    period_end: Option<DateTime<Utc>>,
    quantity: i32,
    created_at: Option<DateTime<Utc>>,
}

impl From<InvoiceDbRow> for InvoiceRow {
    fn from(row: InvoiceDbRow) -> Self {
        InvoiceRow {
            id: row.id,
            stripe_id: row.stripe_id,
            product_id: row.product_id,
            customer_id: row.customer_id,
            status: row.status,
            amount_due: row.amount_due,
            amount_paid: row.amount_paid,
            amount_remaining: row.amount_remaining,
            currency: row.currency,
            period_start: row.period_start,
            period_end: row.period_end,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl InvoiceStore for PostgresInvoiceStore {
    async fn upsert(&self, record: InvoiceRecord) -> Result<InvoiceRow, StoreError> {
        let row: InvoiceDbRow = sqlx::query_as(
            r#"
            INSERT INTO invoices (
                id, stripe_id, product_id, customer_id, status, amount_due,
                amount_paid, amount_remaining, currency, period_start, period_end,
                quantity, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (stripe_id) DO UPDATE SET
                product_id = EXCLUDED.product_id,
                customer_id = EXCLUDED.customer_id,
                status = EXCLUDED.status,
                amount_due = EXCLUDED.amount_due,
                amount_paid = EXCLUDED.amount_paid,
                amount_remaining = EXCLUDED.amount_remaining,
                currency = EXCLUDED.currency,
                period_start = EXCLUDED.period_start,
                period_end = EXCLUDED.period_end,
                quantity = EXCLUDED.quantity,
                created_at = EXCLUDED.created_at
            RETURNING id, stripe_id, product_id, customer_id, status, amount_due,
                      amount_paid, amount_remaining, currency, period_start, period_end,
                      quantity, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.stripe_id)
        .bind(record.product_id)
        .bind(record.customer_id)
        .bind(&record.status)
        .bind(record.amount_due)
        .bind(record.amount_paid)
        .bind(record.amount_remaining)
        .bind(&record.currency)
        .bind(record.period_start)
        .bind(record.period_end)
        .bind(record.quantity)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::UpsertFailed(format!("Failed to upsert invoice: {}", e)))?;

        Ok(row.into())
    }
}
