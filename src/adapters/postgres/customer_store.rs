//! PostgreSQL implementation of CustomerStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::ports::{CustomerRecord, CustomerRow, CustomerStore, StoreError};

/// PostgreSQL implementation of the CustomerStore port.
pub struct PostgresCustomerStore {
    pool: PgPool,
}

impl PostgresCustomerStore {
    /// Creates a new PostgresCustomerStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a customer.
#[derive(Debug, sqlx::FromRow)]
struct CustomerDbRow {
    id: Uuid,
    stripe_id: String,
    user_id: Option<Uuid>,
    email: Option<String>,
    name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl From<CustomerDbRow> for CustomerRow {
    fn from(row: CustomerDbRow) -> Self {
        CustomerRow {
            id: row.id,
            stripe_id: row.stripe_id,
            user_id: row.user_id,
            email: row.email,
            name: row.name,
            phone: row.phone,
            address: row.address,
            created_at: row.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, stripe_id, user_id, email, name, phone, address, created_at";

#[async_trait]
impl CustomerStore for PostgresCustomerStore {
    async fn find_by_stripe_id(
        &self,
        stripe_id: &str,
    ) -> Result<Option<CustomerRow>, StoreError> {
        let row: Option<CustomerDbRow> = sqlx::query_as(&format!(
            "SELECT {} FROM customers WHERE stripe_id = $1",
            SELECT_COLUMNS
        ))
        .bind(stripe_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Failed to find customer: {}", e)))?;

        Ok(row.map(CustomerRow::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<CustomerRow>, StoreError> {
        let row: Option<CustomerDbRow> = sqlx::query_as(&format!(
            "SELECT {} FROM customers WHERE email = $1 ORDER BY created_at LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Failed to find customer by email: {}", e)))?;

        Ok(row.map(CustomerRow::from))
    }

    async fn upsert(&self, record: CustomerRecord) -> Result<CustomerRow, StoreError> {
        let row: CustomerDbRow = sqlx::query_as(
            r#"
            INSERT INTO customers (id, stripe_id, user_id, email, name, phone, address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (stripe_id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                email = EXCLUDED.email,
                name = EXCLUDED.name,
                phone = EXCLUDED.phone,
                address = EXCLUDED.address,
                created_at = EXCLUDED.created_at
            RETURNING id, stripe_id, user_id, email, name, phone, address, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.stripe_id)
        .bind(record.user_id)
        .bind(&record.email)
        .bind(&record.name)
        .bind(&record.phone)
        .bind(&record.address)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::UpsertFailed(format!("Failed to upsert customer: {}", e)))?;

        Ok(row.into())
    }
}
