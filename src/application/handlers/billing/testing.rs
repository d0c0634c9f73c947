//! In-memory store implementations shared by the handler unit tests.
//!
//! Upserts mirror the store contract: keyed on `stripe_id`, the internal row
//! id survives a conflict and supplied fields overwrite stored ones.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::ports::{
    CustomerRecord, CustomerRow, CustomerStore, InvoiceRecord, InvoiceRow, InvoiceStore,
    PlanRecord, PlanRow, PlanStore, ProductRecord, ProductRow, ProductStore, StoreError,
    SubscriptionRecord, SubscriptionRow, SubscriptionStore,
};

pub fn seeded_plan(stripe_id: &str) -> PlanRow {
    PlanRow {
        id: Uuid::new_v4(),
        stripe_id: stripe_id.to_string(),
        active: true,
        amount: 990,
        amount_decimal: "990".to_string(),
        currency: "usd".to_string(),
        interval: "month".to_string(),
        interval_count: 1,
        created_at: None,
    }
}

pub fn seeded_product(stripe_id: &str) -> ProductRow {
    ProductRow {
        id: Uuid::new_v4(),
        stripe_id: stripe_id.to_string(),
        plan_id: Uuid::new_v4(),
        name: "Pro".to_string(),
        active: true,
        created_at: None,
    }
}

pub fn seeded_customer(stripe_id: &str, email: Option<&str>) -> CustomerRow {
    CustomerRow {
        id: Uuid::new_v4(),
        stripe_id: stripe_id.to_string(),
        user_id: None,
        email: email.map(str::to_owned),
        name: None,
        phone: None,
        address: None,
        created_at: None,
    }
}

pub struct InMemoryPlanStore {
    rows: Mutex<HashMap<String, PlanRow>>,
}

impl InMemoryPlanStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }

    pub fn seed(&self, row: PlanRow) {
        self.rows.lock().unwrap().insert(row.stripe_id.clone(), row);
    }

    pub fn get(&self, stripe_id: &str) -> Option<PlanRow> {
        self.rows.lock().unwrap().get(stripe_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn find_by_stripe_id(&self, stripe_id: &str) -> Result<Option<PlanRow>, StoreError> {
        Ok(self.get(stripe_id))
    }

    async fn upsert(&self, record: PlanRecord) -> Result<PlanRow, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows
            .get(&record.stripe_id)
            .map(|existing| existing.id)
            .unwrap_or_else(Uuid::new_v4);
        let row = PlanRow {
            id,
            stripe_id: record.stripe_id.clone(),
            active: record.active,
            amount: record.amount,
            amount_decimal: record.amount_decimal,
            currency: record.currency,
            interval: record.interval,
            interval_count: record.interval_count,
            created_at: record.created_at,
        };
        rows.insert(record.stripe_id, row.clone());
        Ok(row)
    }
}

pub struct InMemoryProductStore {
    rows: Mutex<HashMap<String, ProductRow>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }

    pub fn seed(&self, row: ProductRow) {
        self.rows.lock().unwrap().insert(row.stripe_id.clone(), row);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn find_by_stripe_id(&self, stripe_id: &str) -> Result<Option<ProductRow>, StoreError> {
        Ok(self.rows.lock().unwrap().get(stripe_id).cloned())
    }

    async fn upsert(&self, record: ProductRecord) -> Result<ProductRow, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows
            .get(&record.stripe_id)
            .map(|existing| existing.id)
            .unwrap_or_else(Uuid::new_v4);
        let row = ProductRow {
            id,
            stripe_id: record.stripe_id.clone(),
            plan_id: record.plan_id,
            name: record.name,
            active: record.active,
            created_at: record.created_at,
        };
        rows.insert(record.stripe_id, row.clone());
        Ok(row)
    }
}

pub struct InMemoryCustomerStore {
    rows: Mutex<HashMap<String, CustomerRow>>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }

    pub fn seed(&self, row: CustomerRow) {
        self.rows.lock().unwrap().insert(row.stripe_id.clone(), row);
    }

    pub fn get(&self, stripe_id: &str) -> Option<CustomerRow> {
        self.rows.lock().unwrap().get(stripe_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn find_by_stripe_id(
        &self,
        stripe_id: &str,
    ) -> Result<Option<CustomerRow>, StoreError> {
        Ok(self.get(stripe_id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<CustomerRow>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|row| row.email.as_deref() == Some(email))
            .cloned())
    }

    async fn upsert(&self, record: CustomerRecord) -> Result<CustomerRow, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows
            .get(&record.stripe_id)
            .map(|existing| existing.id)
            .unwrap_or_else(Uuid::new_v4);
        let row = CustomerRow {
            id,
            stripe_id: record.stripe_id.clone(),
            user_id: record.user_id,
            email: record.email,
            name: record.name,
            phone: record.phone,
            address: record.address,
            created_at: record.created_at,
        };
        rows.insert(record.stripe_id, row.clone());
        Ok(row)
    }
}

pub struct InMemorySubscriptionStore {
    rows: Mutex<HashMap<String, SubscriptionRow>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, stripe_id: &str) -> Option<SubscriptionRow> {
        self.rows.lock().unwrap().get(stripe_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn upsert(&self, record: SubscriptionRecord) -> Result<SubscriptionRow, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows
            .get(&record.stripe_id)
            .map(|existing| existing.id)
            .unwrap_or_else(Uuid::new_v4);
        let row = SubscriptionRow {
            id,
            stripe_id: record.stripe_id.clone(),
            customer_id: record.customer_id,
            plan_id: record.plan_id,
            status: record.status,
            billing_cycle_anchor: record.billing_cycle_anchor,
            current_period_start: record.current_period_start,
            current_period_end: record.current_period_end,
            cancel_at: record.cancel_at,
            canceled_at: record.canceled_at,
            cancel_at_period_end: record.cancel_at_period_end,
            quantity: record.quantity,
            created_at: record.created_at,
        };
        rows.insert(record.stripe_id, row.clone());
        Ok(row)
    }
}

pub struct InMemoryInvoiceStore {
    rows: Mutex<HashMap<String, InvoiceRow>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn upsert(&self, record: InvoiceRecord) -> Result<InvoiceRow, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows
            .get(&record.stripe_id)
            .map(|existing| existing.id)
            .unwrap_or_else(Uuid::new_v4);
        let row = InvoiceRow {
            id,
            stripe_id: record.stripe_id.clone(),
            product_id: record.product_id,
            customer_id: record.customer_id,
            status: record.status,
            amount_due: record.amount_due,
            amount_paid: record.amount_paid,
            amount_remaining: record.amount_remaining,
            currency: record.currency,
            period_start: record.period_start,
            period_end: record.period_end,
            quantity: record.quantity,
            created_at: record.created_at,
        };
        rows.insert(record.stripe_id, row.clone());
        Ok(row)
    }
}
