//! Integration tests for the webhook HTTP surface.
//!
//! Drives the axum router end to end with in-memory stores: signed request
//! in, JSON acknowledgement out, store state inspected afterwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::util::ServiceExt;
use uuid::Uuid;

use billsync::adapters::http::webhooks::{webhook_router, AckResponse, WebhookAppState};
use billsync::domain::billing::{sign_payload, WebhookVerifier};
use billsync::ports::{
    CustomerRecord, CustomerRow, CustomerStore, InvoiceRecord, InvoiceRow, InvoiceStore,
    PlanRecord, PlanRow, PlanStore, ProductRecord, ProductRow, ProductStore, StoreError,
    SubscriptionRecord, SubscriptionRow, SubscriptionStore,
};

const SECRET: &str = "whsec_integration_secret";

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Counts every store access so tests can assert the store was never touched.
#[derive(Default)]
struct StoreCalls(AtomicU32);

impl StoreCalls {
    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn count(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

struct MockPlanStore {
    rows: Mutex<HashMap<String, PlanRow>>,
    calls: Arc<StoreCalls>,
}

impl MockPlanStore {
    fn new(calls: Arc<StoreCalls>) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            calls,
        }
    }

    fn seed(&self, stripe_id: &str) -> PlanRow {
        let row = PlanRow {
            id: Uuid::new_v4(),
            stripe_id: stripe_id.to_string(),
            active: true,
            amount: 990,
            amount_decimal: "990".to_string(),
            currency: "usd".to_string(),
            interval: "month".to_string(),
            interval_count: 1,
            created_at: None,
        };
        self.rows
            .lock()
            .unwrap()
            .insert(stripe_id.to_string(), row.clone());
        row
    }

    fn get(&self, stripe_id: &str) -> Option<PlanRow> {
        self.rows.lock().unwrap().get(stripe_id).cloned()
    }

    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl PlanStore for MockPlanStore {
    async fn find_by_stripe_id(&self, stripe_id: &str) -> Result<Option<PlanRow>, StoreError> {
        self.calls.bump();
        Ok(self.get(stripe_id))
    }

    async fn upsert(&self, record: PlanRecord) -> Result<PlanRow, StoreError> {
        self.calls.bump();
        let mut rows = self.rows.lock().unwrap();
        let id = rows
            .get(&record.stripe_id)
            .map(|r| r.id)
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

struct MockProductStore {
    rows: Mutex<HashMap<String, ProductRow>>,
    calls: Arc<StoreCalls>,
}

impl MockProductStore {
    fn new(calls: Arc<StoreCalls>) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            calls,
        }
    }

    fn seed(&self, stripe_id: &str) -> ProductRow {
        let row = ProductRow {
            id: Uuid::new_v4(),
            stripe_id: stripe_id.to_string(),
            plan_id: Uuid::new_v4(),
            name: "Pro".to_string(),
            active: true,
            created_at: None,
        };
        self.rows
            .lock()
            .unwrap()
            .insert(stripe_id.to_string(), row.clone());
        row
    }

    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ProductStore for MockProductStore {
    async fn find_by_stripe_id(&self, stripe_id: &str) -> Result<Option<ProductRow>, StoreError> {
        self.calls.bump();
        Ok(self.rows.lock().unwrap().get(stripe_id).cloned())
    }

    async fn upsert(&self, record: ProductRecord) -> Result<ProductRow, StoreError> {
        self.calls.bump();
        let mut rows = self.rows.lock().unwrap();
        let id = rows
            .get(&record.stripe_id)
            .map(|r| r.id)
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

struct MockCustomerStore {
    rows: Mutex<HashMap<String, CustomerRow>>,
    calls: Arc<StoreCalls>,
}

impl MockCustomerStore {
    fn new(calls: Arc<StoreCalls>) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            calls,
        }
    }

    fn seed(&self, stripe_id: &str, email: Option<&str>) -> CustomerRow {
        let row = CustomerRow {
            id: Uuid::new_v4(),
            stripe_id: stripe_id.to_string(),
            user_id: None,
            email: email.map(str::to_owned),
            name: None,
            phone: None,
            address: None,
            created_at: None,
        };
        self.rows
            .lock()
            .unwrap()
            .insert(stripe_id.to_string(), row.clone());
        row
    }

    fn get(&self, stripe_id: &str) -> Option<CustomerRow> {
        self.rows.lock().unwrap().get(stripe_id).cloned()
    }

    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl CustomerStore for MockCustomerStore {
    async fn find_by_stripe_id(
        &self,
        stripe_id: &str,
    ) -> Result<Option<CustomerRow>, StoreError> {
        self.calls.bump();
        Ok(self.get(stripe_id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<CustomerRow>, StoreError> {
        self.calls.bump();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|row| row.email.as_deref() == Some(email))
            .cloned())
    }

    async fn upsert(&self, record: CustomerRecord) -> Result<CustomerRow, StoreError> {
        self.calls.bump();
        let mut rows = self.rows.lock().unwrap();
        let id = rows
            .get(&record.stripe_id)
            .map(|r| r.id)
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

struct MockSubscriptionStore {
    rows: Mutex<HashMap<String, SubscriptionRow>>,
    calls: Arc<StoreCalls>,
}

impl MockSubscriptionStore {
    fn new(calls: Arc<StoreCalls>) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            calls,
        }
    }

    fn get(&self, stripe_id: &str) -> Option<SubscriptionRow> {
        self.rows.lock().unwrap().get(stripe_id).cloned()
    }

    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SubscriptionStore for MockSubscriptionStore {
    async fn upsert(&self, record: SubscriptionRecord) -> Result<SubscriptionRow, StoreError> {
        self.calls.bump();
        let mut rows = self.rows.lock().unwrap();
        let id = rows
            .get(&record.stripe_id)
            .map(|r| r.id)
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

struct MockInvoiceStore {
    rows: Mutex<HashMap<String, InvoiceRow>>,
    calls: Arc<StoreCalls>,
}

impl MockInvoiceStore {
    fn new(calls: Arc<StoreCalls>) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            calls,
        }
    }

    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl InvoiceStore for MockInvoiceStore {
    async fn upsert(&self, record: InvoiceRecord) -> Result<InvoiceRow, StoreError> {
        self.calls.bump();
        let mut rows = self.rows.lock().unwrap();
        let id = rows
            .get(&record.stripe_id)
            .map(|r| r.id)
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

struct TestEnv {
    app: Router,
    calls: Arc<StoreCalls>,
    customers: Arc<MockCustomerStore>,
    plans: Arc<MockPlanStore>,
    products: Arc<MockProductStore>,
    subscriptions: Arc<MockSubscriptionStore>,
    invoices: Arc<MockInvoiceStore>,
}

fn test_env() -> TestEnv {
    let calls = Arc::new(StoreCalls::default());
    let customers = Arc::new(MockCustomerStore::new(calls.clone()));
    let plans = Arc::new(MockPlanStore::new(calls.clone()));
    let products = Arc::new(MockProductStore::new(calls.clone()));
    let subscriptions = Arc::new(MockSubscriptionStore::new(calls.clone()));
    let invoices = Arc::new(MockInvoiceStore::new(calls.clone()));

    let state = WebhookAppState {
        verifier: Arc::new(WebhookVerifier::new(SECRET)),
        customers: customers.clone(),
        plans: plans.clone(),
        products: products.clone(),
        subscriptions: subscriptions.clone(),
        invoices: invoices.clone(),
    };

    TestEnv {
        app: webhook_router().with_state(state),
        calls,
        customers,
        plans,
        products,
        subscriptions,
        invoices,
    }
}

fn envelope(event_type: &str, object: serde_json::Value) -> String {
    json!({
        "id": format!("evt_{}", event_type.replace('.', "_")),
        "type": event_type,
        "created": chrono::Utc::now().timestamp(),
        "data": { "object": object },
        "livemode": false,
        "api_version": "2025-03-31"
    })
    .to_string()
}

fn signed_request(uri: &str, body: String) -> Request<Body> {
    let timestamp = chrono::Utc::now().timestamp();
    let signature = format!(
        "t={},v1={}",
        timestamp,
        sign_payload(SECRET, timestamp, &body)
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Stripe-Signature", signature)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn ack_body(response: axum::response::Response) -> AckResponse {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn plan_object(id: &str, amount: i64) -> serde_json::Value {
    json!({
        "id": id,
        "active": true,
        "amount": amount,
        "amount_decimal": amount.to_string(),
        "currency": "usd",
        "interval": "month",
        "interval_count": 1,
        "created": 1_700_000_000
    })
}

fn subscription_object(id: &str, customer: &str, plan: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "customer": customer,
        "status": status,
        "billing_cycle_anchor": 1_700_000_000,
        "cancel_at": null,
        "canceled_at": null,
        "cancel_at_period_end": false,
        "created": 1_700_000_000,
        "quantity": 1,
        "items": {
            "data": [{
                "current_period_start": 1_700_000_000,
                "current_period_end": 1_702_592_000,
                "plan": { "id": plan }
            }]
        }
    })
}

fn invoice_object(id: &str, customer: &str, product: &str) -> serde_json::Value {
    json!({
        "id": id,
        "customer": customer,
        "customer_email": "jo@example.com",
        "customer_name": "Jo",
        "status": "paid",
        "amount_due": 990,
        "amount_paid": 990,
        "amount_remaining": 0,
        "currency": "usd",
        "period_start": 1_700_000_000,
        "period_end": 1_702_592_000,
        "created": 1_700_000_000,
        "lines": {
            "data": [{
                "quantity": 1,
                "price": { "id": "price_1", "product": product }
            }]
        }
    })
}

// =============================================================================
// Idempotence
// =============================================================================

#[tokio::test]
async fn repeated_plan_event_yields_one_row_with_last_values() {
    let env = test_env();

    for amount in [990, 990, 1490] {
        let body = envelope("plan.created", plan_object("price_1", amount));
        let response = env
            .app
            .clone()
            .oneshot(signed_request("/webhooks/plans", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(env.plans.len(), 1);
    assert_eq!(env.plans.get("price_1").unwrap().amount, 1490);
}

// =============================================================================
// Signature gate
// =============================================================================

#[tokio::test]
async fn missing_signature_is_rejected_before_the_store() {
    let env = test_env();
    let body = envelope("plan.created", plan_object("price_1", 990));
    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/plans")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = env.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let ack = ack_body(response).await;
    assert!(!ack.ok);
    assert_eq!(env.calls.count(), 0);
}

#[tokio::test]
async fn invalid_signature_is_rejected_before_the_store() {
    let env = test_env();
    let body = envelope("plan.created", plan_object("price_1", 990));
    let forged = format!("t={},v1={}", chrono::Utc::now().timestamp(), "a".repeat(64));
    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/plans")
        .header("Stripe-Signature", forged)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = env.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let ack = ack_body(response).await;
    assert!(!ack.ok);
    assert_eq!(env.calls.count(), 0);
    assert_eq!(env.plans.len(), 0);
}

// =============================================================================
// Reference policies
// =============================================================================

#[tokio::test]
async fn invoice_with_unknown_product_is_rejected_with_404() {
    let env = test_env();
    env.customers.seed("cus_1", Some("jo@example.com"));
    let body = envelope("invoice.created", invoice_object("in_1", "cus_1", "prod_ghost"));

    let response = env
        .app
        .clone()
        .oneshot(signed_request("/webhooks/invoices", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let ack = ack_body(response).await;
    assert!(!ack.ok);
    assert_eq!(env.invoices.len(), 0);
}

#[tokio::test]
async fn subscription_with_unknown_plan_is_accepted_without_a_write() {
    let env = test_env();
    env.customers.seed("cus_1", Some("jo@example.com"));
    let body = envelope(
        "customer.subscription.created",
        subscription_object("sub_1", "cus_1", "price_ghost", "active"),
    );

    let response = env
        .app
        .clone()
        .oneshot(signed_request("/webhooks/subscriptions", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let ack = ack_body(response).await;
    assert!(ack.ok);
    assert_eq!(env.subscriptions.len(), 0);
}

#[tokio::test]
async fn invoice_creates_customer_on_first_sight() {
    let env = test_env();
    env.products.seed("prod_1");
    let body = envelope("invoice.created", invoice_object("in_1", "cus_new", "prod_1"));

    let response = env
        .app
        .clone()
        .oneshot(signed_request("/webhooks/invoices", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(env.invoices.len(), 1);
    let customer = env.customers.get("cus_new").unwrap();
    assert_eq!(customer.email.as_deref(), Some("jo@example.com"));
}

// =============================================================================
// Unknown event kinds
// =============================================================================

#[tokio::test]
async fn unknown_event_kind_returns_200_and_writes_nothing() {
    let env = test_env();
    let body = envelope("something.unhandled", json!({}));

    let response = env
        .app
        .clone()
        .oneshot(signed_request("/webhooks/plans", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let ack = ack_body(response).await;
    assert!(ack.ok);
    assert_eq!(env.calls.count(), 0);
}

#[tokio::test]
async fn kind_from_another_family_is_acknowledged_without_processing() {
    // A subscription event posted to the plans surface is out of family
    let env = test_env();
    let body = envelope(
        "customer.subscription.created",
        subscription_object("sub_1", "cus_1", "price_1", "active"),
    );

    let response = env
        .app
        .clone()
        .oneshot(signed_request("/webhooks/plans", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(env.subscriptions.len(), 0);
}

// =============================================================================
// Out-of-order delivery
// =============================================================================

#[tokio::test]
async fn updated_before_created_converges_to_one_row() {
    let env = test_env();
    env.plans.seed("price_1");
    env.customers.seed("cus_1", Some("jo@example.com"));

    let updated = envelope(
        "customer.subscription.updated",
        subscription_object("sub_1", "cus_1", "price_1", "past_due"),
    );
    let created = envelope(
        "customer.subscription.created",
        subscription_object("sub_1", "cus_1", "price_1", "active"),
    );

    for body in [updated, created] {
        let response = env
            .app
            .clone()
            .oneshot(signed_request("/webhooks/subscriptions", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(env.subscriptions.len(), 1);
    assert_eq!(env.subscriptions.get("sub_1").unwrap().status, "active");
}

#[tokio::test]
async fn deleted_event_updates_status_in_place() {
    let env = test_env();
    env.plans.seed("price_1");
    env.customers.seed("cus_1", Some("jo@example.com"));

    let created = envelope(
        "customer.subscription.created",
        subscription_object("sub_1", "cus_1", "price_1", "active"),
    );
    let deleted = envelope(
        "customer.subscription.deleted",
        subscription_object("sub_1", "cus_1", "price_1", "canceled"),
    );

    for body in [created, deleted] {
        env.app
            .clone()
            .oneshot(signed_request("/webhooks/subscriptions", body))
            .await
            .unwrap();
    }

    assert_eq!(env.subscriptions.len(), 1);
    assert_eq!(env.subscriptions.get("sub_1").unwrap().status, "canceled");
}

// =============================================================================
// Method and body handling
// =============================================================================

#[tokio::test]
async fn non_post_method_gets_405() {
    let env = test_env();
    let request = Request::builder()
        .method("GET")
        .uri("/webhooks/plans")
        .body(Body::empty())
        .unwrap();

    let response = env.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn malformed_payload_is_rejected_with_400() {
    // Signed correctly but the plan object is missing required fields
    let env = test_env();
    let body = envelope("plan.created", json!({ "id": "price_1" }));

    let response = env
        .app
        .clone()
        .oneshot(signed_request("/webhooks/plans", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let ack = ack_body(response).await;
    assert!(!ack.ok);
    assert!(ack.message.contains("amount") || ack.message.contains("active"));
    assert_eq!(env.plans.len(), 0);
}

#[tokio::test]
async fn product_follows_plan_through_both_surfaces() {
    let env = test_env();

    let plan = envelope("plan.created", plan_object("price_1", 990));
    env.app
        .clone()
        .oneshot(signed_request("/webhooks/plans", plan))
        .await
        .unwrap();

    let product = envelope(
        "product.created",
        json!({
            "id": "prod_1",
            "default_price": "price_1",
            "name": "Pro",
            "active": true,
            "created": 1_700_000_000
        }),
    );
    let response = env
        .app
        .clone()
        .oneshot(signed_request("/webhooks/plans", product))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(env.products.len(), 1);
}
