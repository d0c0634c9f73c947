//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Store Ports
//!
//! - `CustomerStore`, `PlanStore`, `ProductStore`, `SubscriptionStore`,
//!   `InvoiceStore` - per-table reference resolution and idempotent upserts

mod billing_store;

pub use billing_store::{
    CustomerRecord, CustomerRow, CustomerStore, InvoiceRecord, InvoiceRow, InvoiceStore,
    PlanRecord, PlanRow, PlanStore, ProductRecord, ProductRow, ProductStore, StoreError,
    SubscriptionRecord, SubscriptionRow, SubscriptionStore,
};
