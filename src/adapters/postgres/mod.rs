//! PostgreSQL adapters - Database implementations for the store ports.
//!
//! Every store keys its upsert on the table's `stripe_id` unique constraint,
//! so repeated deliveries of the same external id converge to one row.

mod customer_store;
mod invoice_store;
mod plan_store;
mod product_store;
mod subscription_store;

pub use customer_store::PostgresCustomerStore;
pub use invoice_store::PostgresInvoiceStore;
pub use plan_store::PostgresPlanStore;
pub use product_store::PostgresProductStore;
pub use subscription_store::PostgresSubscriptionStore;
