//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum webhook endpoints
//! - `postgres` - PostgreSQL store implementations

pub mod http;
pub mod postgres;
