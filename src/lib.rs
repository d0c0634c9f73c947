//! Billsync - Stripe webhook receivers for billing state synchronization.
//!
//! This crate receives signed webhook events from the payment platform and
//! idempotently persists customers, plans, products, subscriptions and
//! invoices into PostgreSQL.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
