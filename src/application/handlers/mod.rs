//! Application handlers.
//!
//! Event-family handlers that orchestrate webhook ingestion against the
//! store ports.

pub mod billing;
