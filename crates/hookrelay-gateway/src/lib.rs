//! hookrelay gateway library entry.
//!
//! This crate wires the HTTP transport, admission policy, rule matching,
//! rendering, and dispatch into a webhook relay. It is consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod ops;
pub mod pipeline;
pub mod policy;
pub mod router;
pub mod transport;
