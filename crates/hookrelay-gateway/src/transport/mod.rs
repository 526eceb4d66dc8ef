//! HTTP transport for webhook intake.
//!
//! - `body`: bounded body reader
//! - `extract`: token and route-key lookup
//! - `webhook`: the push handler and error responses

pub mod body;
pub mod extract;
pub mod webhook;
