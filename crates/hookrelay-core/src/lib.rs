//! hookrelay core: transport-agnostic rule model, matching, rendering, and
//! error types.
//!
//! This crate defines the routing rules, the message renderer, token
//! verification, and the error surface shared by the gateway and tests. It
//! carries no HTTP or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed patterns and payloads degrade to "no match" or a fallback
//! summary instead of failing a request.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod auth;
pub mod error;
pub mod model;
pub mod render;
pub mod routing;
pub mod text;

/// Shared result type.
pub use error::{ClientCode, HookError, Result};
pub use model::{MatchType, MatchedRule, Rule, RuleMatch, SendResult, Target, TargetType};
