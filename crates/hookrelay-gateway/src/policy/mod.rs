//! Policy layer (intake switch, IP allowlist, rate limiting, token auth).
//!
//! Every gate here runs before the request body is read, so rejected
//! callers cost no more than a header inspection.

pub mod allowlist;
pub mod engine;
pub mod rate_limit;

pub use engine::{Caller, PolicyEngine};
pub use rate_limit::{spawn_sweeper, RateLimiter};
