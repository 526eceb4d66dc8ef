//! Top-level facade crate for hookrelay.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use hookrelay_core::*;
}

pub mod gateway {
    pub use hookrelay_gateway::*;
}
