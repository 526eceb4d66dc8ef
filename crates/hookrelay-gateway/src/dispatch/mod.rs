//! Dispatcher module exports.
//!
//! Re-exports the dispatcher and its collaborator traits so downstream
//! consumers can plug in their own contact resolution and transport.

pub mod dispatcher;
pub mod log_transport;

pub use dispatcher::{Contact, ContactResolver, Delivery, DirectResolver, Dispatcher, MessageTransport};
pub use log_transport::LogTransport;
