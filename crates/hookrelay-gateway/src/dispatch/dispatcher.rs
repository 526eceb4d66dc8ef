use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;

use hookrelay_core::error::{HookError, Result};
use hookrelay_core::text::truncate;
use hookrelay_core::{Rule, SendResult, Target, TargetType};

/// Longest error description kept in a [`SendResult`].
const MAX_ERROR_CHARS: usize = 200;

/// Transport-level address for a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub peer: String,
    pub scene: TargetType,
}

/// Turns a configured target into a transport contact.
pub trait ContactResolver: Send + Sync {
    fn resolve(&self, target: &Target) -> Contact;
}

/// Delivers a rendered message. Implementations report failure as an error;
/// the dispatcher never lets one propagate past the target it belongs to.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send(&self, self_id: &str, contact: &Contact, message: &str) -> Result<()>;
}

/// Maps friend/group targets one-to-one onto contacts.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectResolver;

impl ContactResolver for DirectResolver {
    fn resolve(&self, target: &Target) -> Contact {
        Contact { peer: target.id.clone(), scene: target.target_type }
    }
}

/// Per-request delivery settings.
#[derive(Debug, Clone, Copy)]
pub struct Delivery<'a> {
    pub self_id: &'a str,
    pub timeout: Duration,
}

/// Fans one message out to every target of a rule.
#[derive(Clone)]
pub struct Dispatcher {
    resolver: Arc<dyn ContactResolver>,
    transport: Arc<dyn MessageTransport>,
}

impl Dispatcher {
    pub fn new(resolver: Arc<dyn ContactResolver>, transport: Arc<dyn MessageTransport>) -> Self {
        Self { resolver, transport }
    }

    /// One result per target, in target order. Targets are sent one after
    /// another; a failed, panicked or timed-out send is recorded and the next
    /// target is still attempted.
    pub async fn dispatch(&self, delivery: &Delivery<'_>, message: &str, rule: &Rule) -> Vec<SendResult> {
        let mut results = Vec::with_capacity(rule.targets.len());

        for target in &rule.targets {
            let contact = self.resolver.resolve(target);
            let send = AssertUnwindSafe(self.transport.send(delivery.self_id, &contact, message))
                .catch_unwind();
            let sent = match tokio::time::timeout(delivery.timeout, send).await {
                Ok(Ok(sent)) => sent,
                Ok(Err(panic)) => Err(HookError::Delivery(panic_message(panic.as_ref()))),
                Err(_) => Err(HookError::Delivery(format!(
                    "timed out after {} ms",
                    delivery.timeout.as_millis()
                ))),
            };

            match sent {
                Ok(()) => results.push(SendResult::ok(&rule.id, target)),
                Err(e) => {
                    let error = truncate(&describe(&e), MAX_ERROR_CHARS);
                    tracing::warn!(rule_id = %rule.id, %target, %error, "delivery failed");
                    results.push(SendResult::failed(&rule.id, target, error));
                }
            }
        }
        results
    }
}

/// Readable text for a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    let msg = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic");
    format!("panic: {msg}")
}

fn describe(e: &HookError) -> String {
    match e {
        HookError::Delivery(msg) => msg.clone(),
        other => other.to_string(),
    }
}
