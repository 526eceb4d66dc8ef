use std::sync::Arc;

use hookrelay_core::auth::verify_token;
use hookrelay_core::error::{HookError, Result};

use crate::config::WebhookConfig;

use super::allowlist::{is_ip_allowed, normalize_ip};
use super::rate_limit::{RateLimiter, UNKNOWN_CLIENT};

/// Caller facts the admission gates look at.
#[derive(Debug, Clone, Copy, Default)]
pub struct Caller<'a> {
    /// Peer address as reported by the transport, before normalization.
    pub addr: Option<&'a str>,
    /// Token presented at the configured header or query field.
    pub token: Option<&'a str>,
}

/// Admission gates run before the body is read.
/// Construct once at startup, then share via Arc.
#[derive(Debug, Default)]
pub struct PolicyEngine {
    limiter: Arc<RateLimiter>,
}

impl PolicyEngine {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Intake switch, allowlist, rate limit, then token, in that order. The
    /// first failing gate decides the error.
    pub fn admit(&self, cfg: &WebhookConfig, caller: Caller<'_>) -> Result<()> {
        if !cfg.enabled {
            return Err(HookError::PluginDisabled);
        }

        let addr = caller.addr.filter(|a| !a.is_empty()).map(normalize_ip);
        if !is_ip_allowed(&cfg.ip_allowlist, addr.as_deref()) {
            return Err(HookError::IpNotAllowed);
        }

        let identity = addr.as_deref().unwrap_or(UNKNOWN_CLIENT);
        if !self.limiter.check(identity, &cfg.rate_limit) {
            return Err(HookError::RateLimited);
        }

        if cfg.auth.enabled && !verify_token(caller.token, &cfg.auth.token) {
            return Err(HookError::Unauthorized);
        }

        Ok(())
    }
}
