//! Per-client token-bucket limiter.
//!
//! One continuously refilled bucket per client identity. A bucket gains
//! `max` tokens per `window_ms`, capped at `max`; a fresh identity starts
//! full. Rejected attempts still store the refilled balance, so a client
//! polling under the limit keeps making progress toward its next token.
//!
//! Concurrency note: each check runs under the map shard lock for that
//! identity, which makes the read-modify-write atomic per identity while
//! unrelated identities mostly land on different shards.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::config::{ConfigProvider, RateLimitSection};

/// Identity used when the client address is unknown.
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn full(max: f64, now: Instant) -> Self {
        Self { tokens: max, last_refill: now }
    }

    fn try_take(&mut self, max: f64, window_ms: f64, now: Instant) -> bool {
        let elapsed_ms = now.saturating_duration_since(self.last_refill).as_secs_f64() * 1000.0;
        let tokens = (self.tokens + elapsed_ms / window_ms * max).min(max);
        self.last_refill = now;
        if tokens < 1.0 {
            self.tokens = tokens;
            return false;
        }
        self.tokens = tokens - 1.0;
        true
    }
}

#[derive(Debug, Default)]
pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self { buckets: DashMap::new() }
    }

    /// Admit or reject one request from `identity`.
    pub fn check(&self, identity: &str, cfg: &RateLimitSection) -> bool {
        self.check_at(identity, cfg, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock.
    pub fn check_at(&self, identity: &str, cfg: &RateLimitSection, now: Instant) -> bool {
        if !cfg.enabled {
            return true;
        }
        let max = f64::from(cfg.max.max(1));
        let window_ms = cfg.window_ms.max(1) as f64;

        let mut bucket = self
            .buckets
            .entry(identity.to_owned())
            .or_insert_with(|| Bucket::full(max, now));
        bucket.try_take(max, window_ms, now)
    }

    /// Drop buckets untouched for at least `idle_for`. With `idle_for` of one
    /// window, every dropped bucket had already refilled to capacity, so
    /// eviction never changes a later decision.
    pub fn sweep_idle(&self, now: Instant, idle_for: Duration) -> usize {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, b| now.saturating_duration_since(b.last_refill) < idle_for);
        before.saturating_sub(self.buckets.len())
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Periodically evict idle buckets. The interval and window are re-read
/// from config on every pass.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, config: Arc<dyn ConfigProvider>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = Duration::from_millis(RateLimitSection::default().sweep_interval_ms);
        loop {
            tokio::time::sleep(interval).await;

            let cfg = match config.get_config().await {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(error = %e, "rate limit sweep skipped");
                    continue;
                }
            };
            interval = Duration::from_millis(cfg.rate_limit.sweep_interval_ms.max(1));

            let window = Duration::from_millis(cfg.rate_limit.window_ms.max(1));
            let removed = limiter.sweep_idle(Instant::now(), window);
            if removed > 0 {
                tracing::debug!(removed, remaining = limiter.len(), "rate limit buckets swept");
            }
        }
    })
}
