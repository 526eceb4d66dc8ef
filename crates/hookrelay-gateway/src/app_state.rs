//! Shared application state for the hookrelay gateway.
//!
//! Built once at startup; handlers clone it cheaply. The rate limiter lives
//! inside the pipeline's policy engine and is the only per-client state.

use std::sync::Arc;

use hookrelay_core::render::{Renderer, SummarizerRegistry};

use crate::config::ConfigProvider;
use crate::dispatch::{ContactResolver, Dispatcher, MessageTransport};
use crate::ops::HealthGuard;
use crate::pipeline::Pipeline;
use crate::policy::{PolicyEngine, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    config: Arc<dyn ConfigProvider>,
    health_guard: Option<Arc<dyn HealthGuard>>,
}

impl AppState {
    /// State with the built-in payload summarizers.
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        resolver: Arc<dyn ContactResolver>,
        transport: Arc<dyn MessageTransport>,
    ) -> Self {
        Self::with_summarizers(config, SummarizerRegistry::with_builtin(), resolver, transport)
    }

    pub fn with_summarizers(
        config: Arc<dyn ConfigProvider>,
        summarizers: SummarizerRegistry,
        resolver: Arc<dyn ContactResolver>,
        transport: Arc<dyn MessageTransport>,
    ) -> Self {
        let pipeline = Pipeline::new(
            Arc::clone(&config),
            PolicyEngine::new(Arc::new(RateLimiter::new())),
            Renderer::new(summarizers),
            Dispatcher::new(resolver, transport),
        );
        Self { pipeline: Arc::new(pipeline), config, health_guard: None }
    }

    pub fn with_health_guard(mut self, guard: Arc<dyn HealthGuard>) -> Self {
        self.health_guard = Some(guard);
        self
    }

    pub fn pipeline(&self) -> Arc<Pipeline> {
        Arc::clone(&self.pipeline)
    }

    pub fn config(&self) -> Arc<dyn ConfigProvider> {
        Arc::clone(&self.config)
    }

    pub fn health_guard(&self) -> Option<Arc<dyn HealthGuard>> {
        self.health_guard.clone()
    }

    pub fn limiter(&self) -> Arc<RateLimiter> {
        self.pipeline.policy().limiter()
    }
}
