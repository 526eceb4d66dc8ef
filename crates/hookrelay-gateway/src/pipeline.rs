//! Per-request webhook pipeline.
//!
//! Gates run first, before any body byte is read. The config snapshot is
//! fetched once and used for the whole request.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::HeaderMap;
use serde::Serialize;

use hookrelay_core::error::Result;
use hookrelay_core::render::{RenderContext, Renderer};
use hookrelay_core::routing::match_rules;
use hookrelay_core::{MatchedRule, SendResult};

use crate::config::ConfigProvider;
use crate::dispatch::{Delivery, Dispatcher};
use crate::policy::{Caller, PolicyEngine};
use crate::transport::body::read_body;
use crate::transport::extract::{auth_token, extract_route_key, RequestView};

/// Transport-neutral inbound request.
#[derive(Debug)]
pub struct WebhookRequest {
    pub client_addr: Option<String>,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookOutcome {
    pub route_key: String,
    pub matched_rules: Vec<MatchedRule>,
    pub results: Vec<SendResult>,
}

pub struct Pipeline {
    config: Arc<dyn ConfigProvider>,
    policy: PolicyEngine,
    renderer: Renderer,
    dispatcher: Dispatcher,
}

impl Pipeline {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        policy: PolicyEngine,
        renderer: Renderer,
        dispatcher: Dispatcher,
    ) -> Self {
        Self { config, policy, renderer, dispatcher }
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    pub async fn run(&self, req: WebhookRequest) -> Result<WebhookOutcome> {
        let cfg = self.config.get_config().await?;

        let token = {
            let view = RequestView { headers: &req.headers, query: &req.query, body: None };
            auth_token(&view, &cfg.auth)
        };
        self.policy.admit(&cfg, Caller { addr: req.client_addr.as_deref(), token })?;

        let body = read_body(&req.headers, req.body, cfg.body_limit_bytes).await?;
        let payload = body.payload();
        let view = RequestView { headers: &req.headers, query: &req.query, body: Some(&payload) };
        let route_key = extract_route_key(&view, &cfg.route_key)?;

        let matched = match_rules(&route_key, &cfg.rules);
        tracing::info!(route_key = %route_key, matched = matched.len(), "rules matched");

        let body_text = body.body_text();
        let delivery = Delivery {
            self_id: &cfg.bot.self_id,
            timeout: Duration::from_millis(cfg.delivery.timeout_ms),
        };

        let mut results = Vec::new();
        for rule in &matched {
            let message = self.renderer.render(&RenderContext {
                route_key: &route_key,
                payload: &payload,
                body_text: &body_text,
                template: rule.template.as_deref(),
                max_chars: cfg.max_message_chars,
            });
            results.extend(self.dispatcher.dispatch(&delivery, &message, rule).await);
        }

        Ok(WebhookOutcome {
            route_key,
            matched_rules: matched.into_iter().map(MatchedRule::from).collect(),
            results,
        })
    }
}
