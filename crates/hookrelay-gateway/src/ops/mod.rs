//! Operational HTTP endpoints.
//!
//! - `/api/webhook-push/health`: liveness plus a config digest

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use hookrelay_core::auth::verify_token;
use hookrelay_core::error::HookError;

use crate::app_state::AppState;
use crate::transport::webhook::error_response;

/// Decides whether a caller may read the health endpoint.
#[async_trait]
pub trait HealthGuard: Send + Sync {
    async fn authorize(&self, headers: &HeaderMap) -> bool;
}

/// Accepts `Authorization: Bearer <token>` matching a fixed token.
pub struct BearerGuard {
    token: String,
}

impl BearerGuard {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl HealthGuard for BearerGuard {
    async fn authorize(&self, headers: &HeaderMap) -> bool {
        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);
        verify_token(presented, &self.token)
    }
}

pub async fn health(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let cfg = match state.config().get_config().await {
        Ok(cfg) => cfg,
        Err(e) => return error_response(&request_id, &e),
    };

    if cfg.debug.require_auth {
        if let Some(guard) = state.health_guard() {
            if !guard.authorize(&headers).await {
                return error_response(&request_id, &HookError::Unauthorized);
            }
        }
    }

    Json(json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
        "enabled": cfg.enabled,
        "rules": cfg.rules.len(),
    }))
    .into_response()
}
