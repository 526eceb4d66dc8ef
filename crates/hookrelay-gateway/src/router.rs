//! Axum router wiring.

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{app_state::AppState, ops, transport};

pub const WEBHOOK_PATH: &str = "/api/webhook-push";
pub const HEALTH_PATH: &str = "/api/webhook-push/health";

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(transport::webhook::webhook_push))
        .route(HEALTH_PATH, get(ops::health))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).into_inner())
        .with_state(state)
}
