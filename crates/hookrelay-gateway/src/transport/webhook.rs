//! Webhook push handler.
//!
//! Every response carries a fresh request id. Gate failures echo their code
//! and message; anything else is logged with the request id and answered
//! with a generic 500, including a panic inside the pipeline.

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;

use axum::{
    body::Body,
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::json;
use tracing::Instrument;
use uuid::Uuid;

use hookrelay_core::error::{ClientCode, HookError};
use hookrelay_core::text::truncate;

use crate::app_state::AppState;
use crate::dispatch::dispatcher::panic_message;
use crate::pipeline::{WebhookOutcome, WebhookRequest};

/// Longest cause written to the log for an internal failure.
const MAX_LOGGED_CAUSE_CHARS: usize = 200;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushResponse<'a> {
    request_id: &'a str,
    #[serde(flatten)]
    outcome: WebhookOutcome,
}

pub async fn webhook_push(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("webhook", request_id = %request_id);

    // A malformed query string is treated as an empty one.
    let query = Query::<Vec<(String, String)>>::try_from_uri(&uri)
        .map(|Query(q)| q)
        .unwrap_or_default();

    let req = WebhookRequest {
        client_addr: peer.map(|ConnectInfo(addr)| addr.ip().to_string()),
        headers,
        query,
        body,
    };

    let pipeline = state.pipeline();
    let outcome = AssertUnwindSafe(async move { pipeline.run(req).await })
        .catch_unwind()
        .instrument(span.clone())
        .await
        .unwrap_or_else(|panic| Err(HookError::Internal(panic_message(panic.as_ref()))));

    span.in_scope(|| match outcome {
        Ok(outcome) => {
            tracing::info!(
                route_key = %outcome.route_key,
                sent = outcome.results.iter().filter(|r| r.success).count(),
                failed = outcome.results.iter().filter(|r| !r.success).count(),
                "webhook handled"
            );
            Json(PushResponse { request_id: &request_id, outcome }).into_response()
        }
        Err(e) => error_response(&request_id, &e),
    })
}

/// JSON error response for `err`. Internal causes are logged, never echoed.
pub fn error_response(request_id: &str, err: &HookError) -> Response {
    let code = err.client_code();
    let message = if err.is_gate() {
        tracing::info!(request_id, code = code.as_str(), "request rejected");
        err.to_string()
    } else {
        tracing::error!(
            request_id,
            error = %truncate(&err.to_string(), MAX_LOGGED_CAUSE_CHARS),
            "request failed"
        );
        "internal error".to_string()
    };

    let body = json!({
        "requestId": request_id,
        "error": { "code": code.as_str(), "message": message },
    });
    (status_for(code), Json(body)).into_response()
}

pub fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::PluginDisabled | ClientCode::IpNotAllowed => StatusCode::FORBIDDEN,
        ClientCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ClientCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ClientCode::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ClientCode::InvalidJson | ClientCode::ReadBodyFailed | ClientCode::RouteKeyRequired => {
            StatusCode::BAD_REQUEST
        }
        ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_codes_map_to_statuses() {
        assert_eq!(status_for(HookError::PluginDisabled.client_code()), StatusCode::FORBIDDEN);
        assert_eq!(status_for(HookError::IpNotAllowed.client_code()), StatusCode::FORBIDDEN);
        assert_eq!(status_for(HookError::RateLimited.client_code()), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status_for(HookError::Unauthorized.client_code()), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(HookError::BodyTooLarge.client_code()), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(status_for(HookError::RouteKeyRequired.client_code()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(HookError::Config("x".into()).client_code()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
