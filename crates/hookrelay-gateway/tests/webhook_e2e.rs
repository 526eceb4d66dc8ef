#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use hookrelay_core::error::{HookError, Result};
use hookrelay_core::{Rule, RuleMatch, Target, TargetType};
use hookrelay_gateway::app_state::AppState;
use hookrelay_gateway::config::{
    AuthLocation, ConfigProvider, RouteKeyLocation, StaticConfig, WebhookConfig,
};
use hookrelay_gateway::dispatch::{Contact, DirectResolver, MessageTransport};
use hookrelay_gateway::ops::BearerGuard;
use hookrelay_gateway::router::{build_router, HEALTH_PATH, WEBHOOK_PATH};

const TOKEN: &str = "secret";

/// Records every send; peers listed in `failing` error out, peers in `stalled`
/// never complete, peers in `exploding` panic.
#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<(Contact, String)>>,
    failing: Vec<String>,
    stalled: Vec<String>,
    exploding: Vec<String>,
}

impl Recorder {
    fn messages(&self) -> Vec<(Contact, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageTransport for Recorder {
    async fn send(&self, _self_id: &str, contact: &Contact, message: &str) -> Result<()> {
        if self.stalled.contains(&contact.peer) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.exploding.contains(&contact.peer) {
            panic!("transport bug");
        }
        if self.failing.contains(&contact.peer) {
            return Err(HookError::Delivery("peer offline".into()));
        }
        self.sent.lock().unwrap().push((contact.clone(), message.to_string()));
        Ok(())
    }
}

struct BrokenConfig;

#[async_trait]
impl ConfigProvider for BrokenConfig {
    async fn get_config(&self) -> Result<Arc<WebhookConfig>> {
        Err(HookError::Config("disk on fire".into()))
    }
}

fn base_config() -> WebhookConfig {
    let mut cfg = WebhookConfig::default();
    cfg.bot.self_id = "10001".into();
    cfg.auth.token = TOKEN.into();
    cfg.route_key.location = RouteKeyLocation::Body;
    cfg.route_key.field_name = "route".into();
    cfg.rules = vec![Rule::new("rule-1", RuleMatch::equals("alpha"), vec![Target::friend("123")])];
    cfg
}

fn app_with(cfg: WebhookConfig, recorder: Arc<Recorder>) -> Router {
    let state = AppState::new(Arc::new(StaticConfig::new(cfg)), Arc::new(DirectResolver), recorder);
    build_router(state)
}

fn peer(ip: IpAddr) -> ConnectInfo<SocketAddr> {
    ConnectInfo(SocketAddr::new(ip, 40000))
}

fn push(body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(WEBHOOK_PATH)
        .header("content-type", "application/json")
        .header("X-Webhook-Token", TOKEN)
        .body(Body::from(body.into()))
        .unwrap()
}

fn from(mut req: Request<Body>, ip: IpAddr) -> Request<Body> {
    req.extensions_mut().insert(peer(ip));
    req
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn assert_error(body: &Value, code: &str) {
    assert_eq!(body["error"]["code"], code, "body: {body}");
    assert!(body["requestId"].as_str().is_some_and(|id| id.len() == 36), "body: {body}");
}

#[tokio::test]
async fn delivers_matching_webhook_end_to_end() {
    let recorder = Arc::new(Recorder::default());
    let app = app_with(base_config(), Arc::clone(&recorder));

    let (status, body) = call(&app, push(r#"{"route":"alpha","message":"hello"}"#)).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["routeKey"], "alpha");
    assert_eq!(body["matchedRules"], json!([{ "id": "rule-1", "name": "rule-1" }]));
    assert_eq!(
        body["results"],
        json!([{ "ruleId": "rule-1", "target": { "type": "friend", "id": "123" }, "success": true }])
    );
    assert_eq!(body["requestId"].as_str().map(str::len), Some(36));

    let sent = recorder.messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, Contact { peer: "123".into(), scene: TargetType::Friend });
    assert!(sent[0].1.contains("[Webhook][alpha] hello"), "message: {}", sent[0].1);
}

#[tokio::test]
async fn unmatched_route_key_succeeds_with_no_results() {
    let recorder = Arc::new(Recorder::default());
    let app = app_with(base_config(), Arc::clone(&recorder));

    let (status, body) = call(&app, push(r#"{"route":"beta"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matchedRules"], json!([]));
    assert_eq!(body["results"], json!([]));
    assert!(recorder.messages().is_empty());
}

#[tokio::test]
async fn disabled_intake_is_forbidden() {
    let mut cfg = base_config();
    cfg.enabled = false;
    let app = app_with(cfg, Arc::default());

    let (status, body) = call(&app, push("{}")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&body, "PLUGIN_DISABLED");
    assert_eq!(body["error"]["message"], "plugin is disabled");
}

#[tokio::test]
async fn allowlist_normalizes_mapped_addresses() {
    let mut cfg = base_config();
    cfg.ip_allowlist.enabled = true;
    cfg.ip_allowlist.ips = vec!["10.0.0.1".into()];
    let app = app_with(cfg, Arc::default());
    let body = r#"{"route":"alpha"}"#;

    let (status, resp) = call(&app, from(push(body), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&resp, "IP_NOT_ALLOWED");

    let (status, resp) = call(&app, push(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "unknown address fails closed");
    assert_error(&resp, "IP_NOT_ALLOWED");

    let mapped = IpAddr::V6(Ipv4Addr::new(10, 0, 0, 1).to_ipv6_mapped());
    let (status, _) = call(&app, from(push(body), mapped)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rate_limit_rejects_after_burst() {
    let mut cfg = base_config();
    cfg.rate_limit.max = 2;
    let app = app_with(cfg, Arc::default());
    let client = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7));
    let body = r#"{"route":"alpha"}"#;

    for _ in 0..2 {
        let (status, _) = call(&app, from(push(body), client)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, resp) = call(&app, from(push(body), client)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_error(&resp, "RATE_LIMITED");

    let other = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 8));
    let (status, _) = call(&app, from(push(body), other)).await;
    assert_eq!(status, StatusCode::OK, "other clients keep their own bucket");
}

#[tokio::test]
async fn wrong_or_missing_token_is_unauthorized() {
    let app = app_with(base_config(), Arc::default());

    let mut req = push(r#"{"route":"alpha"}"#);
    req.headers_mut().insert("x-webhook-token", "nope".parse().unwrap());
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, "UNAUTHORIZED");

    let mut req = push(r#"{"route":"alpha"}"#);
    req.headers_mut().remove("x-webhook-token");
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn gates_run_before_the_body_is_read() {
    let app = app_with(base_config(), Arc::default());

    let mut req = push("{ this is not json");
    req.headers_mut().remove("x-webhook-token");
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, "UNAUTHORIZED");
}

#[tokio::test]
async fn body_errors_map_to_client_codes() {
    let mut cfg = base_config();
    cfg.body_limit_bytes = 32;
    let app = app_with(cfg, Arc::default());

    let (status, body) = call(&app, push(format!(r#"{{"route":"{}"}}"#, "a".repeat(64)))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_error(&body, "BODY_TOO_LARGE");

    let (status, body) = call(&app, push("{ broken")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "INVALID_JSON");
}

#[tokio::test]
async fn missing_route_key_uses_default_or_fails() {
    let app = app_with(base_config(), Arc::default());
    let (status, body) = call(&app, push(r#"{"message":"hello"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "ROUTE_KEY_REQUIRED");
    assert_eq!(body["error"]["message"], "routeKey is required");

    let mut cfg = base_config();
    cfg.route_key.default_route_key = "alpha".into();
    let recorder = Arc::new(Recorder::default());
    let app = app_with(cfg, Arc::clone(&recorder));
    let (status, body) = call(&app, push(r#"{"message":"hello"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["routeKey"], "alpha");
    assert_eq!(recorder.messages().len(), 1);
}

#[tokio::test]
async fn query_locations_are_honored() {
    let mut cfg = base_config();
    cfg.auth.location = AuthLocation::Query;
    cfg.auth.field_name = "token".into();
    cfg.route_key.location = RouteKeyLocation::Query;
    cfg.route_key.field_name = "key".into();
    let recorder = Arc::new(Recorder::default());
    let app = app_with(cfg, Arc::clone(&recorder));

    let req = Request::builder()
        .method("POST")
        .uri(format!("{WEBHOOK_PATH}?token={TOKEN}&key=alpha"))
        .header("content-type", "text/plain")
        .body(Body::from("plain text body"))
        .unwrap();
    let (status, body) = call(&app, req).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["routeKey"], "alpha");
    let sent = recorder.messages();
    assert!(sent[0].1.ends_with("plain text body"), "message: {}", sent[0].1);
}

#[tokio::test]
async fn failing_target_does_not_stop_the_others() {
    let mut cfg = base_config();
    cfg.rules = vec![Rule::new(
        "fanout",
        RuleMatch::regex("^al"),
        vec![Target::friend("1"), Target::group("2")],
    )];
    let recorder = Arc::new(Recorder { failing: vec!["1".into()], ..Recorder::default() });
    let app = app_with(cfg, Arc::clone(&recorder));

    let (status, body) = call(&app, push(r#"{"route":"alpha"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["success"], false);
    assert_eq!(results[0]["error"], "peer offline");
    assert_eq!(results[1]["success"], true);
    assert!(results[1].get("error").is_none());
    assert_eq!(recorder.messages().len(), 1);
}

#[tokio::test]
async fn panicking_target_is_isolated_from_later_rules() {
    let mut cfg = base_config();
    cfg.rules = vec![
        Rule::new("first", RuleMatch::equals("alpha"), vec![Target::friend("boom"), Target::friend("1")])
            .with_priority(1),
        Rule::new("second", RuleMatch::equals("alpha"), vec![Target::group("2")]).with_priority(2),
    ];
    let recorder = Arc::new(Recorder { exploding: vec!["boom".into()], ..Recorder::default() });
    let app = app_with(cfg, Arc::clone(&recorder));

    let (status, body) = call(&app, push(r#"{"route":"alpha"}"#)).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["success"], false);
    assert_eq!(results[0]["error"], "panic: transport bug");
    assert_eq!(results[1]["success"], true);
    assert_eq!(results[2]["ruleId"], "second");
    assert_eq!(results[2]["success"], true);
    assert_eq!(recorder.messages().len(), 2);
}

#[tokio::test]
async fn stalled_target_times_out() {
    let mut cfg = base_config();
    cfg.delivery.timeout_ms = 20;
    cfg.rules = vec![Rule::new(
        "slow",
        RuleMatch::equals("alpha"),
        vec![Target::friend("stuck"), Target::friend("ok")],
    )];
    let recorder = Arc::new(Recorder { stalled: vec!["stuck".into()], ..Recorder::default() });
    let app = app_with(cfg, Arc::clone(&recorder));

    let (status, body) = call(&app, push(r#"{"route":"alpha"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["success"], false);
    assert_eq!(body["results"][0]["error"], "timed out after 20 ms");
    assert_eq!(body["results"][1]["success"], true);
}

#[tokio::test]
async fn multiple_rules_render_their_own_templates() {
    let mut cfg = base_config();
    cfg.rules = vec![
        Rule::new("b", RuleMatch::equals("beta"), vec![Target::group("g")])
            .with_template("Route={{routeKey}} {{summary}}"),
        Rule::new("a", RuleMatch::regex("^b"), vec![Target::friend("f")]).with_priority(50),
    ];
    let recorder = Arc::new(Recorder::default());
    let app = app_with(cfg, Arc::clone(&recorder));

    let (status, body) = call(&app, push(r#"{"route":"beta","text":"ping"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matchedRules"][0]["id"], "a");
    assert_eq!(body["matchedRules"][1]["id"], "b");
    let sent = recorder.messages();
    assert!(sent[0].1.starts_with("[Webhook][beta] ping\n"));
    assert_eq!(sent[1].1, "Route=beta ping");
}

#[tokio::test]
async fn config_failure_is_an_opaque_internal_error() {
    let state = AppState::new(Arc::new(BrokenConfig), Arc::new(DirectResolver), Arc::new(Recorder::default()));
    let app = build_router(state);

    let (status, body) = call(&app, push("{}")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&body, "INTERNAL_ERROR");
    assert_eq!(body["error"]["message"], "internal error");

    let req = Request::builder().uri(HEALTH_PATH).body(Body::empty()).unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&body, "INTERNAL_ERROR");
}

fn health(auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(HEALTH_PATH);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_config_digest() {
    let app = app_with(base_config(), Arc::default());

    let (status, body) = call(&app, health(None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["enabled"], true);
    assert_eq!(body["rules"], 1);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn health_guard_applies_only_when_required() {
    let guarded = |require_auth: bool| {
        let mut cfg = base_config();
        cfg.debug.require_auth = require_auth;
        let state = AppState::new(
            Arc::new(StaticConfig::new(cfg)),
            Arc::new(DirectResolver),
            Arc::new(Recorder::default()),
        )
        .with_health_guard(Arc::new(BearerGuard::new("ops")));
        build_router(state)
    };

    let app = guarded(true);
    let (status, body) = call(&app, health(None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, "UNAUTHORIZED");
    let (status, _) = call(&app, health(Some("Bearer ops"))).await;
    assert_eq!(status, StatusCode::OK);

    let app = guarded(false);
    let (status, _) = call(&app, health(None)).await;
    assert_eq!(status, StatusCode::OK);
}
