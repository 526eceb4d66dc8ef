//! hookrelay gateway binary.
//!
//! Usage: `hookrelay-gateway [config-path]` (default `hookrelay.yaml`).
//! A missing config file is created with defaults and the process exits so
//! the operator can fill in `bot.self_id` and `auth.token`; startup refuses
//! any config that fails validation. Set `HOOKRELAY_HEALTH_TOKEN` to require
//! a bearer token on the health route.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use hookrelay_core::error::{HookError, Result};
use hookrelay_gateway::{
    app_state::AppState,
    config::{ConfigProvider, FileConfigStore},
    dispatch::{DirectResolver, LogTransport},
    ops::BearerGuard,
    policy::spawn_sweeper,
    router,
};

const DEFAULT_CONFIG_PATH: &str = "hookrelay.yaml";
const HEALTH_TOKEN_ENV: &str = "HOOKRELAY_HEALTH_TOKEN";

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "hookrelay-gateway stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let store = Arc::new(FileConfigStore::new(path));

    let cfg = store.load_for_startup().await?;
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| HookError::Config(format!("server.listen must be a socket address: {e}")))?;

    let config: Arc<dyn ConfigProvider> = store.clone();
    let mut state = AppState::new(Arc::clone(&config), Arc::new(DirectResolver), Arc::new(LogTransport));
    match std::env::var(HEALTH_TOKEN_ENV) {
        Ok(token) if !token.is_empty() => {
            state = state.with_health_guard(Arc::new(BearerGuard::new(token)));
        }
        _ => tracing::info!("health endpoint guard not installed"),
    }

    let _sweeper = spawn_sweeper(state.limiter(), config);
    let app = router::build_router(state);

    tracing::info!(%listen, config = %store.path().display(), rules = cfg.rules.len(), "hookrelay-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| HookError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|e| HookError::Internal(format!("server failed: {e}")))
}
