//! Gateway config loader (strict parsing) and runtime providers.

pub mod schema;
pub mod store;

use std::fs;

use hookrelay_core::error::{HookError, Result};

pub use schema::{
    AuthLocation, AuthSection, BotSection, DebugSection, DeliverySection, IpAllowlistSection,
    RateLimitSection, RouteKeyLocation, RouteKeySection, ServerSection, WebhookConfig,
};
pub use store::{ConfigProvider, FileConfigStore, StaticConfig};

pub fn load_from_file(path: &str) -> Result<WebhookConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| HookError::Config(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<WebhookConfig> {
    let cfg: WebhookConfig = serde_yaml::from_str(s)
        .map_err(|e| HookError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Render a config back to YAML (used to seed a missing config file).
pub fn to_yaml(cfg: &WebhookConfig) -> Result<String> {
    serde_yaml::to_string(cfg).map_err(|e| HookError::Config(format!("encode yaml: {e}")))
}
