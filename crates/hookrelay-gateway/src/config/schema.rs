use serde::{Deserialize, Serialize};

use hookrelay_core::error::{HookError, Result};
use hookrelay_core::routing::compile_pattern;
use hookrelay_core::{MatchType, Rule};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    /// Master switch for webhook intake.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub bot: BotSection,

    #[serde(default)]
    pub auth: AuthSection,

    #[serde(default)]
    pub ip_allowlist: IpAllowlistSection,

    #[serde(default)]
    pub route_key: RouteKeySection,

    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,

    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    #[serde(default)]
    pub rate_limit: RateLimitSection,

    #[serde(default)]
    pub delivery: DeliverySection,

    #[serde(default)]
    pub debug: DebugSection,

    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            enabled: true,
            bot: BotSection::default(),
            auth: AuthSection::default(),
            ip_allowlist: IpAllowlistSection::default(),
            route_key: RouteKeySection::default(),
            body_limit_bytes: default_body_limit_bytes(),
            max_message_chars: default_max_message_chars(),
            rate_limit: RateLimitSection::default(),
            delivery: DeliverySection::default(),
            debug: DebugSection::default(),
            rules: Vec::new(),
        }
    }
}

impl WebhookConfig {
    /// Check every constraint and report all violations at once.
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(HookError::Config(format!("unsupported config version: {}", self.version)));
        }

        let mut errors = Vec::new();

        if self.bot.self_id.trim().is_empty() {
            errors.push("bot.self_id must be a non-empty string".to_string());
        }
        self.auth.validate(&mut errors);
        if self.ip_allowlist.ips.iter().any(|ip| ip.trim().is_empty()) {
            errors.push("ip_allowlist.ips must not contain empty entries".to_string());
        }
        if self.route_key.field_name.is_empty() {
            errors.push("route_key.field_name must be a non-empty string".to_string());
        }
        if self.body_limit_bytes == 0 {
            errors.push("body_limit_bytes must be positive".to_string());
        }
        if self.max_message_chars == 0 {
            errors.push("max_message_chars must be positive".to_string());
        }
        self.rate_limit.validate(&mut errors);
        if self.delivery.timeout_ms == 0 {
            errors.push("delivery.timeout_ms must be positive".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for (i, rule) in self.rules.iter().enumerate() {
            validate_rule(i, rule, &mut errors);
            if !seen.insert(rule.id.as_str()) {
                errors.push(format!("rules[{i}].id must be unique"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(HookError::Config(format!("config validation failed: {}", errors.join("; "))))
        }
    }
}

fn validate_rule(i: usize, rule: &Rule, errors: &mut Vec<String>) {
    if rule.id.is_empty() {
        errors.push(format!("rules[{i}].id must be a non-empty string"));
    }
    if rule.name.is_empty() {
        errors.push(format!("rules[{i}].name must be a non-empty string"));
    }
    if rule.matcher.value.is_empty() {
        errors.push(format!("rules[{i}].match.value must be a non-empty string"));
    } else if rule.matcher.match_type == MatchType::Regex {
        if let Err(e) = compile_pattern(&rule.matcher.value) {
            errors.push(format!("rules[{i}].match.value is not a valid regex: {e}"));
        }
    }
    if !rule.priority.is_finite() {
        errors.push(format!("rules[{i}].priority must be a finite number"));
    }
    if rule.targets.is_empty() {
        errors.push(format!("rules[{i}].targets must be a non-empty list"));
    }
    for (j, target) in rule.targets.iter().enumerate() {
        if target.id.is_empty() {
            errors.push(format!("rules[{i}].targets[{j}].id must be a non-empty string"));
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BotSection {
    /// Sender identity handed to the message transport.
    #[serde(default)]
    pub self_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthLocation {
    Header,
    Query,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_auth_location")]
    pub location: AuthLocation,
    #[serde(default = "default_auth_field")]
    pub field_name: String,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            enabled: true,
            token: String::new(),
            location: default_auth_location(),
            field_name: default_auth_field(),
        }
    }
}

impl AuthSection {
    fn validate(&self, errors: &mut Vec<String>) {
        if self.enabled && self.token.trim().is_empty() {
            errors.push("auth.token must be a non-empty string when auth.enabled is true".into());
        }
        if self.field_name.is_empty() {
            errors.push("auth.field_name must be a non-empty string".into());
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IpAllowlistSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub ips: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKeyLocation {
    Header,
    Query,
    Body,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteKeySection {
    #[serde(default = "default_route_key_location")]
    pub location: RouteKeyLocation,
    #[serde(default = "default_route_key_field")]
    pub field_name: String,
    /// Used when the request carries no route key. Empty means "required".
    #[serde(default)]
    pub default_route_key: String,
}

impl Default for RouteKeySection {
    fn default() -> Self {
        Self {
            location: default_route_key_location(),
            field_name: default_route_key_field(),
            default_route_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// Bucket capacity, and tokens refilled per window.
    #[serde(default = "default_rate_max")]
    pub max: u32,
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: default_window_ms(),
            max: default_rate_max(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl RateLimitSection {
    fn validate(&self, errors: &mut Vec<String>) {
        if self.window_ms == 0 {
            errors.push("rate_limit.window_ms must be positive".into());
        }
        if self.max == 0 {
            errors.push("rate_limit.max must be positive".into());
        }
        if self.sweep_interval_ms == 0 {
            errors.push("rate_limit.sweep_interval_ms must be positive".into());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliverySection {
    /// Upper bound on a single send to one target.
    #[serde(default = "default_delivery_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for DeliverySection {
    fn default() -> Self {
        Self { timeout_ms: default_delivery_timeout_ms() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebugSection {
    /// Gate the health endpoint behind the installed health guard.
    #[serde(default = "default_true")]
    pub require_auth: bool,
}

impl Default for DebugSection {
    fn default() -> Self {
        Self { require_auth: true }
    }
}

fn default_true() -> bool {
    true
}
fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_auth_location() -> AuthLocation {
    AuthLocation::Header
}
fn default_auth_field() -> String {
    "X-Webhook-Token".into()
}
fn default_route_key_location() -> RouteKeyLocation {
    RouteKeyLocation::Header
}
fn default_route_key_field() -> String {
    "X-Route-Key".into()
}
fn default_body_limit_bytes() -> usize {
    256 * 1024
}
fn default_max_message_chars() -> usize {
    800
}
fn default_window_ms() -> u64 {
    60_000
}
fn default_rate_max() -> u32 {
    30
}
fn default_sweep_interval_ms() -> u64 {
    60_000
}
fn default_delivery_timeout_ms() -> u64 {
    10_000
}
