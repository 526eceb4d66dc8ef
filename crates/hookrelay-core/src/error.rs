//! Shared error type across hookrelay crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Webhook intake switched off in config.
    PluginDisabled,
    /// Caller address not in the allowlist.
    IpNotAllowed,
    /// Rate limited.
    RateLimited,
    /// Missing or wrong shared token.
    Unauthorized,
    /// Body exceeded the configured byte limit.
    BodyTooLarge,
    /// JSON content type with an unparsable body.
    InvalidJson,
    /// Body stream failed mid-read.
    ReadBodyFailed,
    /// No route key found and no default configured.
    RouteKeyRequired,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::PluginDisabled => "PLUGIN_DISABLED",
            ClientCode::IpNotAllowed => "IP_NOT_ALLOWED",
            ClientCode::RateLimited => "RATE_LIMITED",
            ClientCode::Unauthorized => "UNAUTHORIZED",
            ClientCode::BodyTooLarge => "BODY_TOO_LARGE",
            ClientCode::InvalidJson => "INVALID_JSON",
            ClientCode::ReadBodyFailed => "READ_BODY_FAILED",
            ClientCode::RouteKeyRequired => "ROUTE_KEY_REQUIRED",
            ClientCode::Internal => "INTERNAL_ERROR",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, HookError>;

/// Unified error type used by core and gateway.
///
/// The first group are request gates: deterministic, caller-caused, and
/// reported verbatim. `Config`, `Delivery` and `Internal` never reach the
/// caller as-is.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("plugin is disabled")]
    PluginDisabled,
    #[error("ip not allowed")]
    IpNotAllowed,
    #[error("rate limited")]
    RateLimited,
    #[error("invalid token")]
    Unauthorized,
    #[error("Request body too large")]
    BodyTooLarge,
    #[error("Invalid JSON body")]
    InvalidJson,
    #[error("Failed to read request body")]
    ReadBodyFailed,
    #[error("routeKey is required")]
    RouteKeyRequired,
    #[error("config: {0}")]
    Config(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl HookError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            HookError::PluginDisabled => ClientCode::PluginDisabled,
            HookError::IpNotAllowed => ClientCode::IpNotAllowed,
            HookError::RateLimited => ClientCode::RateLimited,
            HookError::Unauthorized => ClientCode::Unauthorized,
            HookError::BodyTooLarge => ClientCode::BodyTooLarge,
            HookError::InvalidJson => ClientCode::InvalidJson,
            HookError::ReadBodyFailed => ClientCode::ReadBodyFailed,
            HookError::RouteKeyRequired => ClientCode::RouteKeyRequired,
            HookError::Config(_) | HookError::Delivery(_) | HookError::Internal(_) => {
                ClientCode::Internal
            }
        }
    }

    /// True for request gates, whose message is safe to echo to the caller.
    pub fn is_gate(&self) -> bool {
        !matches!(self.client_code(), ClientCode::Internal)
    }
}
