//! Request field lookup: auth token and route key.
//!
//! Header names match case-insensitively; query and body keys match
//! exactly. Multi-valued fields yield their first value, and an empty value
//! counts as absent.

use axum::http::HeaderMap;
use serde_json::Value;

use hookrelay_core::error::{HookError, Result};

use crate::config::{AuthLocation, AuthSection, RouteKeyLocation, RouteKeySection};

/// Borrowed view over the parts of a request that carry fields.
#[derive(Debug, Clone, Copy)]
pub struct RequestView<'a> {
    pub headers: &'a HeaderMap,
    /// Decoded query pairs in their original order.
    pub query: &'a [(String, String)],
    /// Parsed body, when one exists.
    pub body: Option<&'a Value>,
}

pub fn header_first<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name.to_ascii_lowercase().as_str())
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
}

pub fn query_first<'a>(query: &'a [(String, String)], name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
        .filter(|s| !s.is_empty())
}

/// String field of an object body; an array value yields its first element
/// when that element is a string.
pub fn body_field<'a>(body: Option<&'a Value>, name: &str) -> Option<&'a str> {
    let field = body?.as_object()?.get(name)?;
    let s = match field {
        Value::String(s) => s.as_str(),
        Value::Array(items) => items.first()?.as_str()?,
        _ => return None,
    };
    Some(s).filter(|s| !s.is_empty())
}

pub fn auth_token<'a>(view: &RequestView<'a>, cfg: &AuthSection) -> Option<&'a str> {
    match cfg.location {
        AuthLocation::Header => header_first(view.headers, &cfg.field_name),
        AuthLocation::Query => query_first(view.query, &cfg.field_name),
    }
}

pub fn extract_route_key(view: &RequestView<'_>, cfg: &RouteKeySection) -> Result<String> {
    let found = match cfg.location {
        RouteKeyLocation::Header => header_first(view.headers, &cfg.field_name),
        RouteKeyLocation::Query => query_first(view.query, &cfg.field_name),
        RouteKeyLocation::Body => body_field(view.body, &cfg.field_name),
    };

    match found {
        Some(key) => Ok(key.to_string()),
        None if !cfg.default_route_key.is_empty() => Ok(cfg.default_route_key.clone()),
        None => Err(HookError::RouteKeyRequired),
    }
}
