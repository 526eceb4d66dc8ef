//! Message rendering.
//!
//! Templates use `{{name}}` placeholders. Three variables are resolved per
//! message: `routeKey`, `summary` and `bodyPreview`; any other name renders
//! as an empty string.

pub mod summary;

use std::sync::Arc;

use serde_json::Value;

use crate::text::truncate;

pub use summary::{FeishuSummarizer, GithubSummarizer, PayloadSummarizer, SummarizerRegistry};

/// Template used when a rule carries none.
pub const DEFAULT_TEMPLATE: &str = "[Webhook][{{routeKey}}] {{summary}}\n{{bodyPreview}}";

/// Summary used when nothing better is found in the payload.
pub const FALLBACK_SUMMARY: &str = "received webhook";

/// Conventional payload fields consulted, in order, for a summary.
const SUMMARY_FIELDS: [&str; 3] = ["message", "text", "title"];

/// Inputs for rendering one message.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub route_key: &'a str,
    /// Parsed JSON body, or the raw body as a JSON string for other content types.
    pub payload: &'a Value,
    /// Text shown as `bodyPreview` before truncation.
    pub body_text: &'a str,
    pub template: Option<&'a str>,
    pub max_chars: usize,
}

/// Renders messages, consulting registered summarizers first.
#[derive(Clone, Default)]
pub struct Renderer {
    summarizers: Arc<SummarizerRegistry>,
}

impl Renderer {
    pub fn new(summarizers: SummarizerRegistry) -> Self {
        Self { summarizers: Arc::new(summarizers) }
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        let summary = self.summarize(ctx.payload);
        let body_preview = truncate(ctx.body_text, ctx.max_chars);
        let template = ctx.template.unwrap_or(DEFAULT_TEMPLATE);

        render_template(template, |name| match name {
            "routeKey" => Some(ctx.route_key),
            "summary" => Some(summary.as_str()),
            "bodyPreview" => Some(body_preview.as_str()),
            _ => None,
        })
    }

    /// Resolve the `summary` variable for a payload.
    pub fn summarize(&self, payload: &Value) -> String {
        if let Some(s) = self.summarizers.summarize(payload) {
            return s;
        }
        pick_summary_field(payload).unwrap_or_else(|| FALLBACK_SUMMARY.to_string())
    }
}

fn pick_summary_field(payload: &Value) -> Option<String> {
    let obj = payload.as_object()?;
    SUMMARY_FIELDS
        .iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Substitute `{{name}}` placeholders, where `name` is one or more word
/// characters (`[A-Za-z0-9_]`). Text that does not form a placeholder is
/// copied through unchanged.
pub fn render_template<'v>(template: &str, lookup: impl Fn(&str) -> Option<&'v str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if name_len > 0 && after[name_len..].starts_with("}}") {
            out.push_str(lookup(&after[..name_len]).unwrap_or(""));
            rest = &after[name_len + 2..];
        } else {
            // Not a placeholder here; a later `{{` may still start one.
            out.push('{');
            rest = &rest[start + 1..];
        }
    }
    out.push_str(rest);
    out
}
