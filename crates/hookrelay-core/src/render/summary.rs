//! Pluggable payload summarizers.
//!
//! Each summarizer recognises one webhook source. The registry tries them in
//! registration order and the first non-empty summary wins, so new sources
//! are supported by registering another implementation.

use std::sync::Arc;

use serde_json::Value;

/// Summarizes payloads from one webhook source.
pub trait PayloadSummarizer: Send + Sync {
    fn name(&self) -> &'static str;
    fn can_handle(&self, payload: &Value) -> bool;
    fn summarize(&self, payload: &Value) -> Option<String>;
}

/// Ordered set of summarizers.
#[derive(Default)]
pub struct SummarizerRegistry {
    entries: Vec<Arc<dyn PayloadSummarizer>>,
}

impl SummarizerRegistry {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Registry with the built-in GitHub and Feishu summarizers.
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        reg.register(Arc::new(GithubSummarizer));
        reg.register(Arc::new(FeishuSummarizer));
        reg
    }

    pub fn register(&mut self, summarizer: Arc<dyn PayloadSummarizer>) {
        self.entries.push(summarizer);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|s| s.name()).collect()
    }

    pub fn summarize(&self, payload: &Value) -> Option<String> {
        self.entries
            .iter()
            .filter(|s| s.can_handle(payload))
            .filter_map(|s| s.summarize(payload))
            .find(|s| !s.trim().is_empty())
    }
}

fn non_blank<'a>(v: Option<&'a Value>) -> Option<&'a str> {
    v.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

/// GitHub repository webhooks (push, pull request, issue, release...).
pub struct GithubSummarizer;

impl PayloadSummarizer for GithubSummarizer {
    fn name(&self) -> &'static str {
        "github"
    }

    fn can_handle(&self, payload: &Value) -> bool {
        non_blank(payload.pointer("/repository/full_name")).is_some()
    }

    fn summarize(&self, payload: &Value) -> Option<String> {
        let repo = non_blank(payload.pointer("/repository/full_name"))?;

        if let (Some(git_ref), Some(commits)) =
            (non_blank(payload.get("ref")), payload.get("commits").and_then(Value::as_array))
        {
            let branch = git_ref.strip_prefix("refs/heads/").unwrap_or(git_ref);
            let noun = if commits.len() == 1 { "commit" } else { "commits" };
            return Some(format!("[{repo}] push to {branch} ({} {noun})", commits.len()));
        }

        let action = non_blank(payload.get("action"))?;
        for kind in ["pull_request", "issue", "release", "discussion"] {
            let title = non_blank(payload.pointer(&format!("/{kind}/title")))
                .or_else(|| non_blank(payload.pointer(&format!("/{kind}/name"))));
            if let Some(title) = title {
                return Some(format!("[{repo}] {kind} {action}: {title}"));
            }
        }
        Some(format!("[{repo}] {action}"))
    }
}

/// Feishu / Lark bot-style payloads (`msg_type` + `content`).
pub struct FeishuSummarizer;

impl PayloadSummarizer for FeishuSummarizer {
    fn name(&self) -> &'static str {
        "feishu"
    }

    fn can_handle(&self, payload: &Value) -> bool {
        non_blank(payload.get("msg_type")).is_some()
            && payload.get("content").is_some_and(Value::is_object)
    }

    fn summarize(&self, payload: &Value) -> Option<String> {
        match non_blank(payload.get("msg_type"))? {
            "text" => non_blank(payload.pointer("/content/text")).map(str::to_string),
            "post" => payload
                .pointer("/content/post")
                .and_then(Value::as_object)?
                .values()
                .find_map(|lang| non_blank(lang.get("title")))
                .map(str::to_string),
            _ => None,
        }
    }
}
