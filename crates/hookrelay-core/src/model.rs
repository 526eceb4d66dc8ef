//! Rule, target and dispatch result types.
//!
//! Rules arrive from configuration as immutable snapshots; nothing in core
//! mutates them. YAML field names are snake_case, while the types that land in
//! HTTP responses (`SendResult`, `MatchedRule`) serialize as camelCase.

use serde::{Deserialize, Serialize};

/// Kind of recipient a target addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Friend,
    Group,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Friend => "friend",
            TargetType::Group => "group",
        }
    }
}

/// A message recipient. Opaque beyond its type/id pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    #[serde(rename = "type")]
    pub target_type: TargetType,
    pub id: String,
}

impl Target {
    pub fn friend(id: impl Into<String>) -> Self {
        Self { target_type: TargetType::Friend, id: id.into() }
    }

    pub fn group(id: impl Into<String>) -> Self {
        Self { target_type: TargetType::Group, id: id.into() }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.target_type.as_str(), self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Equals,
    Regex,
}

/// How a route key is tested against a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleMatch {
    #[serde(rename = "type")]
    pub match_type: MatchType,
    pub value: String,
}

impl RuleMatch {
    pub fn equals(value: impl Into<String>) -> Self {
        Self { match_type: MatchType::Equals, value: value.into() }
    }

    pub fn regex(value: impl Into<String>) -> Self {
        Self { match_type: MatchType::Regex, value: value.into() }
    }
}

/// A routing policy: route-key pattern -> targets (+ optional template).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(rename = "match")]
    pub matcher: RuleMatch,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Lower is evaluated first. Any number is accepted, fractions included.
    #[serde(default = "default_priority")]
    pub priority: f64,
    #[serde(default)]
    pub stop_on_match: bool,
}

impl Rule {
    /// Enabled rule with default priority and no template.
    pub fn new(id: impl Into<String>, matcher: RuleMatch, targets: Vec<Target>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            enabled: true,
            matcher,
            targets,
            template: None,
            priority: default_priority(),
            stop_on_match: false,
        }
    }

    pub fn with_priority(mut self, priority: impl Into<f64>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn with_stop_on_match(mut self, stop: bool) -> Self {
        self.stop_on_match = stop;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

fn default_true() -> bool {
    true
}

fn default_priority() -> f64 {
    100.0
}

/// Outcome of one (rule, target) delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub rule_id: String,
    pub target: Target,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendResult {
    pub fn ok(rule_id: &str, target: &Target) -> Self {
        Self { rule_id: rule_id.to_string(), target: target.clone(), success: true, error: None }
    }

    pub fn failed(rule_id: &str, target: &Target, error: String) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            target: target.clone(),
            success: false,
            error: Some(error),
        }
    }
}

/// Rule summary echoed back in a successful webhook response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRule {
    pub id: String,
    pub name: String,
}

impl From<&Rule> for MatchedRule {
    fn from(rule: &Rule) -> Self {
        Self { id: rule.id.clone(), name: rule.name.clone() }
    }
}
