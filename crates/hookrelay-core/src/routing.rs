//! Rule matching.
//!
//! Evaluation order is fully deterministic: enabled rules sorted by ascending
//! priority, ties broken by ascending id. The walk stops right after the first
//! matching rule that has `stop_on_match` set.
//!
//! Patterns accept look-around and backreferences. Patterns that need
//! neither run on the linear-time engine; the rest backtrack under a step
//! budget, and running out of budget counts as no match.

use fancy_regex::{Regex, RegexBuilder};

use crate::model::{MatchType, Rule, RuleMatch};

/// Upper bound on compiled program size for rule patterns.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Backtracking steps allowed for one match attempt.
const REGEX_BACKTRACK_LIMIT: usize = 100_000;

/// Match `route_key` against `rules` and return the matching rules in
/// evaluation order. Zero matches is a normal outcome.
pub fn match_rules<'a>(route_key: &str, rules: &'a [Rule]) -> Vec<&'a Rule> {
    let mut ordered: Vec<&Rule> = rules.iter().filter(|r| r.enabled).collect();
    ordered.sort_by(|a, b| a.priority.total_cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));

    let mut matched = Vec::new();
    for rule in ordered {
        if !is_match(route_key, &rule.matcher) {
            continue;
        }
        matched.push(rule);
        if rule.stop_on_match {
            break;
        }
    }
    matched
}

/// Test one route key against one matcher. A pattern that fails to compile
/// never matches.
pub fn is_match(route_key: &str, matcher: &RuleMatch) -> bool {
    match matcher.match_type {
        MatchType::Equals => route_key == matcher.value,
        MatchType::Regex => {
            let re = match compile_pattern(&matcher.value) {
                Ok(re) => re,
                Err(e) => {
                    tracing::debug!(pattern = %matcher.value, error = %e, "rule pattern does not compile");
                    return false;
                }
            };
            re.is_match(route_key).unwrap_or_else(|e| {
                tracing::debug!(pattern = %matcher.value, error = %e, "rule pattern gave up");
                false
            })
        }
    }
}

/// Compile a rule pattern with the same limits used at match time.
/// Config validation calls this so bad patterns are caught before they ship.
pub fn compile_pattern(pattern: &str) -> std::result::Result<Regex, fancy_regex::Error> {
    RegexBuilder::new(pattern)
        .delegate_size_limit(REGEX_SIZE_LIMIT)
        .backtrack_limit(REGEX_BACKTRACK_LIMIT)
        .build()
}
