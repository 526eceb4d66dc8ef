//! Rule engine vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use hookrelay_core::routing::{is_match, match_rules};
use hookrelay_core::{Rule, RuleMatch, Target};


#[test]
fn rule_vectors() {
    let files = [
        "priority_tiebreak.json",
        "stop_on_match.json",
        "disabled_and_invalid.json",
        "equals_is_exact.json",
        "stop_rule_first.json",
    ];

    for f in files {
        let v = vector_loader::load(f);
        let got: Vec<&str> = match_rules(&v.route_key, &v.rules)
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(got, v.expect, "vector={}", v.description);
    }
}

#[test]
fn output_is_a_prefix_of_the_sorted_matching_rules() {
    let rules: Vec<Rule> = (0..12)
        .map(|i| {
            Rule::new(format!("r{:02}", i), RuleMatch::regex("^k"), vec![Target::friend("1")])
                .with_priority(i % 4)
                .with_stop_on_match(i == 9)
        })
        .collect();

    let got: Vec<&str> = match_rules("key", &rules).iter().map(|r| r.id.as_str()).collect();

    // priorities 0..=3 in groups; r09 has priority 1 and stops the walk.
    assert_eq!(got, vec!["r00", "r04", "r08", "r01", "r05", "r09"]);
}

#[test]
fn no_rules_or_no_match_is_empty() {
    assert!(match_rules("alpha", &[]).is_empty());

    let rules = vec![Rule::new("x", RuleMatch::equals("beta"), vec![Target::group("2")])];
    assert!(match_rules("alpha", &rules).is_empty());
}

#[test]
fn invalid_pattern_is_a_non_match() {
    assert!(!is_match("anything", &RuleMatch::regex("[")));
    assert!(!is_match("(", &RuleMatch::regex("(")));
    assert!(is_match("prod-alert", &RuleMatch::regex("^prod-")));
    assert!(is_match("xx-prod-", &RuleMatch::regex("prod-$")));
}

#[test]
fn engine_does_not_reorder_caller_rules() {
    let rules = vec![
        Rule::new("b", RuleMatch::equals("k"), vec![Target::friend("1")]).with_priority(2),
        Rule::new("a", RuleMatch::equals("k"), vec![Target::friend("1")]).with_priority(1),
    ];
    let before = rules.clone();
    let _ = match_rules("k", &rules);
    assert_eq!(rules, before);
}

#[test]
fn look_around_and_backreferences_are_supported() {
    let not_test = RuleMatch::regex("^(?!test-).+");
    assert!(is_match("prod-api", &not_test));
    assert!(!is_match("test-api", &not_test));

    let doubled = RuleMatch::regex(r"^(\w+)-\1$");
    assert!(is_match("ci-ci", &doubled));
    assert!(!is_match("ci-cd", &doubled));
}

#[test]
fn fractional_priorities_sort_between_integers() {
    let rules = vec![
        Rule::new("two", RuleMatch::equals("k"), vec![Target::friend("1")]).with_priority(2),
        Rule::new("half", RuleMatch::equals("k"), vec![Target::friend("1")]).with_priority(1.5),
        Rule::new("one", RuleMatch::equals("k"), vec![Target::friend("1")]).with_priority(1),
    ];
    let got: Vec<&str> = match_rules("k", &rules).iter().map(|r| r.id.as_str()).collect();
    assert_eq!(got, vec!["one", "half", "two"]);
}
