use serde_json::Value;
use tracing::debug;

use crate::rule::evaluate_rule;
use crate::spec::rule::Rule;

pub type RuleOutcomes = std::collections::BTreeMap<String, bool>;

/// Evaluates every enabled rule independently. Disabled rules get no entry; a
/// repeated id keeps the outcome of the later rule.
pub fn run(rules: &[Rule], answers: &Value) -> RuleOutcomes {
    let mut outcomes = RuleOutcomes::new();

    for rule in rules.iter().filter(|rule| rule.enabled) {
        let outcome = evaluate_rule(rule, answers);
        debug!(rule_id = %rule.id, outcome, "rule evaluated");
        outcomes.insert(rule.id.clone(), outcome);
    }

    outcomes
}

/// Rules ordered for display in the builder: highest priority first, ties in
/// authoring order.
pub fn display_order(rules: &[Rule]) -> Vec<&Rule> {
    let mut ordered: Vec<&Rule> = rules.iter().collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
    ordered
}
