use std::collections::BTreeSet;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LogicError;
use crate::rule::custom_expr;
use crate::spec::action::ActionType;
use crate::spec::condition::{Condition, Operator};
use crate::spec::rule::{LogicMode, Rule, RuleSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleIssue {
    pub rule_id: String,
    pub path: String,
    pub message: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleReport {
    pub valid: bool,
    pub errors: Vec<RuleIssue>,
    pub warnings: Vec<RuleIssue>,
}

/// Checks a rule set for definitions that would silently evaluate to `false`.
///
/// `known_fields`, when given, lists the question ids the form defines; it
/// enables the unknown field/target warnings.
pub fn check_rules(rule_set: &RuleSet, known_fields: Option<&BTreeSet<String>>) -> RuleReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut seen = BTreeSet::new();

    for (idx, rule) in rule_set.rules.iter().enumerate() {
        let base = format!("/rules/{}", idx);

        if !seen.insert(rule.id.as_str()) {
            errors.push(issue(rule, &base, "duplicate rule id", "duplicate_rule_id"));
        }
        if rule.conditions.is_empty() {
            warnings.push(issue(rule, &base, "rule has no conditions", "no_conditions"));
        }
        if rule.actions.is_empty() {
            warnings.push(issue(rule, &base, "rule has no actions", "no_actions"));
        }

        if rule.logic == LogicMode::Custom {
            check_custom_logic(rule, &base, &mut errors, &mut warnings);
        }

        for (cidx, condition) in rule.conditions.iter().enumerate() {
            let path = format!("{}/conditions/{}", base, cidx);
            if let Some(error) = check_condition_shape(rule, condition, &path) {
                errors.push(error);
            }
            if let Some(known) = known_fields
                && !known.contains(&condition.field)
            {
                warnings.push(issue(
                    rule,
                    &path,
                    &format!("field '{}' is not a known question", condition.field),
                    "unknown_field",
                ));
            }
        }

        for (aidx, action) in rule.actions.iter().enumerate() {
            let path = format!("{}/actions/{}", base, aidx);
            if action.kind == ActionType::Validate {
                match action.value.as_ref().and_then(Value::as_str) {
                    Some(pattern) => {
                        if let Err(err) = Regex::new(pattern) {
                            warnings.push(issue(rule, &path, &err.to_string(), "invalid_pattern"));
                        }
                    }
                    None => warnings.push(issue(
                        rule,
                        &path,
                        "validate action needs a pattern string",
                        "invalid_pattern",
                    )),
                }
            }
            if let Some(known) = known_fields
                && action.kind != ActionType::EndSurvey
                && !known.contains(&action.target)
            {
                warnings.push(issue(
                    rule,
                    &path,
                    &format!("target '{}' is not a known question", action.target),
                    "unknown_target",
                ));
            }
        }
    }

    RuleReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn check_custom_logic(
    rule: &Rule,
    base: &str,
    errors: &mut Vec<RuleIssue>,
    warnings: &mut Vec<RuleIssue>,
) {
    let path = format!("{}/custom_logic", base);
    let expr = match custom_expr(rule) {
        Ok(expr) => expr,
        Err(LogicError::MissingCustomLogic) => {
            errors.push(issue(
                rule,
                &path,
                "CUSTOM logic requires an expression",
                "missing_custom_logic",
            ));
            return;
        }
        Err(err) => {
            errors.push(issue(rule, &path, &err.to_string(), "custom_logic_syntax"));
            return;
        }
    };

    if let Err(err) = expr.check_slots(rule.conditions.len()) {
        errors.push(issue(rule, &path, &err.to_string(), "slot_out_of_range"));
    }
    if expr.max_slot() == 0 && !rule.conditions.is_empty() {
        warnings.push(issue(
            rule,
            &path,
            "expression does not reference any condition",
            "unused_condition",
        ));
    }
}

fn check_condition_shape(rule: &Rule, condition: &Condition, path: &str) -> Option<RuleIssue> {
    match condition.operator {
        Operator::Unsupported => Some(issue(
            rule,
            path,
            "operator is not supported and always evaluates to false",
            "unsupported_operator",
        )),
        Operator::Between => match &condition.value {
            Some(Value::Array(bounds)) if bounds.len() == 2 => None,
            _ => Some(issue(
                rule,
                path,
                "between expects a [min, max] list",
                "between_shape",
            )),
        },
        Operator::In | Operator::NotIn => match &condition.value {
            Some(Value::Array(_)) => None,
            _ => Some(issue(
                rule,
                path,
                &format!("{} expects a list value", condition.operator.as_str()),
                "list_expected",
            )),
        },
        _ => None,
    }
}

fn issue(rule: &Rule, path: &str, message: &str, code: &str) -> RuleIssue {
    RuleIssue {
        rule_id: rule.id.clone(),
        path: path.to_string(),
        message: message.into(),
        code: code.into(),
    }
}
