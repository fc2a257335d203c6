use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::LogicError;
use crate::evaluate::{answer_for, evaluate};
use crate::expr::LogicExpr;
use crate::spec::condition::Operator;
use crate::spec::rule::{LogicMode, Rule};

/// Evaluates a rule, treating any custom-logic failure as "not met".
pub fn evaluate_rule(rule: &Rule, answers: &Value) -> bool {
    match try_evaluate_rule(rule, answers) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(rule_id = %rule.id, error = %err, "custom logic failed; rule treated as not met");
            false
        }
    }
}

/// Like [`evaluate_rule`] but reports why custom logic could not be evaluated.
pub fn try_evaluate_rule(rule: &Rule, answers: &Value) -> Result<bool, LogicError> {
    match rule.logic {
        LogicMode::And => Ok(rule
            .conditions
            .iter()
            .all(|condition| evaluate(condition, answers))),
        LogicMode::Or => Ok(rule
            .conditions
            .iter()
            .any(|condition| evaluate(condition, answers))),
        LogicMode::Custom => {
            let expr = custom_expr(rule)?;
            expr.evaluate(&slot_results(rule, answers))
        }
    }
}

/// Parses the rule's custom logic.
pub fn custom_expr(rule: &Rule) -> Result<LogicExpr, LogicError> {
    let source = rule
        .custom_logic
        .as_deref()
        .ok_or(LogicError::MissingCustomLogic)?;
    LogicExpr::parse(source)
}

fn slot_results(rule: &Rule, answers: &Value) -> Vec<bool> {
    rule.conditions
        .iter()
        .map(|condition| evaluate(condition, answers))
        .collect()
}

/// Per-condition result shown in the builder's test panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConditionTrace {
    pub slot: String,
    pub condition_id: String,
    pub field: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Value>,
    pub result: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleTrace {
    pub rule_id: String,
    pub logic: LogicMode,
    pub enabled: bool,
    pub conditions: Vec<ConditionTrace>,
    pub outcome: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Evaluates a rule and records how each condition contributed.
pub fn explain_rule(rule: &Rule, answers: &Value) -> RuleTrace {
    let conditions = rule
        .conditions
        .iter()
        .enumerate()
        .map(|(idx, condition)| ConditionTrace {
            slot: format!("C{}", idx + 1),
            condition_id: condition.id.clone(),
            field: condition.field.clone(),
            operator: condition.operator,
            answer: answer_for(answers, &condition.field).as_json().cloned(),
            result: evaluate(condition, answers),
        })
        .collect();

    let (outcome, error) = match try_evaluate_rule(rule, answers) {
        Ok(outcome) => (outcome, None),
        Err(err) => (false, Some(err.to_string())),
    };

    RuleTrace {
        rule_id: rule.id.clone(),
        logic: rule.logic,
        enabled: rule.enabled,
        conditions,
        outcome,
        error,
    }
}
