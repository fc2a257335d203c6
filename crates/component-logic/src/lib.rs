use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use logic_spec::{
    LogicError, PipeRenderer, RuleSet, apply_effects, check_rules, explain_rule, rule_set_schema,
    run,
};

const DEFAULT_RULES: &str = include_str!("../../logic-spec/tests/fixtures/screening_rules.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config/{0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse answers: {0}")]
    AnswersParse(#[source] serde_json::Error),
    #[error("rule set '{0}' is not available")]
    RuleSetUnavailable(String),
    #[error("rule '{0}' is not defined")]
    RuleUnavailable(String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error(transparent)]
    Logic(#[from] LogicError),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    rules_json: Option<String>,
}

fn load_rule_set(config_json: &str) -> Result<RuleSet, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    let rules_json = config.rules_json.as_deref().unwrap_or(DEFAULT_RULES);
    Ok(RuleSet::from_json(rules_json)?)
}

fn ensure_rule_set(rule_set_id: &str, config_json: &str) -> Result<RuleSet, ComponentError> {
    let rule_set = load_rule_set(config_json)?;
    if rule_set.id != rule_set_id {
        Err(ComponentError::RuleSetUnavailable(rule_set_id.to_string()))
    } else {
        Ok(rule_set)
    }
}

fn parse_context(ctx_json: &str) -> Value {
    serde_json::from_str(ctx_json).unwrap_or_else(|_| Value::Object(Map::new()))
}

fn parse_answers(answers_json: &str) -> Result<Value, ComponentError> {
    if answers_json.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(answers_json).map_err(ComponentError::AnswersParse)
}

/// Question ids the host declared in `ctx.questions`.
fn context_questions(ctx: &Value) -> Vec<String> {
    ctx.get("questions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(ComponentError::JsonEncode)
}

pub fn describe(rule_set_id: &str, config_json: &str) -> String {
    respond(ensure_rule_set(rule_set_id, config_json).and_then(|rule_set| encode(&rule_set)))
}

pub fn schema() -> String {
    respond(Ok(rule_set_schema()))
}

pub fn evaluate(rule_set_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(ensure_rule_set(rule_set_id, config_json).and_then(|rule_set| {
        let answers = parse_answers(answers_json)?;
        let outcomes = run(&rule_set.rules, &answers);
        debug!(rule_set = %rule_set.id, evaluated = outcomes.len(), "evaluated rule set");
        encode(&outcomes)
    }))
}

pub fn explain(rule_set_id: &str, config_json: &str, answers_json: &str, rule_id: &str) -> String {
    respond(ensure_rule_set(rule_set_id, config_json).and_then(|rule_set| {
        let answers = parse_answers(answers_json)?;
        let rule = rule_set
            .rule(rule_id)
            .ok_or_else(|| ComponentError::RuleUnavailable(rule_id.to_string()))?;
        encode(&explain_rule(rule, &answers))
    }))
}

pub fn check(rule_set_id: &str, config_json: &str, ctx_json: &str) -> String {
    respond(ensure_rule_set(rule_set_id, config_json).and_then(|rule_set| {
        let ctx = parse_context(ctx_json);
        let questions = context_questions(&ctx);
        let known: BTreeSet<String> = questions.into_iter().collect();
        let known = if known.is_empty() { None } else { Some(&known) };
        encode(&check_rules(&rule_set, known))
    }))
}

pub fn apply(rule_set_id: &str, config_json: &str, ctx_json: &str, answers_json: &str) -> String {
    respond(ensure_rule_set(rule_set_id, config_json).and_then(|rule_set| {
        let ctx = parse_context(ctx_json);
        let answers = parse_answers(answers_json)?;
        let questions = context_questions(&ctx);
        let outcomes = run(&rule_set.rules, &answers);
        let renderer = PipeRenderer::new();
        let effects = apply_effects(&rule_set.rules, &outcomes, &answers, &questions, &renderer);
        Ok(json!({
            "outcomes": encode(&outcomes)?,
            "effects": encode(&effects)?,
        }))
    }))
}
