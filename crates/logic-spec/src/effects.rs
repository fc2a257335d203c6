use std::collections::{BTreeMap, BTreeSet};

use handlebars::Handlebars;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::coerce::{Operand, to_js_string};
use crate::error::LogicError;
use crate::evaluate::answer_for;
use crate::runner::RuleOutcomes;
use crate::spec::action::{Action, ActionType};
use crate::spec::rule::Rule;

pub type VisibilityMap = BTreeMap<String, bool>;

/// Renders `pipe_value` templates over `{ answers }`.
pub struct PipeRenderer {
    registry: Handlebars<'static>,
}

impl PipeRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        Self { registry }
    }

    pub fn render(&self, template: &str, answers: &Value) -> Result<String, LogicError> {
        self.registry
            .render_template(template, &json!({ "answers": answers }))
            .map_err(LogicError::PipeTemplate)
    }
}

impl Default for PipeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Work the host performs itself (loops, randomization, calculations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Directive {
    pub rule_id: String,
    pub action: ActionType,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationFailure {
    pub rule_id: String,
    pub target: String,
    pub message: String,
    pub code: String,
}

/// Form state after applying the actions of every fired rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EffectState {
    pub visibility: VisibilityMap,
    pub skipped: BTreeSet<String>,
    pub required: BTreeSet<String>,
    pub values: BTreeMap<String, Value>,
    pub piped: BTreeMap<String, String>,
    pub validation_failures: Vec<ValidationFailure>,
    pub directives: Vec<Directive>,
    pub end_survey: bool,
    pub fired: Vec<String>,
}

impl EffectState {
    pub fn is_visible(&self, target: &str) -> bool {
        self.visibility.get(target).copied().unwrap_or(true) && !self.skipped.contains(target)
    }
}

/// Applies actions of rules whose outcome is `true`, in authoring order.
///
/// `questions` seeds the visibility map (all visible). Targets of `show` actions
/// on enabled rules start hidden so they only appear once a rule fires.
pub fn apply_effects(
    rules: &[Rule],
    outcomes: &RuleOutcomes,
    answers: &Value,
    questions: &[String],
    renderer: &PipeRenderer,
) -> EffectState {
    let mut state = EffectState::default();

    for question in questions {
        state.visibility.insert(question.clone(), true);
    }
    for rule in rules.iter().filter(|rule| rule.enabled) {
        for action in rule.actions.iter().filter(|a| a.kind == ActionType::Show) {
            state.visibility.insert(action.target.clone(), false);
        }
    }

    // Outcomes are keyed by rule id, so rules sharing an id all follow the
    // last one's outcome; check_rules reports those as duplicate_rule_id.
    for rule in rules {
        if !outcomes.get(&rule.id).copied().unwrap_or(false) || !rule.enabled {
            continue;
        }
        debug!(rule_id = %rule.id, actions = rule.actions.len(), "applying rule actions");
        state.fired.push(rule.id.clone());
        for action in &rule.actions {
            apply_action(&mut state, rule, action, answers, renderer);
        }
    }

    state
}

fn apply_action(
    state: &mut EffectState,
    rule: &Rule,
    action: &Action,
    answers: &Value,
    renderer: &PipeRenderer,
) {
    let target = action.target.clone();
    match action.kind {
        ActionType::Show => {
            state.visibility.insert(target, true);
        }
        ActionType::Hide => {
            state.visibility.insert(target, false);
        }
        ActionType::Skip => {
            state.skipped.insert(target);
        }
        ActionType::Require => {
            state.required.insert(target);
        }
        ActionType::SetValue => {
            state
                .values
                .insert(target, action.value.clone().unwrap_or(Value::Null));
        }
        ActionType::PipeValue => {
            let template = to_js_string(Operand::from_option(action.value.as_ref()));
            match renderer.render(&template, answers) {
                Ok(text) => {
                    state.piped.insert(target, text);
                }
                Err(err) => {
                    warn!(rule_id = %rule.id, target = %target, error = %err, "pipe template failed");
                }
            }
        }
        ActionType::Validate => {
            if let Some(failure) = check_pattern(rule, action, answers) {
                state.validation_failures.push(failure);
            }
        }
        ActionType::Calculate | ActionType::Loop | ActionType::Randomize => {
            state.directives.push(Directive {
                rule_id: rule.id.clone(),
                action: action.kind,
                target,
                value: action.value.clone(),
            });
        }
        ActionType::EndSurvey => {
            state.end_survey = true;
        }
    }
}

fn check_pattern(rule: &Rule, action: &Action, answers: &Value) -> Option<ValidationFailure> {
    let failure = |message: String, code: &str| ValidationFailure {
        rule_id: rule.id.clone(),
        target: action.target.clone(),
        message,
        code: code.into(),
    };

    let Some(pattern) = action.value.as_ref().and_then(Value::as_str) else {
        return Some(failure(
            "validate action needs a pattern string".into(),
            "invalid_pattern",
        ));
    };
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => return Some(failure(err.to_string(), "invalid_pattern")),
    };

    let answer = answer_for(answers, &action.target);
    if answer.as_json().is_none() {
        return None;
    }
    if regex.is_match(&to_js_string(answer)) {
        None
    } else {
        Some(failure(
            "value does not match pattern".into(),
            "pattern_mismatch",
        ))
    }
}
