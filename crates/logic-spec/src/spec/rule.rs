use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::LogicError;
use crate::spec::action::Action;
use crate::spec::condition::Condition;

/// How a rule combines its conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicMode {
    #[default]
    And,
    Or,
    /// Free-text boolean expression over `C1..Cn`.
    Custom,
}

/// A named set of conditions, a combinator and the actions to run when it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub logic: LogicMode,
    #[serde(
        default,
        alias = "customLogic",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_logic: Option<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Display ordering only; never changes evaluation.
    #[serde(default)]
    pub priority: i64,
}

fn enabled_by_default() -> bool {
    true
}

/// Rules authored for one questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleSet {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleSetInput {
    Set(RuleSet),
    Bare(Vec<Rule>),
}

impl RuleSet {
    pub const DEFAULT_ID: &'static str = "default";

    /// Parses either a full rule set object or a bare array of rules.
    pub fn from_json(json: &str) -> Result<Self, LogicError> {
        let input: RuleSetInput = serde_json::from_str(json).map_err(LogicError::RuleSetParse)?;
        Ok(match input {
            RuleSetInput::Set(set) => set,
            RuleSetInput::Bare(rules) => RuleSet {
                id: Self::DEFAULT_ID.into(),
                title: None,
                version: None,
                rules,
            },
        })
    }

    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }
}
