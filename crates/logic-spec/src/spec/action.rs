use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative effect attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Show,
    Hide,
    Skip,
    Require,
    SetValue,
    PipeValue,
    Validate,
    Calculate,
    Loop,
    Randomize,
    EndSurvey,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Show => "show",
            ActionType::Hide => "hide",
            ActionType::Skip => "skip",
            ActionType::Require => "require",
            ActionType::SetValue => "set_value",
            ActionType::PipeValue => "pipe_value",
            ActionType::Validate => "validate",
            ActionType::Calculate => "calculate",
            ActionType::Loop => "loop",
            ActionType::Randomize => "randomize",
            ActionType::EndSurvey => "end_survey",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActionType,
    #[serde(default)]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}
