use thiserror::Error;

/// Failures raised while loading rule sets or resolving custom logic.
#[derive(Debug, Error)]
pub enum LogicError {
    #[error("failed to parse rule set: {0}")]
    RuleSetParse(#[source] serde_json::Error),
    #[error("rule uses CUSTOM logic but has no expression")]
    MissingCustomLogic,
    #[error("custom logic is empty")]
    EmptyExpression,
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    #[error("unexpected '{found}' at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },
    #[error("expression ended early; expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("custom logic nests deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: usize },
    #[error("condition slot C{slot} is out of range (rule has {count} conditions)")]
    SlotOutOfRange { slot: usize, count: usize },
    #[error("pipe template failed: {0}")]
    PipeTemplate(#[source] handlebars::RenderError),
}
