use serde_json::Value;

use crate::spec::rule::RuleSet;

/// JSON schema describing a rule set document.
pub fn rule_set_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(RuleSet)).unwrap_or(Value::Null)
}
