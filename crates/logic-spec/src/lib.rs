#![allow(missing_docs)]

pub mod coerce;
pub mod effects;
pub mod error;
pub mod evaluate;
pub mod expr;
pub mod rule;
pub mod runner;
pub mod schema;
pub mod spec;
pub mod validate;

pub use effects::{
    Directive, EffectState, PipeRenderer, ValidationFailure, VisibilityMap, apply_effects,
};
pub use error::LogicError;
pub use evaluate::evaluate;
pub use expr::LogicExpr;
pub use rule::{ConditionTrace, RuleTrace, evaluate_rule, explain_rule, try_evaluate_rule};
pub use runner::{RuleOutcomes, display_order, run};
pub use schema::rule_set_schema;
pub use spec::{
    Action, ActionType, Condition, ConditionType, LogicMode, Operator, Rule, RuleSet,
};
pub use validate::{RuleIssue, RuleReport, check_rules};
