pub mod action;
pub mod condition;
pub mod rule;

pub use action::{Action, ActionType};
pub use condition::{Condition, ConditionType, Operator};
pub use rule::{LogicMode, Rule, RuleSet};
