use serde_json::Value;

use crate::coerce::{
    Operand, includes, is_truthy, strict_equals, to_js_number, to_js_string,
};
use crate::spec::condition::{Condition, Operator};

/// Reads `answers[field]`; non-object answer maps read as `undefined`.
pub fn answer_for<'a>(answers: &'a Value, field: &str) -> Operand<'a> {
    Operand::from_option(answers.as_object().and_then(|map| map.get(field)))
}

/// Evaluates one condition against the current answers. Never fails; malformed
/// comparisons resolve to `false`.
pub fn evaluate(condition: &Condition, answers: &Value) -> bool {
    let answer = answer_for(answers, &condition.field);
    let expected = Operand::from_option(condition.value.as_ref());

    match condition.operator {
        Operator::Equals => strict_equals(answer, expected),
        Operator::NotEquals => !strict_equals(answer, expected),
        Operator::Contains => to_js_string(answer).contains(&to_js_string(expected)),
        Operator::NotContains => !to_js_string(answer).contains(&to_js_string(expected)),
        Operator::Greater => to_js_number(answer) > to_js_number(expected),
        Operator::Less => to_js_number(answer) < to_js_number(expected),
        Operator::Between => match expected.as_json() {
            Some(Value::Array(bounds)) if bounds.len() == 2 => {
                let value = to_js_number(answer);
                let min = to_js_number(Operand::Json(&bounds[0]));
                let max = to_js_number(Operand::Json(&bounds[1]));
                min <= value && value <= max
            }
            _ => false,
        },
        Operator::In => match expected.as_json() {
            Some(Value::Array(list)) => includes(list, answer),
            _ => false,
        },
        Operator::NotIn => match expected.as_json() {
            Some(Value::Array(list)) => !includes(list, answer),
            _ => false,
        },
        Operator::IsEmpty => !is_truthy(answer),
        Operator::IsNotEmpty => is_truthy(answer),
        Operator::Unsupported => false,
    }
}
