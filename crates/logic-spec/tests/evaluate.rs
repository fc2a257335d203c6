use serde_json::{Value, json};

use logic_spec::{Condition, ConditionType, Operator, evaluate};

fn condition(field: &str, operator: Operator, value: Option<Value>) -> Condition {
    Condition {
        id: "c".into(),
        field: field.into(),
        operator,
        value,
        kind: ConditionType::Question,
    }
}

#[test]
fn between_accepts_values_inside_bounds() {
    let age = condition("age", Operator::Between, Some(json!([18, 65])));
    assert!(evaluate(&age, &json!({ "age": 30 })));
    assert!(evaluate(&age, &json!({ "age": 18 })));
    assert!(evaluate(&age, &json!({ "age": "65" })));
    assert!(!evaluate(&age, &json!({ "age": 70 })));
    assert!(!evaluate(&age, &json!({ "age": "N/A" })));
    assert!(!evaluate(&age, &json!({})));
}

#[test]
fn between_requires_two_bounds() {
    let single = condition("age", Operator::Between, Some(json!([18])));
    assert!(!evaluate(&single, &json!({ "age": 30 })));
    let scalar = condition("age", Operator::Between, Some(json!(18)));
    assert!(!evaluate(&scalar, &json!({ "age": 18 })));
}

#[test]
fn equals_is_strict() {
    let status = condition("status", Operator::Equals, Some(json!("student")));
    assert!(evaluate(&status, &json!({ "status": "student" })));
    assert!(!evaluate(&status, &json!({ "status": "Student" })));

    let count = condition("count", Operator::Equals, Some(json!(3)));
    assert!(evaluate(&count, &json!({ "count": 3.0 })));
    assert!(!evaluate(&count, &json!({ "count": "3" })));

    let tags = condition("tags", Operator::Equals, Some(json!(["a"])));
    assert!(!evaluate(&tags, &json!({ "tags": ["a"] })));
}

#[test]
fn missing_value_matches_missing_answer_only() {
    let unset = condition("nickname", Operator::Equals, None);
    assert!(evaluate(&unset, &json!({})));
    assert!(!evaluate(&unset, &json!({ "nickname": null })));

    let null = condition("nickname", Operator::Equals, Some(Value::Null));
    assert!(evaluate(&null, &json!({ "nickname": null })));
    assert!(!evaluate(&null, &json!({})));
}

#[test]
fn not_equals_negates_strict_equality() {
    let status = condition("status", Operator::NotEquals, Some(json!("retired")));
    assert!(evaluate(&status, &json!({ "status": "student" })));
    assert!(evaluate(&status, &json!({})));
    assert!(!evaluate(&status, &json!({ "status": "retired" })));
}

#[test]
fn contains_coerces_both_sides_to_strings() {
    let text = condition("comment", Operator::Contains, Some(json!("bias")));
    assert!(evaluate(&text, &json!({ "comment": "possible bias here" })));
    assert!(!evaluate(&text, &json!({ "comment": "neutral" })));

    let digits = condition("code", Operator::Contains, Some(json!(12)));
    assert!(evaluate(&digits, &json!({ "code": 3124 })));

    let list = condition("choices", Operator::Contains, Some(json!("b,c")));
    assert!(evaluate(&list, &json!({ "choices": ["a", "b", "c"] })));

    let undefined = condition("missing", Operator::Contains, Some(json!("def")));
    assert!(evaluate(&undefined, &json!({})));

    let not = condition("comment", Operator::NotContains, Some(json!("bias")));
    assert!(evaluate(&not, &json!({ "comment": "neutral" })));
}

#[test]
fn numeric_comparisons_fail_on_nan() {
    let greater = condition("score", Operator::Greater, Some(json!(5)));
    assert!(evaluate(&greater, &json!({ "score": 6 })));
    assert!(evaluate(&greater, &json!({ "score": "10" })));
    assert!(!evaluate(&greater, &json!({ "score": 5 })));
    assert!(!evaluate(&greater, &json!({ "score": "many" })));
    assert!(!evaluate(&greater, &json!({ "score": [1, 2] })));
    assert!(!evaluate(&greater, &json!({})));

    let less = condition("score", Operator::Less, Some(json!("abc")));
    assert!(!evaluate(&less, &json!({ "score": 1 })));
    let less = condition("score", Operator::Less, Some(json!(2)));
    assert!(evaluate(&less, &json!({ "score": null })));
    assert!(!evaluate(&less, &json!({ "score": "N/A" })));
}

#[test]
fn membership_requires_a_list() {
    let role = condition("role", Operator::In, Some(json!(["researcher", "analyst"])));
    assert!(evaluate(&role, &json!({ "role": "analyst" })));
    assert!(!evaluate(&role, &json!({ "role": "participant" })));
    assert!(!evaluate(&role, &json!({})));

    let not_in = condition("role", Operator::NotIn, Some(json!(["researcher"])));
    assert!(evaluate(&not_in, &json!({ "role": "participant" })));
    assert!(!evaluate(&not_in, &json!({ "role": "researcher" })));

    let scalar = condition("role", Operator::NotIn, Some(json!("researcher")));
    assert!(!evaluate(&scalar, &json!({ "role": "participant" })));
    let scalar = condition("role", Operator::In, Some(json!("researcher")));
    assert!(!evaluate(&scalar, &json!({ "role": "researcher" })));
}

#[test]
fn emptiness_follows_truthiness() {
    let empty = condition("notes", Operator::IsEmpty, None);
    for answers in [
        json!({}),
        json!({ "notes": null }),
        json!({ "notes": "" }),
        json!({ "notes": 0 }),
        json!({ "notes": false }),
    ] {
        assert!(evaluate(&empty, &answers), "{answers} should be empty");
    }
    assert!(!evaluate(&empty, &json!({ "notes": "text" })));
    assert!(!evaluate(&empty, &json!({ "notes": [] })));

    let filled = condition("notes", Operator::IsNotEmpty, None);
    assert!(evaluate(&filled, &json!({ "notes": "text" })));
    assert!(!evaluate(&filled, &json!({ "notes": "" })));
}

#[test]
fn unknown_operators_deserialize_and_fail_closed() {
    let parsed: Condition = serde_json::from_value(json!({
        "id": "c1",
        "field": "age",
        "operator": "matches_regex",
        "value": "^1"
    }))
    .expect("deserialize");
    assert_eq!(parsed.operator, Operator::Unsupported);
    assert!(!evaluate(&parsed, &json!({ "age": "12" })));
}

#[test]
fn non_object_answers_read_as_undefined() {
    let empty = condition("notes", Operator::IsEmpty, None);
    assert!(evaluate(&empty, &json!(["notes"])));
    assert!(evaluate(&empty, &Value::Null));
}
