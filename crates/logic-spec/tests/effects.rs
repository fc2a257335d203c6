use serde_json::json;

use logic_spec::{ActionType, PipeRenderer, RuleSet, apply_effects, run};

fn fixture() -> RuleSet {
    RuleSet::from_json(include_str!("fixtures/screening_rules.json")).expect("fixture")
}

fn questions() -> Vec<String> {
    ["age", "status", "employment", "employer", "qsort", "qsort_intro"]
        .iter()
        .map(|id| id.to_string())
        .collect()
}

#[test]
fn show_targets_stay_hidden_until_a_rule_fires() {
    let set = fixture();
    let renderer = PipeRenderer::new();
    let answers = json!({ "age": 70 });
    let outcomes = run(&set.rules, &answers);
    let state = apply_effects(&set.rules, &outcomes, &answers, &questions(), &renderer);

    assert_eq!(state.visibility["employment"], false);
    assert_eq!(state.visibility["age"], true);
    assert!(state.fired.is_empty());

    let answers = json!({ "age": 40 });
    let outcomes = run(&set.rules, &answers);
    let state = apply_effects(&set.rules, &outcomes, &answers, &questions(), &renderer);
    assert_eq!(state.visibility["employment"], true);
    assert_eq!(state.fired, vec!["adult".to_string()]);
}

#[test]
fn fired_rules_skip_require_and_pipe() {
    let set = fixture();
    let renderer = PipeRenderer::new();
    let answers = json!({
        "age": 30,
        "status": "student",
        "consent": true,
        "role": "researcher",
        "name": "Ada & co"
    });
    let outcomes = run(&set.rules, &answers);
    let state = apply_effects(&set.rules, &outcomes, &answers, &questions(), &renderer);

    assert!(state.skipped.contains("employer"));
    assert!(!state.is_visible("employer"));
    assert!(state.required.contains("qsort"));
    assert_eq!(state.piped["qsort_intro"], "Welcome back, Ada & co");
    assert!(!state.end_survey);
}

#[test]
fn disabled_rules_never_apply_effects() {
    let set = fixture();
    let renderer = PipeRenderer::new();
    let answers = json!({ "consent": false });
    let mut outcomes = run(&set.rules, &answers);
    outcomes.insert("no-consent".into(), true);
    let state = apply_effects(&set.rules, &outcomes, &answers, &[], &renderer);
    assert!(!state.end_survey);
}

#[test]
fn later_rules_override_earlier_visibility() {
    let set = RuleSet::from_json(
        r#"[
            { "id": "show", "logic": "AND", "actions": [{ "id": "a", "type": "show", "target": "q" }] },
            { "id": "hide", "logic": "AND", "actions": [{ "id": "a", "type": "hide", "target": "q" }] }
        ]"#,
    )
    .expect("rules");
    let renderer = PipeRenderer::new();
    let outcomes = run(&set.rules, &json!({}));
    let state = apply_effects(&set.rules, &outcomes, &json!({}), &[], &renderer);
    assert_eq!(state.visibility["q"], false);
}

#[test]
fn duplicate_ids_share_the_last_outcome() {
    let set = RuleSet::from_json(
        r#"[
            { "id": "dup", "logic": "AND",
              "conditions": [{ "id": "c1", "field": "a", "operator": "equals", "value": 1 }],
              "actions": [{ "id": "a", "type": "hide", "target": "q1" }] },
            { "id": "dup", "logic": "AND",
              "actions": [{ "id": "a", "type": "hide", "target": "q2" }] }
        ]"#,
    )
    .expect("rules");
    let renderer = PipeRenderer::new();
    let answers = json!({ "a": 2 });
    let outcomes = run(&set.rules, &answers);
    assert_eq!(outcomes["dup"], true);

    let questions = vec!["q1".to_string(), "q2".to_string()];
    let state = apply_effects(&set.rules, &outcomes, &answers, &questions, &renderer);
    assert_eq!(state.visibility["q1"], false);
    assert_eq!(state.visibility["q2"], false);
    assert_eq!(state.fired, vec!["dup", "dup"]);
}

#[test]
fn validate_set_value_and_directives() {
    let set = RuleSet::from_json(
        r#"[
            {
                "id": "checks",
                "logic": "OR",
                "conditions": [{ "id": "c1", "field": "email", "operator": "is_not_empty" }],
                "actions": [
                    { "id": "a1", "type": "validate", "target": "email", "value": "^[^@]+@[^@]+$" },
                    { "id": "a2", "type": "validate", "target": "zip", "value": "^\\d{5}$" },
                    { "id": "a3", "type": "validate", "target": "email", "value": "([" },
                    { "id": "a4", "type": "set_value", "target": "segment", "value": "contact" },
                    { "id": "a5", "type": "randomize", "target": "statements" },
                    { "id": "a6", "type": "calculate", "target": "score", "value": "q1 + q2" },
                    { "id": "a7", "type": "end_survey", "target": "" }
                ]
            }
        ]"#,
    )
    .expect("rules");
    let renderer = PipeRenderer::new();
    let answers = json!({ "email": "not-an-email" });
    let outcomes = run(&set.rules, &answers);
    let state = apply_effects(&set.rules, &outcomes, &answers, &[], &renderer);

    let codes: Vec<&str> = state
        .validation_failures
        .iter()
        .map(|failure| failure.code.as_str())
        .collect();
    assert_eq!(codes, vec!["pattern_mismatch", "invalid_pattern"]);
    assert_eq!(state.values["segment"], json!("contact"));
    assert_eq!(state.directives.len(), 2);
    assert_eq!(state.directives[0].action, ActionType::Randomize);
    assert_eq!(state.directives[1].target, "score");
    assert!(state.end_survey);
}

#[test]
fn broken_pipe_templates_are_dropped() {
    let set = RuleSet::from_json(
        r#"[{ "id": "pipe", "logic": "AND", "actions": [
            { "id": "a", "type": "pipe_value", "target": "intro", "value": "Hi {{#if}}" }
        ] }]"#,
    )
    .expect("rules");
    let renderer = PipeRenderer::new();
    let outcomes = run(&set.rules, &json!({}));
    let state = apply_effects(&set.rules, &outcomes, &json!({}), &[], &renderer);
    assert!(state.piped.is_empty());
    assert_eq!(state.fired, vec!["pipe".to_string()]);
}
