use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use serde_json::{Value, json};

const RULES: &str = include_str!("../../logic-spec/tests/fixtures/screening_rules.json");

fn workspace(answers: Value) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    dir.child("rules.json").write_str(RULES).expect("rules");
    dir.child("answers.json")
        .write_str(&answers.to_string())
        .expect("answers");
    dir
}

#[test]
fn eval_prints_rule_status() -> Result<(), Box<dyn std::error::Error>> {
    let dir = workspace(json!({ "age": 30, "status": "retired" }));
    let output = Command::cargo_bin("survey-logic")?
        .arg("eval")
        .arg("--rules")
        .arg(dir.path().join("rules.json"))
        .arg("--answers")
        .arg(dir.path().join("answers.json"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output)?;
    assert!(text.contains("Rule set: screening (4 rules)"));
    assert!(text.contains(" - adult (Working-age adult): met"));
    assert!(text.contains(" - no-consent (Declined consent): disabled"));
    Ok(())
}

#[test]
fn eval_json_omits_disabled_rules() -> Result<(), Box<dyn std::error::Error>> {
    let dir = workspace(json!({ "age": "N/A" }));
    let output = Command::cargo_bin("survey-logic")?
        .args(["eval", "--format", "json", "--rules"])
        .arg(dir.path().join("rules.json"))
        .arg("--answers")
        .arg(dir.path().join("answers.json"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let outcomes: Value = serde_json::from_slice(&output)?;
    assert_eq!(outcomes["adult"], false);
    assert!(outcomes.get("no-consent").is_none());
    Ok(())
}

#[test]
fn explain_prints_slots() -> Result<(), Box<dyn std::error::Error>> {
    let dir = workspace(json!({ "consent": true, "years": 8 }));
    let output = Command::cargo_bin("survey-logic")?
        .args(["explain", "--rule", "consented-researcher", "--rules"])
        .arg(dir.path().join("rules.json"))
        .arg("--answers")
        .arg(dir.path().join("answers.json"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output)?;
    assert!(text.contains("C2 role in [answer: undefined] -> false"));
    assert!(text.contains("Outcome: true"));
    Ok(())
}

#[test]
fn check_fails_on_broken_rules() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    dir.child("rules.json").write_str(
        r#"[{ "id": "r1", "logic": "CUSTOM", "customLogic": "C1 XOR C2",
              "conditions": [{ "id": "c1", "field": "a", "operator": "equals", "value": 1 }],
              "actions": [{ "id": "a1", "type": "hide", "target": "q" }] }]"#,
    )?;
    let output = Command::cargo_bin("survey-logic")?
        .arg("check")
        .arg("--rules")
        .arg(dir.path().join("rules.json"))
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output)?;
    assert!(text.contains("Check result: invalid"));
    assert!(text.contains("[custom_logic_syntax] /rules/0/custom_logic"));
    Ok(())
}

#[test]
fn effects_reports_form_state() -> Result<(), Box<dyn std::error::Error>> {
    let dir = workspace(json!({ "age": 40, "status": "student" }));
    let output = Command::cargo_bin("survey-logic")?
        .args(["effects", "--question", "employment", "--rules"])
        .arg(dir.path().join("rules.json"))
        .arg("--answers")
        .arg(dir.path().join("answers.json"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&output)?;
    assert_eq!(parsed["effects"]["visibility"]["employment"], true);
    assert_eq!(parsed["effects"]["skipped"], json!(["employer"]));
    Ok(())
}

#[test]
fn schema_prints_json() -> Result<(), Box<dyn std::error::Error>> {
    let output = Command::cargo_bin("survey-logic")?
        .arg("schema")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let schema: Value = serde_json::from_slice(&output)?;
    assert!(schema.get("properties").is_some());
    Ok(())
}
