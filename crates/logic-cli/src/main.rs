use clap::{Parser, Subcommand, ValueEnum};
use logic_spec::{
    RuleOutcomes, RuleReport, RuleSet, RuleTrace, check_rules, display_order, explain_rule,
    rule_set_schema, run,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const LOG_ENV: &str = "SURVEY_LOGIC_LOG";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Survey branching-logic CLI",
    long_about = "Evaluates, explains and checks the branching rules authored in the survey form builder"
)]
struct Cli {
    /// Log rule evaluation details to stderr.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate every enabled rule against a set of answers.
    Eval {
        /// Path to the rule set JSON (object or bare array of rules).
        #[arg(long, value_name = "RULES")]
        rules: PathBuf,
        /// Path to the answers JSON object.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show how each condition of one rule contributed to its outcome.
    Explain {
        #[arg(long, value_name = "RULES")]
        rules: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        /// Identifier of the rule to explain.
        #[arg(long, value_name = "RULE_ID")]
        rule: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Report rule definitions that can never evaluate as intended.
    Check {
        #[arg(long, value_name = "RULES")]
        rules: PathBuf,
        /// Question id defined by the form; repeat to enable reference checks.
        #[arg(long = "question", value_name = "ID")]
        questions: Vec<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Apply the actions of fired rules and print the resulting form state.
    Effects {
        #[arg(long, value_name = "RULES")]
        rules: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        /// Question id defined by the form; seeds the visibility map.
        #[arg(long = "question", value_name = "ID")]
        questions: Vec<String>,
    },
    /// Print the JSON schema of a rule set document.
    Schema,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Eval {
            rules,
            answers,
            format,
        } => run_eval(&rules, &answers, format),
        Command::Explain {
            rules,
            answers,
            rule,
            format,
        } => run_explain(&rules, &answers, &rule, format),
        Command::Check {
            rules,
            questions,
            format,
        } => run_check(&rules, questions, format),
        Command::Effects {
            rules,
            answers,
            questions,
        } => run_effects(&rules, &answers, questions),
        Command::Schema => print_json(&rule_set_schema()),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_rules(path: &Path) -> CliResult<RuleSet> {
    let contents = fs::read_to_string(path)?;
    let rule_set = RuleSet::from_json(&contents)?;
    debug!(rule_set = %rule_set.id, rules = rule_set.rules.len(), "loaded rule set");
    Ok(rule_set)
}

fn load_answers(path: &Path) -> CliResult<Value> {
    let contents = fs::read_to_string(path)?;
    let answers: Value = serde_json::from_str(&contents)?;
    if !answers.is_object() {
        return Err("answers must be a JSON object".into());
    }
    Ok(answers)
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_eval(rules_path: &Path, answers_path: &Path, format: OutputFormat) -> CliResult<()> {
    let rule_set = load_rules(rules_path)?;
    let answers = load_answers(answers_path)?;
    let outcomes = run(&rule_set.rules, &answers);

    match format {
        OutputFormat::Json => print_json(&outcomes),
        OutputFormat::Text => {
            println!("{}", describe_outcomes(&rule_set, &outcomes));
            Ok(())
        }
    }
}

fn describe_outcomes(rule_set: &RuleSet, outcomes: &RuleOutcomes) -> String {
    let mut lines = vec![format!(
        "Rule set: {} ({} rules)",
        rule_set.id,
        rule_set.rules.len()
    )];
    for rule in display_order(&rule_set.rules) {
        let status = match outcomes.get(&rule.id) {
            Some(true) => "met",
            Some(false) => "not met",
            None => "disabled",
        };
        let name = if rule.name.is_empty() {
            rule.id.as_str()
        } else {
            rule.name.as_str()
        };
        lines.push(format!(" - {} ({}): {}", rule.id, name, status));
    }
    lines.join("\n")
}

fn run_explain(
    rules_path: &Path,
    answers_path: &Path,
    rule_id: &str,
    format: OutputFormat,
) -> CliResult<()> {
    let rule_set = load_rules(rules_path)?;
    let answers = load_answers(answers_path)?;
    let rule = rule_set
        .rule(rule_id)
        .ok_or_else(|| format!("rule '{}' is not defined", rule_id))?;
    let trace = explain_rule(rule, &answers);

    match format {
        OutputFormat::Json => print_json(&trace),
        OutputFormat::Text => {
            println!("{}", describe_trace(&trace));
            Ok(())
        }
    }
}

fn describe_trace(trace: &RuleTrace) -> String {
    let mut lines = vec![format!("Rule: {} ({:?})", trace.rule_id, trace.logic)];
    if !trace.enabled {
        lines.push("  (disabled; skipped by the runner)".to_string());
    }
    for condition in &trace.conditions {
        let answer = condition
            .answer
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_else(|| "undefined".to_string());
        lines.push(format!(
            "  {} {} {} [answer: {}] -> {}",
            condition.slot,
            condition.field,
            condition.operator.as_str(),
            answer,
            condition.result
        ));
    }
    lines.push(format!("Outcome: {}", trace.outcome));
    if let Some(error) = &trace.error {
        lines.push(format!("Error: {}", error));
    }
    lines.join("\n")
}

fn run_check(rules_path: &Path, questions: Vec<String>, format: OutputFormat) -> CliResult<()> {
    let rule_set = load_rules(rules_path)?;
    let known: BTreeSet<String> = questions.into_iter().collect();
    let report = check_rules(&rule_set, (!known.is_empty()).then_some(&known));

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!(
                "Check result: {}",
                if report.valid { "valid" } else { "invalid" }
            );
            describe_report(&report);
        }
    }

    if report.valid {
        Ok(())
    } else {
        Err(format!("rule set has {} error(s)", report.errors.len()).into())
    }
}

fn describe_report(report: &RuleReport) {
    for (label, issues) in [("Errors", &report.errors), ("Warnings", &report.warnings)] {
        if issues.is_empty() {
            continue;
        }
        println!("{}:", label);
        for issue in issues {
            println!("  [{}] {} - {}", issue.code, issue.path, issue.message);
        }
    }
}

fn run_effects(rules_path: &Path, answers_path: &Path, questions: Vec<String>) -> CliResult<()> {
    let rules_json = fs::read_to_string(rules_path)?;
    let rule_set = RuleSet::from_json(&rules_json)?;
    let answers = load_answers(answers_path)?;
    let config = json!({ "rules_json": rules_json });
    let ctx = json!({ "questions": questions });

    let response = component_logic::apply(
        &rule_set.id,
        &config.to_string(),
        &ctx.to_string(),
        &answers.to_string(),
    );
    let parsed: Value = serde_json::from_str(&response)?;
    if let Some(error) = parsed.get("error").and_then(Value::as_str) {
        return Err(error.into());
    }
    print_json(&parsed)
}
