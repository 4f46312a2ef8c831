#![allow(deprecated)]
//! Integration tests for the rlspad CLI

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn rlspad() -> Command {
    Command::cargo_bin("rlspad").expect("binary not found")
}

const OWNER_SCRIPT: &str = "\
return policy('docs owner access')
  .on('docs')
  .for('all')
  .using(col('owner_id').eq(auth.uid()))
  .toSQL();";

// ============================================================================
// Help and Basic CLI Tests
// ============================================================================

#[test]
fn test_help_output() {
    rlspad()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("row security policies"))
        .stdout(predicate::str::contains("--eval"))
        .stdout(predicate::str::contains("--example"))
        .stdout(predicate::str::contains("--list-examples"))
        .stdout(predicate::str::contains("--show-example"))
        .stdout(predicate::str::contains("--check"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_version_output() {
    rlspad()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rlspad"));
}

// ============================================================================
// One-Shot Execution
// ============================================================================

#[test]
fn test_eval_prints_sql_on_stdout() {
    rlspad()
        .arg("--eval")
        .arg(OWNER_SCRIPT)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "create policy \"docs owner access\" on docs",
        ))
        .stdout(predicate::str::contains("using (owner_id = auth.uid())"));
}

#[test]
fn test_eval_contract_violation_reports_on_stderr() {
    rlspad()
        .arg("--eval")
        .arg("return 42;")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Code must return a string (use policy.toSQL())",
        ))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_eval_thrown_value_becomes_the_error() {
    rlspad()
        .arg("--eval")
        .arg("throw 'kaboom';")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("kaboom"));
}

#[test]
fn test_script_file_positional_argument() {
    let temp_dir = TempDir::new().unwrap();
    let script_path = temp_dir.path().join("owner.rls");
    fs::write(&script_path, OWNER_SCRIPT).unwrap();

    rlspad()
        .arg(&script_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("create policy"));
}

#[test]
fn test_missing_script_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let script_path = temp_dir.path().join("absent.rls");

    rlspad()
        .arg(&script_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn test_piped_stdin_is_executed() {
    rlspad()
        .write_stdin(OWNER_SCRIPT)
        .assert()
        .success()
        .stdout(predicate::str::contains("create policy"));
}

#[test]
fn test_eval_takes_precedence_over_piped_stdin() {
    rlspad()
        .arg("--eval")
        .arg(OWNER_SCRIPT)
        .write_stdin("this is not a script")
        .assert()
        .success()
        .stdout(predicate::str::contains("create policy"));
}

// ============================================================================
// JSON Output
// ============================================================================

#[test]
fn test_json_success_payload() {
    let output = rlspad()
        .arg("--json")
        .arg("--eval")
        .arg(OWNER_SCRIPT)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&output).expect("run should emit JSON");
    assert_eq!(json["status"], "success");
    let sql = json["sql"].as_str().expect("sql should be a string");
    assert!(sql.starts_with("create policy"));
    assert!(sql.ends_with(';'));
}

#[test]
fn test_json_failure_payload_keeps_exit_code() {
    let output = rlspad()
        .arg("--json")
        .arg("--eval")
        .arg("return 42;")
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&output).expect("run should emit JSON");
    assert_eq!(json["status"], "failure");
    assert_eq!(
        json["message"],
        "Code must return a string (use policy.toSQL())"
    );
}

// ============================================================================
// Bundled Examples
// ============================================================================

#[test]
fn test_list_examples_is_plain_when_piped() {
    rlspad()
        .arg("--list-examples")
        .assert()
        .success()
        .stdout(predicate::str::contains("owner-only\tOwner-only access"))
        .stdout(predicate::str::contains("tenant-isolation"))
        .stdout(predicate::str::contains("template-quickstart"));
}

#[test]
fn test_example_flag_runs_bundled_code() {
    rlspad()
        .arg("--example")
        .arg("membership-subquery")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "team_id in (select team_id from team_members where user_id = auth.uid())",
        ));
}

#[test]
fn test_unknown_example_name_is_an_error() {
    rlspad()
        .arg("--example")
        .arg("nope")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no example named"));
}

#[test]
fn test_show_example_pipes_raw_code() {
    rlspad()
        .arg("--show-example")
        .arg("owner-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("return policy('docs owner access')"))
        .stdout(predicate::str::contains(".toSQL();"));
}

#[test]
fn test_shown_example_runs_back_through_stdin() {
    let shown = rlspad()
        .arg("--show-example")
        .arg("insert-check")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    rlspad()
        .write_stdin(shown)
        .assert()
        .success()
        .stdout(predicate::str::contains("with check"));
}

#[test]
fn test_show_unknown_example_is_an_error() {
    rlspad()
        .arg("--show-example")
        .arg("nope")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no example named"));
}

// ============================================================================
// Check Mode
// ============================================================================

#[test]
fn test_check_accepts_scripts_that_parse() {
    rlspad()
        .arg("--check")
        .arg("--eval")
        .arg("return 1;")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_check_rejects_syntax_errors() {
    rlspad()
        .arg("--check")
        .arg("--eval")
        .arg("return 'oops")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("syntax error at line 1"));
}

#[test]
fn test_check_requires_a_source() {
    rlspad()
        .arg("--check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--check needs"));
}

// ============================================================================
// Argument Conflicts and Terminal Guards
// ============================================================================

#[test]
fn test_conflicting_sources_are_a_usage_error() {
    rlspad()
        .arg("--eval")
        .arg("return 'x';")
        .arg("--example")
        .arg("owner-only")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_listing_flags_conflict() {
    rlspad()
        .arg("--list-examples")
        .arg("--show-example")
        .arg("owner-only")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_playground_refuses_without_a_terminal() {
    // No source and stdout piped: the interactive fallback cannot start.
    rlspad()
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs a terminal"));
}
