//! CLI tests for `stepflow` permission and validation commands.
//!
//! Spawns the stepflow binary and verifies exit codes and stdout.

use std::process::{Command, Output};

use stepflow::core::types::StepKind;
use stepflow::exit_codes;
use stepflow::test_support::{TestAgent, gated_step, registry_with, step};

fn stepflow(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stepflow"))
        .args(args)
        .output()
        .expect("run stepflow")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn check_bash_denies_pr_merge_in_work_step() {
    let output = stepflow(&["check-bash", "--kind", "work", "gh", "pr", "merge", "12"]);
    assert_eq!(output.status.code(), Some(exit_codes::DENIED));
    assert!(stdout(&output).contains("boundary pattern"));
}

#[test]
fn check_bash_denies_pr_merge_in_closure_step() {
    let output = stepflow(&["check-bash", "--kind", "closure", "gh pr merge 12 --squash"]);
    assert_eq!(output.status.code(), Some(exit_codes::DENIED));
}

#[test]
fn check_bash_allows_read_only_commands() {
    let output = stepflow(&["check-bash", "--kind", "work", "gh", "issue", "view", "7"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&output).trim(), "allowed");
}

#[test]
fn check_tool_follows_step_kind() {
    let denied = stepflow(&["check-tool", "--kind", "verification", "mcp__github__close_issue"]);
    assert_eq!(denied.status.code(), Some(exit_codes::DENIED));
    assert!(stdout(&denied).contains("closure steps"));

    let allowed = stepflow(&["check-tool", "--kind", "closure", "mcp__github__close_issue"]);
    assert_eq!(allowed.status.code(), Some(exit_codes::OK));
}

#[test]
fn tools_filters_boundary_tools_for_work() {
    let output = stepflow(&["tools", "--kind", "work", "Read", "mcp__github__merge_pull_request"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&output).lines().collect::<Vec<_>>(), ["Read"]);
}

#[test]
fn validate_exits_ok_for_consistent_registry() {
    let agent = TestAgent::new("iterator").expect("agent");
    let registry = registry_with(
        "iterator",
        vec![
            gated_step("initial.issue", StepKind::Work, &["next", "repeat"]),
            step("closure.issue", StepKind::Closure),
        ],
    );
    agent.write_registry(&registry).expect("registry");
    agent
        .with_issue_schema(&registry, &["next", "repeat"])
        .expect("schema");

    let root = agent.root().to_str().expect("utf8 path");
    let output = stepflow(&["--root", root, "validate", "--agent", "iterator"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(stdout(&output).contains("ok: agent 'iterator' (2 steps, 0 flows, 1 gated)"));
}

#[test]
fn validate_exits_invalid_on_enum_mismatch() {
    let agent = TestAgent::new("iterator").expect("agent");
    let registry = registry_with(
        "iterator",
        vec![gated_step("initial.issue", StepKind::Work, &["next"])],
    );
    agent.write_registry(&registry).expect("registry");
    agent
        .with_issue_schema(&registry, &["next", "closing"])
        .expect("schema");

    let root = agent.root().to_str().expect("utf8 path");
    let output = stepflow(&["--root", root, "validate", "--agent", "iterator"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("schema has extra [closing]"));
}

#[test]
fn flow_prints_steps_in_order() {
    let agent = TestAgent::new("iterator").expect("agent");
    let mut registry = registry_with(
        "iterator",
        vec![
            step("initial.issue", StepKind::Work),
            step("closure.issue", StepKind::Closure),
        ],
    );
    registry.flows.insert(
        "issue".to_string(),
        vec![
            "initial.issue".to_string(),
            "missing.issue".to_string(),
            "closure.issue".to_string(),
        ],
    );
    agent.write_registry(&registry).expect("registry");

    let root = agent.root().to_str().expect("utf8 path");
    let output = stepflow(&["--root", root, "flow", "--agent", "iterator", "issue"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(
        stdout(&output).lines().collect::<Vec<_>>(),
        ["initial.issue work", "closure.issue closure"]
    );
}
