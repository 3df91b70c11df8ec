//! Integration tests for the tasktree CLI

use assert_cmd::cargo;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

/// Get a Command for the tasktree binary
fn tasktree() -> Command {
    Command::new(cargo::cargo_bin!("tasktree"))
}

/// A tasktree command bound to a workspace
fn in_workspace(workspace: &Path) -> Command {
    let mut cmd = tasktree();
    cmd.env("NO_COLOR", "1").arg("--workspace").arg(workspace);
    cmd
}

/// Run a command that must succeed and parse its JSON output
fn run_json(workspace: &Path, args: &[&str]) -> Value {
    let output = in_workspace(workspace)
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).unwrap()
}

/// Frontend 1 "Auth" > 1.1 "Login Page" > 1.1.1, 1.1.2
fn seed_login(workspace: &Path) {
    run_json(workspace, &["task", "add-root", "frontend", r#"{"title": "Auth"}"#]);
    run_json(
        workspace,
        &["task", "add-child", "1", r#"{"title": "Login Page", "type": "page"}"#],
    );
    run_json(
        workspace,
        &[
            "task",
            "add-children",
            "1.1",
            r#"[{"title": "Email Field"}, {"title": "Submit Button"}]"#,
        ],
    );
}

#[test]
fn test_help() {
    tasktree()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hierarchical task registry"));
}

#[test]
fn test_version() {
    tasktree()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_ready_help_describes_ready_status_only() {
    tasktree()
        .args(["task", "ready", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ready-status tasks"))
        .stdout(predicate::str::contains("Pending").not());
}

#[test]
fn test_add_root_creates_registry() {
    let temp = TempDir::new().unwrap();

    in_workspace(temp.path())
        .args(["task", "add-root", "frontend", r#"{"title": "Auth"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""task_id": "1""#));

    assert!(temp.path().join(".claude_tasks/task_registry.json").exists());
    assert!(temp.path().join(".claude_tasks/state.json").exists());
}

#[test]
fn test_add_children_and_path() {
    let temp = TempDir::new().unwrap();
    seed_login(temp.path());

    let path = run_json(temp.path(), &["task", "path", "1.1.2"]);
    assert_eq!(path, json!(["1", "1.1", "1.1.2"]));

    let parent = run_json(temp.path(), &["task", "get", "1.1"]);
    assert_eq!(parent["status"], "decomposed");
    assert_eq!(parent["subtasks"][1]["title"], "Submit Button");
}

#[test]
fn test_list_filters() {
    let temp = TempDir::new().unwrap();
    seed_login(temp.path());

    let leaves = run_json(temp.path(), &["task", "list", "--level", "3"]);
    let ids: Vec<&str> = leaves
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["1.1.1", "1.1.2"]);

    let pending = run_json(temp.path(), &["task", "list", "--status", "pending"]);
    assert_eq!(pending.as_array().unwrap().len(), 2);
}

#[test]
fn test_unknown_parent_exits_not_found() {
    let temp = TempDir::new().unwrap();

    in_workspace(temp.path())
        .args(["task", "add-child", "9", r#"{"title": "Orphan"}"#])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Parent task 9 not found"));
}

#[test]
fn test_invalid_payload_exits_invalid_argument() {
    let temp = TempDir::new().unwrap();

    in_workspace(temp.path())
        .args(["task", "add-root", "backend", "{not json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid JSON payload"));
}

#[test]
fn test_malformed_task_id_exits_invalid_argument() {
    let temp = TempDir::new().unwrap();
    seed_login(temp.path());

    in_workspace(temp.path())
        .args(["task", "depend", "1..2", "1.1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not a dot-notation task ID"));

    in_workspace(temp.path())
        .args(["task", "path", "x"])
        .assert()
        .code(2);
}

#[test]
fn test_complete_task_in_backend_forest() {
    let temp = TempDir::new().unwrap();
    run_json(temp.path(), &["task", "add-root", "frontend", r#"{"title": "ui"}"#]);
    run_json(temp.path(), &["task", "add-root", "backend", r#"{"title": "api"}"#]);

    let outcome = run_json(
        temp.path(),
        &["project", "complete-task", "1", "--category", "backend"],
    );
    assert_eq!(outcome["status"], "completed");

    let frontend = run_json(temp.path(), &["task", "get", "1"]);
    assert_eq!(frontend["status"], "pending");
    let backend = run_json(temp.path(), &["task", "get", "1", "--category", "backend"]);
    assert_eq!(backend["status"], "completed");
}

#[test]
fn test_malformed_state_exits_storage() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join(".claude_tasks")).unwrap();
    std::fs::write(temp.path().join(".claude_tasks/state.json"), "{").unwrap();

    in_workspace(temp.path())
        .args(["state", "show"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Malformed document"));
}

#[test]
fn test_phase_status() {
    let temp = TempDir::new().unwrap();

    let phase = run_json(temp.path(), &["state", "phase", "design_phase"]);
    assert_eq!(phase, json!({"phase": "design", "status": "not_started"}));

    run_json(temp.path(), &["state", "init-design", "docs/user_flows.md"]);
    let phase = run_json(temp.path(), &["state", "phase", "design"]);
    assert_eq!(phase["status"], "user_flows_completed");
}

#[test]
fn test_integration_precondition_exit_code() {
    let temp = TempDir::new().unwrap();
    seed_login(temp.path());
    run_json(temp.path(), &["task", "set-status", "1.1.1", "completed"]);

    in_workspace(temp.path())
        .args(["project", "complete-integration", "1.1"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("1.1.2"));

    run_json(temp.path(), &["task", "set-status", "1.1.2", "completed"]);
    let outcome = run_json(temp.path(), &["project", "complete-integration", "1.1"]);
    assert_eq!(outcome["status"], "completed");
    assert_eq!(outcome["level"], 2);
}

#[test]
fn test_dependency_cycle_exit_code() {
    let temp = TempDir::new().unwrap();
    run_json(temp.path(), &["task", "add-root", "backend", r#"{"title": "a"}"#]);
    run_json(temp.path(), &["task", "add-root", "backend", r#"{"title": "b"}"#]);
    run_json(temp.path(), &["task", "depend", "1", "2"]);
    run_json(temp.path(), &["task", "depend", "2", "1"]);

    in_workspace(temp.path())
        .args(["project", "derive-order"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("Dependency cycle"));
}

#[test]
fn test_wave_lifecycle() {
    let temp = TempDir::new().unwrap();
    seed_login(temp.path());
    let waves = json!([
        {"wave": 1, "category": "frontend", "tasks": ["1.1.1", "1.1.2"]},
        {"wave": 2, "category": "frontend", "tasks": ["1.1", "1"]}
    ]);
    run_json(temp.path(), &["task", "set-waves", &waves.to_string()]);

    let development = run_json(temp.path(), &["project", "start-development", "--workers", "2"]);
    assert_eq!(development["total_waves"], 2);
    run_json(temp.path(), &["project", "start-wave", "1"]);
    run_json(temp.path(), &["project", "complete-task", "1.1.1"]);

    in_workspace(temp.path())
        .args(["project", "complete-wave", "1"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("1.1.2"));

    run_json(temp.path(), &["project", "fail-task", "1.1.2", "timeout"]);
    let completion = run_json(temp.path(), &["project", "complete-wave", "1"]);
    assert_eq!(completion["completed"], 1);
    assert_eq!(completion["failed"], 1);
    assert_eq!(completion["next_wave"], 2);

    let resume = run_json(temp.path(), &["project", "resume"]);
    assert_eq!(resume["can_resume"], true);
    assert_eq!(resume["current_wave"], 2);
    assert_eq!(resume["pending_task_ids"], json!(["1.1", "1"]));
}

#[test]
fn test_dashboard_text_and_json() {
    let temp = TempDir::new().unwrap();
    seed_login(temp.path());

    in_workspace(temp.path())
        .args(["project", "dashboard"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PROJECT STATUS DASHBOARD"))
        .stdout(predicate::str::contains("Total: 4"));

    let dashboard = run_json(temp.path(), &["project", "dashboard", "--json"]);
    assert_eq!(dashboard["tasks"]["total_tasks"], 4);
    assert_eq!(dashboard["resume"]["can_resume"], false);
}

#[test]
fn test_integrate_archives_files() {
    let temp = TempDir::new().unwrap();
    run_json(temp.path(), &["task", "add-root", "backend", r#"{"title": "Billing"}"#]);

    let staging = temp.path().join(".claude_tasks/backend_decomposition_temp");
    std::fs::create_dir_all(&staging).unwrap();
    std::fs::write(
        staging.join("001.json"),
        r#"{"parent_task_id": "1", "subtasks": [{"title": "charge"}, {"title": "refund"}]}"#,
    )
    .unwrap();

    let run = run_json(temp.path(), &["project", "integrate", "backend"]);
    assert_eq!(run["total_tasks"], 2);
    assert_eq!(run["files"][0]["task_ids"], json!(["1.1", "1.2"]));

    assert!(!staging.join("001.json").exists());
    assert!(temp
        .path()
        .join(".claude_tasks/backend_decomposition_archive/001.json")
        .exists());

    let refund = run_json(temp.path(), &["task", "get", "1.2", "--category", "backend"]);
    assert_eq!(refund["title"], "refund");
}

#[test]
fn test_import_legacy_refuses_non_empty_registry() {
    let temp = TempDir::new().unwrap();
    let legacy = temp.path().join("legacy.json");
    std::fs::write(
        &legacy,
        r#"{"tasks": {
            "F1": {"title": "Shell", "category": "frontend", "children": ["F2"]},
            "F2": {"title": "Header", "parent_id": "F1"}
        }}"#,
    )
    .unwrap();

    let imported = run_json(
        temp.path(),
        &["task", "import-legacy", legacy.to_str().unwrap()],
    );
    assert_eq!(imported["id_map"]["F2"], "1.1");

    in_workspace(temp.path())
        .args(["task", "import-legacy"])
        .arg(&legacy)
        .assert()
        .code(4);
}
