//! End-to-end tests for the docloop binary

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

const BASELINE: &str = "# Solution\n\n## Requirements\n- must support SSO\n";
const EDITED: &str = "# Solution\n\n## Requirements\n- must support SSO\n- must support SCIM\n";

fn docloop(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docloop").unwrap();
    cmd.current_dir(root)
        .env_remove("DOCLOOP_HOME")
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(root.join(".docloop"));
    cmd
}

fn json_data(root: &Path, args: &[&str]) -> Value {
    let output = docloop(root).arg("--json").args(args).output().unwrap();
    assert!(
        output.status.success(),
        "command {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    let response: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["ok"], true);
    assert_eq!(response["schema_version"], 1);
    response["data"].clone()
}

fn write_docs(root: &Path) {
    std::fs::write(root.join("solution.md"), BASELINE).unwrap();
    std::fs::write(root.join("edited.md"), EDITED).unwrap();
}

#[test]
fn init_writes_default_config() {
    let dir = tempdir().unwrap();

    docloop(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized docloop"));

    let config = std::fs::read_to_string(dir.path().join(".docloop/config.toml")).unwrap();
    assert!(config.contains("confidence_threshold = 0.6"));

    docloop(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Already initialized"));
}

#[test]
fn track_and_list_versions() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());

    let tracked = json_data(dir.path(), &["track", "solution.md", "--meta", "program=onboarding"]);
    let version_id = tracked["version_id"].as_str().unwrap().to_string();
    assert!(version_id.starts_with("v_"));

    let versions = json_data(dir.path(), &["versions", "solution.md"]);
    assert_eq!(versions["total"], 1);
    assert_eq!(versions["versions"][0]["version_id"], version_id.as_str());
    assert_eq!(versions["versions"][0]["status"], "original");
    assert_eq!(versions["versions"][0]["metadata"]["program"], "onboarding");

    docloop(dir.path())
        .args(["versions", "solution.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains(version_id.as_str()));
}

#[test]
fn bad_metadata_is_rejected() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());

    docloop(dir.path())
        .args(["track", "solution.md", "--meta", "novalue"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn diff_requires_tracked_baseline() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());

    let output = docloop(dir.path())
        .args(["--json", "diff", "solution.md"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());

    let response: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(response["ok"], false);
    assert_eq!(response["error"]["code"], "not_tracked");
    assert_eq!(response["error"]["exit_code"], 3);
    assert!(response["error"]["hints"][0].as_str().unwrap().contains("docloop track"));
}

#[test]
fn diff_writes_markdown_report() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());
    json_data(dir.path(), &["track", "solution.md"]);
    std::fs::write(dir.path().join("solution.md"), EDITED).unwrap();

    let diff = json_data(dir.path(), &["diff", "solution.md"]);
    assert_eq!(diff["changes"], 1);
    assert_eq!(diff["context_updates"], 1);

    let report_path = diff["report_path"].as_str().unwrap();
    assert!(report_path.ends_with(".md"));
    let report = std::fs::read_to_string(report_path).unwrap();
    assert!(report.contains("+ - must support SCIM"));
    assert!(report.contains("(confidence: 100%)"));
}

#[test]
fn session_life_cycle_applies_feedback() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());

    let started = json_data(
        dir.path(),
        &["session", "start", "solution.md", "--program", "onboarding", "--customer", "Acme"],
    );
    let id = started["session_id"].as_str().unwrap().to_string();

    let processed = json_data(dir.path(), &["session", "process", &id, "edited.md", "--apply"]);
    assert_eq!(processed["iterations"], 1);
    assert_eq!(processed["approval_required"], false);
    assert_eq!(processed["applied"]["entries"][0]["status"], "applied");

    let context = std::fs::read_to_string(dir.path().join("customers/acme/context.yaml")).unwrap();
    assert!(context.contains("must support SCIM"));

    docloop(dir.path())
        .args(["session", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Iteration 1"));

    docloop(dir.path())
        .args(["session", "complete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("after 1 iteration"));

    docloop(dir.path())
        .args(["--json", "session", "process", &id, "edited.md"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("invalid_state"));
}

#[test]
fn one_active_session_per_document() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());
    let args = ["session", "start", "solution.md", "--program", "onboarding", "--customer", "Acme"];

    let first = json_data(dir.path(), &args);
    docloop(dir.path())
        .args(args)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("already active"));

    let id = first["session_id"].as_str().unwrap();
    docloop(dir.path())
        .args(["session", "abandon", id, "--reason", "superseded"])
        .assert()
        .success();
    json_data(dir.path(), &args);
}

#[test]
fn session_list_filters_by_status() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());
    std::fs::write(dir.path().join("other.md"), "## Scope\nx\n").unwrap();

    let done = json_data(
        dir.path(),
        &["session", "start", "solution.md", "--program", "onboarding", "--customer", "Acme"],
    );
    json_data(
        dir.path(),
        &["session", "start", "other.md", "--program", "migration", "--customer", "Globex"],
    );
    json_data(dir.path(), &["session", "complete", done["session_id"].as_str().unwrap()]);

    let all = json_data(dir.path(), &["session", "list"]);
    assert_eq!(all["total"], 2);

    let active = json_data(dir.path(), &["session", "list", "--status", "active"]);
    assert_eq!(active["total"], 1);
    assert_eq!(active["sessions"][0]["customer_name"], "Globex");

    docloop(dir.path())
        .args(["session", "list", "--status", "paused"])
        .assert()
        .code(2);
}

#[test]
fn unknown_session_is_not_found() {
    let dir = tempdir().unwrap();

    docloop(dir.path())
        .args(["session", "show", "session_0_missing"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("docloop: "))
        .stderr(predicate::str::contains("hint: Run 'docloop session list'"));

    docloop(dir.path())
        .args(["--quiet", "session", "show", "session_0_missing"])
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("hint:"));
}
