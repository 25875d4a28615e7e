//! End-to-end feedback loop over the filesystem backend and YAML stores.

use std::sync::Arc;

use libdocloop_core::apply::FileWriterProvider;
use libdocloop_core::report::render_session_summary;
use libdocloop_core::{
    Config, FsBackend, Metadata, ProcessOptions, SessionManager, SessionStatus, VersionStatus,
};
use tempfile::tempdir;

const SOLUTION: &str = "# Solution Design\n\n## Requirements\n- must support SSO\n\n## Workflows\nRequired: kickoff call\n";

#[test]
fn feedback_updates_customer_context() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let doc = root.join("solution.md");
    let edited = root.join("solution.edited.md");
    std::fs::write(&doc, SOLUTION).unwrap();
    std::fs::write(
        &edited,
        SOLUTION.replace("- must support SSO\n", "- must support SSO\n- must support SCIM\n"),
    )
    .unwrap();

    let config = Config::default();
    let backend = Arc::new(FsBackend::open(&root.join(".docloop")).unwrap());
    let mgr = SessionManager::new(backend, config.clone())
        .with_writers(Box::new(FileWriterProvider::new(root, config.stores.clone())));

    let id = mgr.start(&doc, "Onboarding", "Acme Corp").unwrap();
    let outcome = mgr
        .process(&id, &edited, ProcessOptions { auto_apply: true, regenerate: false })
        .unwrap();
    assert_eq!(outcome.applied.as_ref().map(|a| a.applied()), Some(1));

    let context = std::fs::read_to_string(root.join("customers/acme-corp/context.yaml")).unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&context).unwrap();
    let requirements: Vec<&str> = value["requirements"]
        .as_sequence()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(requirements, vec!["must support SCIM"]);

    let session = mgr.complete(&id).unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.iterations, 1);

    let summary = render_session_summary(&session);
    assert!(summary.contains("## Iteration 1"));
    assert!(summary.contains("context / Requirements (100%)"));
}

#[test]
fn workflow_edits_reach_program_config() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let doc = root.join("solution.md");
    let edited = root.join("edited.md");
    std::fs::write(&doc, SOLUTION).unwrap();
    std::fs::write(
        &edited,
        format!("{}Optional: executive review\n", SOLUTION),
    )
    .unwrap();

    let config = Config::default();
    let backend = Arc::new(FsBackend::open(&root.join(".docloop")).unwrap());
    let mgr = SessionManager::new(backend, config.clone())
        .with_writers(Box::new(FileWriterProvider::new(root, config.stores.clone())));

    let id = mgr.start(&doc, "onboarding", "Acme").unwrap();
    let outcome = mgr
        .process(&id, &edited, ProcessOptions { auto_apply: true, regenerate: false })
        .unwrap();
    assert!(!outcome.report.suggestions.program_updates.is_empty());

    let program = std::fs::read_to_string(root.join("programs/onboarding.yaml")).unwrap();
    assert!(program.contains("executive review"));
}

#[test]
fn retracking_supersedes_the_previous_baseline() {
    let dir = tempdir().unwrap();
    let doc = dir.path().join("solution.md");
    std::fs::write(&doc, "v1").unwrap();

    let backend = Arc::new(FsBackend::open(&dir.path().join(".docloop")).unwrap());
    let mgr = SessionManager::new(backend, Config::default());
    let first = mgr.track(&doc, Metadata::new()).unwrap();
    std::fs::write(&doc, "v2").unwrap();
    let second = mgr.track(&doc, Metadata::new()).unwrap();

    let history = mgr.versions().history(&doc).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].version_id, first);
    assert_eq!(history[0].status, VersionStatus::Superseded);
    assert_eq!(history[1].version_id, second);
    assert_eq!(history[1].status, VersionStatus::Original);
}
