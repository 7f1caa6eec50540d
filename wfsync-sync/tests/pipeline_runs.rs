//! End-to-end pipeline runs against an in-memory upstream.

use std::collections::HashMap;
use std::fs;

use rstest::rstest;
use tempfile::TempDir;
use wfsync_core::{Settings, SyncConfig, WorkflowName};
use wfsync_sync::{Drift, FetchOutcome, FileOutcome, SyncMode, Syncer, WriteResult};

const SETTINGS: &str = r#"
workflows:
  keep:
    - keep.yaml
  modify:
    first.yaml:
      updates:
        - jobs.build.runs-on: ubuntu-22.04
    broken.yaml:
      updates:
        - jobs.build.runs-on: ubuntu-22.04
    last.yaml:
      updates:
        - "jobs.build.runs-on: ${{ matrix.runner }}"
        - not a valid update
  unique_tier4_workflows:
    - local-deploy.yaml
"#;

const UPSTREAM_JOB: &str = "# upstream\njobs:\n  build:\n    runs-on: self-hosted # pinned\n";

fn upstream(broken: FetchOutcome) -> HashMap<WorkflowName, FetchOutcome> {
    HashMap::from([
        (WorkflowName::from("keep.yaml"), FetchOutcome::Fetched("name: keep\n".into())),
        (WorkflowName::from("first.yaml"), FetchOutcome::Fetched(UPSTREAM_JOB.into())),
        (WorkflowName::from("broken.yaml"), broken),
        (WorkflowName::from("last.yaml"), FetchOutcome::Fetched(UPSTREAM_JOB.into())),
    ])
}

fn run(root: &TempDir, broken: FetchOutcome) -> wfsync_sync::SyncReport {
    let settings: Settings = serde_yaml::from_str(SETTINGS).unwrap();
    let config = SyncConfig {
        workflows_dir: root.path().join("workflows"),
        ..SyncConfig::default()
    };
    Syncer::new(config, upstream(broken)).run(&settings)
}

#[rstest]
#[case::not_found(FetchOutcome::NotFound)]
#[case::transport(FetchOutcome::TransportError { detail: "500 boom".into() })]
#[case::unparsable(FetchOutcome::Fetched("jobs: [\n".into()))]
fn failed_entry_does_not_stop_later_entries(#[case] broken: FetchOutcome) {
    let root = TempDir::new().unwrap();
    let report = run(&root, broken);
    let dir = root.path().join("workflows");

    let names: Vec<&str> = report.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["keep.yaml", "first.yaml", "broken.yaml", "last.yaml"]);
    assert_eq!(report.files[0].mode, SyncMode::Keep);
    assert_eq!(report.files[3].mode, SyncMode::Modify);

    assert!(report.files[2].outcome.is_failure());
    assert!(!dir.join("broken.yaml").exists());

    assert_eq!(
        fs::read_to_string(dir.join("first.yaml")).unwrap(),
        "# upstream\njobs:\n  build:\n    runs-on: ubuntu-22.04 # pinned\n"
    );
    assert_eq!(
        fs::read_to_string(dir.join("last.yaml")).unwrap(),
        "# upstream\njobs:\n  build:\n    runs-on: ${{ matrix.runner }} # pinned\n"
    );
    assert_eq!(fs::read_to_string(dir.join("keep.yaml")).unwrap(), "name: keep\n");
}

#[test]
fn second_run_reports_unchanged() {
    let root = TempDir::new().unwrap();
    run(&root, FetchOutcome::NotFound);
    let report = run(&root, FetchOutcome::NotFound);
    assert!(report
        .files
        .iter()
        .filter(|f| !f.outcome.is_failure())
        .all(|f| matches!(f.outcome, FileOutcome::Write(WriteResult::Unchanged { .. }))));
}

#[test]
fn unique_local_and_drift_are_reported() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("workflows");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("stray.yml"), "name: stray\n").unwrap();

    let report = run(&root, FetchOutcome::NotFound);

    assert_eq!(report.unique_local.len(), 1);
    assert!(!report.unique_local[0].present);
    assert_eq!(report.drift, Drift::Files(vec!["stray.yml".to_owned()]));
}
