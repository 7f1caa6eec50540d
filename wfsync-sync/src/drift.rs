//! Local-only checks: unique-local presence and drift detection.
//!
//! Neither check touches the network or writes anything.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;

use wfsync_core::{WorkflowName, WorkflowSettings};

use crate::error::{io_err, SyncError};

/// File extensions considered workflow files when scanning.
const WORKFLOW_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Presence of one unique-local workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueLocalStatus {
    pub name: WorkflowName,
    pub present: bool,
}

/// Result of comparing the workflow directory with the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    /// The workflow directory does not exist yet.
    NoDirectory,
    /// Local files not declared in keep, modify or unique-local, sorted.
    /// Empty when everything is accounted for.
    Files(Vec<String>),
}

/// Both local checks together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalReport {
    pub unique_local: Vec<UniqueLocalStatus>,
    pub drift: Drift,
}

/// Report which unique-local workflows exist in `dir`.
pub fn check_unique_local(dir: &Path, names: &[WorkflowName]) -> Vec<UniqueLocalStatus> {
    if names.is_empty() {
        return Vec::new();
    }
    tracing::info!("checking {} unique local workflows", names.len());
    names
        .iter()
        .map(|name| {
            let present = name.is_safe() && dir.join(name.as_str()).is_file();
            if present {
                tracing::info!("found: {name}");
            } else {
                tracing::warn!("missing: {name}");
            }
            UniqueLocalStatus {
                name: name.clone(),
                present,
            }
        })
        .collect()
}

/// Names of `*.yaml` / `*.yml` files directly inside `dir`, or `None` when
/// `dir` does not exist. Hidden files are skipped.
pub fn local_workflows(dir: &Path) -> Result<Option<BTreeSet<String>>, SyncError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(dir, err)),
    };
    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_workflow = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| WORKFLOW_EXTENSIONS.contains(&ext));
        if is_workflow && !name.starts_with('.') {
            names.insert(name);
        }
    }
    Ok(Some(names))
}

/// Local workflow files not accounted for by `settings`.
///
/// `ignore` is not part of the expected set; the report asks
/// the operator to move such files into `ignore`.
pub fn find_drift(dir: &Path, settings: &WorkflowSettings) -> Result<Drift, SyncError> {
    tracing::info!("checking for extra workflows");
    let Some(local) = local_workflows(dir)? else {
        tracing::info!("no local workflows directory found yet");
        return Ok(Drift::NoDirectory);
    };
    let expected = settings.managed_names();
    let extra: Vec<String> = local
        .into_iter()
        .filter(|name| !expected.contains(name.as_str()))
        .collect();

    if extra.is_empty() {
        tracing::info!("no extra workflows found, all local workflows are managed by settings");
    } else {
        tracing::warn!(
            "found {} extra workflows not mentioned in settings:",
            extra.len()
        );
        for name in &extra {
            tracing::warn!("  - {name}");
        }
        tracing::warn!(
            "these workflows are present locally but not in 'keep' or 'modify'; \
             consider adding them to 'ignore' if they should remain local-only"
        );
    }
    Ok(Drift::Files(extra))
}

/// Run both local checks.
pub fn check_local(dir: &Path, settings: &WorkflowSettings) -> Result<LocalReport, SyncError> {
    Ok(LocalReport {
        unique_local: check_unique_local(dir, &settings.unique_tier4_workflows),
        drift: find_drift(dir, settings)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn settings(yaml: &str) -> WorkflowSettings {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn drift_reports_exactly_the_undeclared_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.yaml"), "a: 1\n").unwrap();
        fs::write(dir.path().join("b.yaml"), "b: 1\n").unwrap();
        let drift = find_drift(dir.path(), &settings("keep: [a.yaml]")).unwrap();
        assert_eq!(drift, Drift::Files(vec!["b.yaml".to_owned()]));
    }

    #[test]
    fn drift_considers_both_extensions_and_nothing_else() {
        let dir = TempDir::new().unwrap();
        for name in ["x.yml", "y.yaml", "README.md", ".hidden.yaml"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.yaml")).unwrap();
        let drift = find_drift(dir.path(), &settings("{}")).unwrap();
        assert_eq!(drift, Drift::Files(vec!["x.yml".to_owned(), "y.yaml".to_owned()]));
    }

    #[test]
    fn ignored_files_still_count_as_drift() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("local.yaml"), "").unwrap();
        let drift = find_drift(dir.path(), &settings("ignore: [local.yaml]")).unwrap();
        assert_eq!(drift, Drift::Files(vec!["local.yaml".to_owned()]));
    }

    #[test]
    fn modify_and_unique_local_are_accounted_for() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("m.yaml"), "").unwrap();
        fs::write(dir.path().join("u.yaml"), "").unwrap();
        let drift = find_drift(
            dir.path(),
            &settings("modify: {m.yaml: {updates: []}}\nunique_tier4_workflows: [u.yaml]"),
        )
        .unwrap();
        assert_eq!(drift, Drift::Files(vec![]));
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = TempDir::new().unwrap();
        let drift = find_drift(&dir.path().join("absent"), &settings("{}")).unwrap();
        assert_eq!(drift, Drift::NoDirectory);
    }

    #[test]
    fn unique_local_presence() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("here.yaml"), "").unwrap();
        let statuses = check_unique_local(
            dir.path(),
            &[WorkflowName::from("here.yaml"), WorkflowName::from("gone.yaml")],
        );
        assert!(statuses[0].present);
        assert!(!statuses[1].present);
    }
}
