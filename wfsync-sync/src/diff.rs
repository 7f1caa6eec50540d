//! Dry-run unified diff support for `wfsync diff`.

use std::io::ErrorKind;
use std::path::PathBuf;

use similar::TextDiff;

use wfsync_core::{Settings, WorkflowName};

use crate::fetch::Fetcher;
use crate::pipeline::{Plan, Syncer};

/// A single workflow whose synced content differs from the local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub name: WorkflowName,
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Produce what `sync` would write for every keep/modify workflow and compare
/// it to current on-disk content. A missing local file diffs against empty.
///
/// No files are written. Files that cannot be fetched or patched are logged
/// and left out.
pub fn diff_workflows<F: Fetcher>(syncer: &Syncer<F>, settings: &Settings) -> Vec<FileDiff> {
    let workflows = &settings.workflows;
    let plans = workflows
        .keep
        .iter()
        .map(|name| (name, Plan::Keep))
        .chain(workflows.modify.iter().map(|(name, spec)| (name, Plan::Modify(spec))));

    let mut diffs = Vec::new();
    for (name, plan) in plans {
        let Ok(content) = syncer.prepare(name, plan) else {
            continue;
        };
        let rendered = content.render();
        let path = syncer.config().local_path(name);
        let existing = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => {
                tracing::error!("cannot read '{}': {err}", path.display());
                continue;
            }
        };
        if existing == rendered {
            continue;
        }

        let old_header = format!("a/{}", path.display());
        let new_header = format!("b/{}", path.display());
        let unified_diff = TextDiff::from_lines(&existing, &rendered)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();
        diffs.push(FileDiff {
            name: name.clone(),
            path,
            unified_diff,
        });
    }
    diffs
}
