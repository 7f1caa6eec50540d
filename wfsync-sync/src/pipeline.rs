//! Sync orchestration: unique-local check, keep pass, modify pass, drift check.

use std::fmt;

use wfsync_core::{ModifySpec, Settings, SyncConfig, WorkflowName};

use crate::drift::{self, Drift, UniqueLocalStatus};
use crate::fetch::{FetchOutcome, Fetcher};
use crate::writer::{self, Content, WriteResult};

/// Which settings category a file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Keep,
    Modify,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Keep => write!(f, "keep"),
            SyncMode::Modify => write!(f, "modify"),
        }
    }
}

/// Per-file result. Only `Write` means the file was handled end to end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Write(WriteResult),
    /// Upstream answered 404.
    NotFound,
    FetchFailed { detail: String },
    /// Upstream content could not be parsed as YAML.
    PatchFailed { detail: String },
    WriteFailed { detail: String },
    /// The name would escape the workflow directory.
    Rejected,
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(self, FileOutcome::Write(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub name: WorkflowName,
    pub mode: SyncMode,
    pub outcome: FileOutcome,
}

/// Everything a run did, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub unique_local: Vec<UniqueLocalStatus>,
    pub files: Vec<FileReport>,
    pub drift: Drift,
}

/// How a single file is produced from upstream text.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Plan<'a> {
    Keep,
    Modify(&'a ModifySpec),
}

impl Plan<'_> {
    fn mode(&self) -> SyncMode {
        match self {
            Plan::Keep => SyncMode::Keep,
            Plan::Modify(_) => SyncMode::Modify,
        }
    }
}

/// Drives one sync run with an explicit configuration.
pub struct Syncer<F> {
    config: SyncConfig,
    fetcher: F,
}

impl<F: Fetcher> Syncer<F> {
    pub fn new(config: SyncConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run all four passes. Per-file failures are logged and recorded; the
    /// batch always completes.
    pub fn run(&self, settings: &Settings) -> SyncReport {
        let workflows = &settings.workflows;
        let dir = &self.config.workflows_dir;

        if !self.config.dry_run {
            if let Err(err) = std::fs::create_dir_all(dir) {
                tracing::error!("failed to create {}: {err}", dir.display());
            }
        }
        tracing::info!("workflows directory: {}", dir.display());

        let unique_local = drift::check_unique_local(dir, &workflows.unique_tier4_workflows);

        let mut files = Vec::with_capacity(workflows.keep.len() + workflows.modify.len());
        tracing::info!("syncing {} 'keep' workflows", workflows.keep.len());
        for name in &workflows.keep {
            files.push(self.sync_one(name, Plan::Keep));
        }
        tracing::info!("syncing {} 'modify' workflows", workflows.modify.len());
        for (name, spec) in &workflows.modify {
            files.push(self.sync_one(name, Plan::Modify(spec)));
        }

        let drift = drift::find_drift(dir, workflows).unwrap_or_else(|err| {
            tracing::error!("drift check failed: {err}");
            Drift::Files(Vec::new())
        });

        SyncReport {
            unique_local,
            files,
            drift,
        }
    }

    fn sync_one(&self, name: &WorkflowName, plan: Plan<'_>) -> FileReport {
        tracing::info!("syncing ({}): {name}", plan.mode());
        let outcome = match self.prepare(name, plan) {
            Ok(content) => {
                let path = self.config.local_path(name);
                match writer::write(&path, &content, self.config.dry_run) {
                    Ok(result) => FileOutcome::Write(result),
                    Err(err) => {
                        tracing::error!("failed to write '{}': {err}", path.display());
                        FileOutcome::WriteFailed {
                            detail: err.to_string(),
                        }
                    }
                }
            }
            Err(outcome) => outcome,
        };
        FileReport {
            name: name.clone(),
            mode: plan.mode(),
            outcome,
        }
    }

    /// Fetch and, for modify files, patch. The error side is the outcome to
    /// report; it has already been logged.
    pub(crate) fn prepare(&self, name: &WorkflowName, plan: Plan<'_>) -> Result<Content, FileOutcome> {
        if !name.is_safe() {
            tracing::warn!("skipping '{name}': not a plain file name");
            return Err(FileOutcome::Rejected);
        }

        let text = match self.fetcher.fetch(name) {
            FetchOutcome::Fetched(text) => text,
            FetchOutcome::NotFound => {
                tracing::warn!("workflow '{name}' not found in upstream repository");
                return Err(FileOutcome::NotFound);
            }
            FetchOutcome::TransportError { detail } => {
                tracing::error!("failed to download '{name}': {detail}");
                return Err(FileOutcome::FetchFailed { detail });
            }
        };

        match plan {
            Plan::Keep => Ok(Content::Raw(text)),
            Plan::Modify(spec) => {
                tracing::info!("applying {} modifications", spec.updates.len());
                wfsync_patch::apply(&text, &spec.updates, &self.config.format)
                    .map(Content::Document)
                    .map_err(|err| {
                        tracing::error!("cannot patch '{name}': {err}");
                        FileOutcome::PatchFailed {
                            detail: err.to_string(),
                        }
                    })
            }
        }
    }
}
