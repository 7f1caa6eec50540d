//! `wfsync check`: local-only unique-workflow and drift report.

use anyhow::{Context, Result};
use clap::Args;

use wfsync_sync::drift;

use super::{load_settings, print_local, GlobalArgs};

/// Arguments for `wfsync check`.
#[derive(Args, Debug)]
pub struct CheckArgs {}

impl CheckArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = global.config(None, true);
        let settings = load_settings(&config)?;

        let dir = &config.workflows_dir;
        let report = drift::check_local(dir, &settings.workflows)
            .with_context(|| format!("failed to scan '{}'", dir.display()))?;

        print_local(&report.unique_local, &report.drift);
        Ok(())
    }
}
