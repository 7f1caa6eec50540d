//! `wfsync diff`: show unified diffs for what sync would write.

use anyhow::Result;
use clap::Args;

use wfsync_sync::{diff_workflows, HttpFetcher, Syncer};

use super::{load_settings, GlobalArgs};

/// Arguments for `wfsync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {}

impl DiffArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let token = global.require_token()?;
        let config = global.config(Some(token), true);
        let settings = load_settings(&config)?;

        let fetcher = HttpFetcher::new(&config);
        let syncer = Syncer::new(config, fetcher);
        let diffs = diff_workflows(&syncer, &settings);

        if diffs.is_empty() {
            println!("No differences.");
            return Ok(());
        }

        for diff in diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }

        Ok(())
    }
}
