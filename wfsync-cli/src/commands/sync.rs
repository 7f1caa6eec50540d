//! `wfsync sync`: fetch, patch and write workflow files.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use wfsync_sync::{FileOutcome, FileReport, HttpFetcher, SyncReport, Syncer, WriteResult};

use super::{load_settings, print_local, GlobalArgs};

/// Arguments for `wfsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Show what would be written without touching the filesystem.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let token = global.require_token()?;
        let config = global.config(Some(token), self.dry_run);
        let settings = load_settings(&config)?;

        let fetcher = HttpFetcher::new(&config);
        let report = Syncer::new(config, fetcher).run(&settings);

        print_report(&report, self.dry_run);
        Ok(())
    }
}

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "workflow")]
    name: String,
    #[tabled(rename = "mode")]
    mode: String,
    #[tabled(rename = "result")]
    result: String,
}

fn print_report(report: &SyncReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let failed = report.files.iter().filter(|f| f.outcome.is_failure()).count();
    let handled = report.files.len() - failed;

    if report.files.is_empty() {
        println!("{prefix}nothing to sync");
    } else {
        let rows: Vec<FileRow> = report
            .files
            .iter()
            .map(|file| FileRow {
                name: file.name.to_string(),
                mode: file.mode.to_string(),
                result: outcome_label(file),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");

        let summary = format!("{prefix}{handled} synced, {failed} failed");
        if failed == 0 {
            println!("{} {summary}", "✓".green());
        } else {
            println!("{} {summary}", "!".yellow().bold());
        }
    }

    print_local(&report.unique_local, &report.drift);
}

fn outcome_label(file: &FileReport) -> String {
    match &file.outcome {
        FileOutcome::Write(WriteResult::Written { .. }) => "written".green().to_string(),
        FileOutcome::Write(WriteResult::WouldWrite { .. }) => "would write".cyan().to_string(),
        FileOutcome::Write(WriteResult::Unchanged { .. }) => "unchanged".bright_black().to_string(),
        FileOutcome::NotFound => "not found upstream".yellow().to_string(),
        FileOutcome::FetchFailed { detail } => format!("{} ({detail})", "fetch failed".red()),
        FileOutcome::PatchFailed { detail } => format!("{} ({detail})", "patch failed".red()),
        FileOutcome::WriteFailed { detail } => format!("{} ({detail})", "write failed".red()),
        FileOutcome::Rejected => "rejected name".red().to_string(),
    }
}
