//! Subcommands and the options they share.

pub mod check;
pub mod diff;
pub mod sync;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use wfsync_core::{
    config::{
        DEFAULT_BASE_URL, DEFAULT_BRANCH, DEFAULT_TIMEOUT_SECS, DEFAULT_UPSTREAM_REPO,
        DEFAULT_WORKFLOWS_DIR,
    },
    settings::{self, DEFAULT_SETTINGS_FILE},
    Settings, SyncConfig,
};
use wfsync_sync::{Drift, UniqueLocalStatus};

/// Options accepted by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Settings document describing keep/modify/ignore workflows.
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Local workflow directory to write into and scan.
    #[arg(long, global = true, default_value = DEFAULT_WORKFLOWS_DIR)]
    pub workflows_dir: PathBuf,

    /// Upstream repository as `owner/name`.
    #[arg(long, global = true, default_value = DEFAULT_UPSTREAM_REPO)]
    pub upstream: String,

    /// Upstream branch.
    #[arg(long, global = true, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Raw-content host serving upstream files.
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Credential sent as `Authorization: token <value>`.
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl GlobalArgs {
    /// Fail before any network activity when no credential is available.
    pub fn require_token(&self) -> Result<String> {
        match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token.to_owned()),
            _ => bail!(
                "GITHUB_TOKEN environment variable is required \
                 (set it with: export GITHUB_TOKEN=your_token_here)"
            ),
        }
    }

    pub fn config(&self, token: Option<String>, dry_run: bool) -> SyncConfig {
        SyncConfig {
            upstream_repo: self.upstream.clone(),
            branch: self.branch.clone(),
            base_url: self.base_url.clone(),
            workflows_dir: self.workflows_dir.clone(),
            settings_path: self.settings.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            token,
            dry_run,
            ..SyncConfig::default()
        }
    }
}

/// Load the settings document and log what it declares.
pub fn load_settings(config: &SyncConfig) -> Result<Settings> {
    let path = &config.settings_path;
    tracing::info!("loading settings from {}", path.display());
    let settings = settings::load(path)
        .with_context(|| format!("failed to load settings from '{}'", path.display()))?;
    let w = &settings.workflows;
    tracing::info!(
        keep = w.keep.len(),
        modify = w.modify.len(),
        ignore = w.ignore.len(),
        unique_local = w.unique_tier4_workflows.len(),
        "settings loaded"
    );
    Ok(settings)
}

/// Print unique-local presence and drift, shared by `sync` and `check`.
pub fn print_local(unique_local: &[UniqueLocalStatus], drift: &Drift) {
    if !unique_local.is_empty() {
        println!("{}", "Unique local workflows".bold());
        for status in unique_local {
            if status.present {
                println!("  {} {}", "✓".green(), status.name);
            } else {
                println!("  {} {} (missing)", "✗".red(), status.name);
            }
        }
    }

    match drift {
        Drift::NoDirectory => println!("No local workflows directory yet."),
        Drift::Files(files) if files.is_empty() => {
            println!("{} all local workflows are managed by settings", "✓".green())
        }
        Drift::Files(files) => {
            println!(
                "{} {} workflow(s) not mentioned in settings:",
                "!".yellow().bold(),
                files.len()
            );
            for name in files {
                println!("  - {name}");
            }
            println!("Add them to 'ignore' if they should remain local-only.");
        }
    }
}
