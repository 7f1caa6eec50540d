//! Run configuration passed explicitly into the sync pipeline and the patch
//! engine.

use std::path::PathBuf;
use std::time::Duration;

use crate::settings::DEFAULT_SETTINGS_FILE;
use crate::types::WorkflowName;

/// Default upstream repository (`owner/name`).
pub const DEFAULT_UPSTREAM_REPO: &str = "autowarefoundation/autoware_universe";
/// Default upstream branch.
pub const DEFAULT_BRANCH: &str = "main";
/// Default raw-content host.
pub const DEFAULT_BASE_URL: &str = "https://raw.githubusercontent.com";
/// Default local workflow directory, relative to the working directory.
pub const DEFAULT_WORKFLOWS_DIR: &str = ".github/workflows";
/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Upstream directory that holds workflow files.
const UPSTREAM_WORKFLOWS_PATH: &str = ".github/workflows";

/// Formatting defaults for nodes the patch engine creates.
///
/// Original lines are never re-indented; these only shape new content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Indentation of a nested mapping relative to its key.
    pub mapping_indent: usize,
    /// Column of sequence item content relative to the parent key.
    pub sequence_indent: usize,
    /// Column of the `-` indicator relative to the parent key.
    pub sequence_dash_offset: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            mapping_indent: 2,
            sequence_indent: 4,
            sequence_dash_offset: 2,
        }
    }
}

/// Explicit configuration for one sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Upstream repository, `owner/name`.
    pub upstream_repo: String,
    pub branch: String,
    /// Raw-content host, without trailing slash.
    pub base_url: String,
    /// Local directory written into and scanned for drift.
    pub workflows_dir: PathBuf,
    pub settings_path: PathBuf,
    pub timeout: Duration,
    /// Sent as `Authorization: token <value>` when present.
    pub token: Option<String>,
    pub dry_run: bool,
    pub format: FormatOptions,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            upstream_repo: DEFAULT_UPSTREAM_REPO.to_owned(),
            branch: DEFAULT_BRANCH.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            workflows_dir: PathBuf::from(DEFAULT_WORKFLOWS_DIR),
            settings_path: PathBuf::from(DEFAULT_SETTINGS_FILE),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            token: None,
            dry_run: false,
            format: FormatOptions::default(),
        }
    }
}

impl SyncConfig {
    /// `{base_url}/{repo}/{branch}/.github/workflows/{name}`
    pub fn raw_url(&self, name: &WorkflowName) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.upstream_repo,
            self.branch,
            UPSTREAM_WORKFLOWS_PATH,
            name
        )
    }

    /// Local target path for a workflow file.
    pub fn local_path(&self, name: &WorkflowName) -> PathBuf {
        self.workflows_dir.join(name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_url_is_deterministic() {
        let config = SyncConfig::default();
        assert_eq!(
            config.raw_url(&WorkflowName::from("build.yaml")),
            "https://raw.githubusercontent.com/autowarefoundation/autoware_universe/main/.github/workflows/build.yaml"
        );
    }

    #[test]
    fn raw_url_tolerates_trailing_slash() {
        let config = SyncConfig {
            base_url: "http://127.0.0.1:8080/".to_owned(),
            upstream_repo: "o/r".to_owned(),
            branch: "dev".to_owned(),
            ..SyncConfig::default()
        };
        assert_eq!(
            config.raw_url(&WorkflowName::from("x.yml")),
            "http://127.0.0.1:8080/o/r/dev/.github/workflows/x.yml"
        );
    }
}
