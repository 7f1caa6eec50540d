//! Settings document loader.
//!
//! ```yaml
//! workflows:
//!   keep:
//!     - build.yaml
//!   ignore:
//!     - local-only.yaml
//!   modify:
//!     test.yaml:
//!       updates:
//!         - jobs.test.runs-on: ubuntu-22.04
//!         - "env.CACHE: 'false'"
//!   unique_tier4_workflows:
//!     - deploy.yaml
//! ```
//!
//! Every failure here is fatal for the run; callers propagate the error.

use std::io::ErrorKind;
use std::path::Path;

use serde_yaml::Value;

use crate::error::SettingsError;
use crate::types::Settings;

/// Default settings file name, relative to the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "workflow_sync_setting.yaml";

/// Load and parse the settings document at `path`.
///
/// Returns `SettingsError::NotFound` if absent, `SettingsError::Parse`
/// (with path + line context) if malformed, `SettingsError::Empty` if the
/// document holds no value.
pub fn load(path: &Path) -> Result<Settings, SettingsError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(SettingsError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse(path, &contents)
}

/// Parse settings text; `path` is only used for error context.
pub fn parse(path: &Path, contents: &str) -> Result<Settings, SettingsError> {
    let parse_err = |source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let value: Value = serde_yaml::from_str(contents).map_err(parse_err)?;
    if value.is_null() {
        return Err(SettingsError::Empty {
            path: path.to_path_buf(),
        });
    }
    serde_yaml::from_value(value).map_err(parse_err)
}
