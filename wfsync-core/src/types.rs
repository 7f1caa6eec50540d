//! Domain types for the workflow sync settings.
//!
//! All types deserialize from the settings YAML via serde + serde_yaml.
//! Sections that are absent or explicitly `null` deserialize to empty
//! collections.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

use crate::error::OverrideError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed workflow file name (e.g. `build.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkflowName(pub String);

impl WorkflowName {
    /// Borrow the raw file name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when the name addresses a file directly inside the workflow
    /// directory: non-empty, not `.` or `..`, no path separators.
    pub fn is_safe(&self) -> bool {
        let name = self.0.as_str();
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\\')
    }
}

impl fmt::Display for WorkflowName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for WorkflowName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkflowName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// One dotted-path override: `jobs.build.runs-on` → `ubuntu-22.04`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    path: String,
    segments: Vec<String>,
    value: String,
}

impl Override {
    /// Build an override, rejecting empty paths and empty segments.
    pub fn new(path: impl Into<String>, value: impl Into<String>) -> Result<Self, OverrideError> {
        let path = path.into();
        let segments: Vec<String> = path.split('.').map(str::to_owned).collect();
        if segments.iter().any(String::is_empty) {
            return Err(OverrideError::InvalidPath(path));
        }
        Ok(Self {
            path,
            segments,
            value: value.into(),
        })
    }

    /// Parse the string form `"path: value"`, splitting on the first colon.
    pub fn parse_inline(entry: &str) -> Result<Self, OverrideError> {
        let (path, value) = entry
            .split_once(':')
            .ok_or_else(|| OverrideError::MissingSeparator(entry.to_owned()))?;
        Self::new(path.trim(), value.trim())
    }

    /// The dotted path as written.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path segments, outermost first. Never empty.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The target value text.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.path, self.value)
    }
}

/// A raw entry of a `modify.<file>.updates` list, in either accepted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdateEntry {
    /// `"jobs.build.runs-on: ubuntu-22.04"`
    Inline(String),
    /// `{ "jobs.build.runs-on": "ubuntu-22.04" }`; every pair is applied in order.
    Pairs(serde_yaml::Mapping),
    /// Anything else; skipped with a warning.
    Other(Value),
}

impl UpdateEntry {
    /// Expand this entry into overrides, one result per path/value pair.
    pub fn overrides(&self) -> Vec<Result<Override, OverrideError>> {
        match self {
            UpdateEntry::Inline(s) => vec![Override::parse_inline(s)],
            UpdateEntry::Pairs(map) => map
                .iter()
                .map(|(key, value)| {
                    let path = scalar_key(key)?;
                    Override::new(path, value_text(value))
                })
                .collect(),
            UpdateEntry::Other(value) => vec![Err(OverrideError::UnsupportedShape(
                value_text(value),
            ))],
        }
    }
}

fn scalar_key(key: &Value) -> Result<String, OverrideError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(OverrideError::InvalidKey(value_text(other))),
    }
}

/// Text form of a settings value. Scalars render as their YAML text;
/// collections render as JSON flow text so they are re-parsed structurally.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => serde_json::to_string(other).unwrap_or_else(|_| {
            serde_yaml::to_string(other)
                .map(|s| s.trim_end().to_owned())
                .unwrap_or_default()
        }),
    }
}

// ---------------------------------------------------------------------------
// Settings document
// ---------------------------------------------------------------------------

/// Overrides declared for one "modify" workflow.
///
/// A bare `file.yaml:` entry (null) is a modify entry with no updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<ModifySpecRepr>")]
pub struct ModifySpec {
    pub updates: Vec<UpdateEntry>,
}

#[derive(Deserialize)]
struct ModifySpecRepr {
    #[serde(default, deserialize_with = "null_as_default")]
    updates: Vec<UpdateEntry>,
}

impl From<Option<ModifySpecRepr>> for ModifySpec {
    fn from(repr: Option<ModifySpecRepr>) -> Self {
        Self {
            updates: repr.map(|r| r.updates).unwrap_or_default(),
        }
    }
}

/// The `workflows` section of the settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// Synced verbatim, in this order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub keep: Vec<WorkflowName>,
    /// Local-only files the operator chose not to manage.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ignore: BTreeSet<WorkflowName>,
    /// Synced with overrides, in declaration order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub modify: IndexMap<WorkflowName, ModifySpec>,
    /// Expected to exist only downstream; presence-checked, never fetched.
    #[serde(default, deserialize_with = "null_as_default")]
    pub unique_tier4_workflows: Vec<WorkflowName>,
}

impl WorkflowSettings {
    /// Every name declared by keep, modify or unique-local.
    pub fn managed_names(&self) -> BTreeSet<&str> {
        self.keep
            .iter()
            .chain(self.modify.keys())
            .chain(self.unique_tier4_workflows.iter())
            .map(WorkflowName::as_str)
            .collect()
    }
}

/// Root of the settings YAML document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, deserialize_with = "null_as_default")]
    pub workflows: WorkflowSettings,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
