//! wfsync core library: settings document, domain types, run configuration.
//!
//! - [`types`]: workflow names, override entries, settings structs
//! - [`settings`]: load the settings document
//! - [`config`]: [`SyncConfig`] and [`FormatOptions`]
//! - [`error`]: [`SettingsError`]

pub mod config;
pub mod error;
pub mod settings;
pub mod types;

pub use config::{FormatOptions, SyncConfig};
pub use error::{OverrideError, SettingsError};
pub use types::{ModifySpec, Override, Settings, UpdateEntry, WorkflowName, WorkflowSettings};
