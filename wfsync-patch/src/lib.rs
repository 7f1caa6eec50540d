//! # wfsync-patch
//!
//! Formatting-preserving overrides for YAML workflow files.
//!
//! ```rust
//! use wfsync_core::{FormatOptions, UpdateEntry};
//!
//! let original = "jobs:\n  build:\n    runs-on: ubuntu-latest # pinned below\n";
//! let updates = vec![UpdateEntry::Inline("jobs.build.runs-on: ubuntu-22.04".into())];
//! let doc = wfsync_patch::apply(original, &updates, &FormatOptions::default()).unwrap();
//! assert_eq!(
//!     doc.render(),
//!     "jobs:\n  build:\n    runs-on: ubuntu-22.04 # pinned below\n"
//! );
//! ```

mod document;
mod emit;
pub mod error;
mod scan;

pub use document::Document;
pub use error::PatchError;

use wfsync_core::{FormatOptions, Override, UpdateEntry};

/// Parse `original` and apply every override of `updates` in order.
///
/// Fails only when `original` cannot be parsed; the caller must not write
/// anything in that case. Malformed entries and overrides that cannot be
/// applied are logged and skipped.
pub fn apply(
    original: &str,
    updates: &[UpdateEntry],
    format: &FormatOptions,
) -> Result<Document, PatchError> {
    let mut doc = Document::parse(original, format.clone())?;
    for entry in updates {
        for ov in entry.overrides() {
            match ov {
                Ok(ov) => set_logged(&mut doc, &ov),
                Err(err) => tracing::warn!("skipping update: {err}"),
            }
        }
    }
    Ok(doc)
}

/// Like [`apply`] for already-parsed overrides.
pub fn apply_overrides(
    original: &str,
    overrides: &[Override],
    format: &FormatOptions,
) -> Result<Document, PatchError> {
    let mut doc = Document::parse(original, format.clone())?;
    for ov in overrides {
        set_logged(&mut doc, ov);
    }
    Ok(doc)
}

fn set_logged(doc: &mut Document, ov: &Override) {
    tracing::info!("updating {ov}");
    if let Err(err) = doc.set(ov) {
        tracing::warn!(path = ov.path(), "skipping update: {err}");
    }
}
