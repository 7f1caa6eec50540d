//! Error types for wfsync-patch.

use thiserror::Error;

/// Errors from parsing a document or applying one override.
///
/// `Empty` and `Parse` mean the document cannot be patched at all; the other
/// variants concern a single override and leave the document untouched.
#[derive(Debug, Error)]
pub enum PatchError {
    /// Input was empty, whitespace, or only comments.
    #[error("empty or invalid YAML content")]
    Empty,

    /// Input is not a single valid YAML document.
    #[error("invalid YAML content: {0}")]
    Parse(#[source] serde_yaml::Error),

    /// An intermediate path segment holds a scalar or sequence.
    #[error("cannot descend into '{path}': value is not a mapping")]
    NotAMapping { path: String },

    /// The value could not be rendered as YAML.
    #[error("cannot render value for '{path}': {source}")]
    Emit {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The edit would have produced unparsable text and was rolled back.
    #[error("update of '{path}' produced invalid YAML: {source}")]
    Invalid {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
