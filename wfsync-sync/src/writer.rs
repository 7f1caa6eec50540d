//! Atomic file writer.
//!
//! 1. Render the content (raw text, or a patched document).
//! 2. Compare with the file on disk → skip if identical.
//! 3. Write to `<path>.wfsync.tmp`.
//! 4. Rename to the final path (atomic on POSIX); remove the tmp on failure.
//!
//! Content is written byte for byte; line endings are not normalised.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use wfsync_patch::Document;

use crate::error::{io_err, SyncError};

/// What to persist.
#[derive(Debug)]
pub enum Content {
    /// Upstream text, written verbatim ("keep" files).
    Raw(String),
    /// A patched document ("modify" files).
    Document(Document),
}

impl Content {
    pub fn render(&self) -> String {
        match self {
            Content::Raw(text) => text.clone(),
            Content::Document(doc) => doc.render(),
        }
    }
}

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped; on-disk content already matches.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

/// Write `content` to `path` unless the file already holds exactly that
/// content.
pub fn write(path: &Path, content: &Content, dry_run: bool) -> Result<WriteResult, SyncError> {
    let tmp = PathBuf::from(format!("{}.wfsync.tmp", path.display()));
    write_with_tmp(path, &content.render(), dry_run, &tmp)
}

fn write_with_tmp(
    path: &Path,
    content: &str,
    dry_run: bool,
    tmp: &Path,
) -> Result<WriteResult, SyncError> {
    match std::fs::read(path) {
        Ok(existing) if existing == content.as_bytes() => {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(io_err(path, err)),
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("written to {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}
