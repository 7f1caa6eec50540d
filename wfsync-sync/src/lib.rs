//! # wfsync-sync
//!
//! Fetch, patch and write orchestration for workflow files.
//!
//! Build a [`Syncer`] from a [`wfsync_core::SyncConfig`] and a [`Fetcher`]
//! (normally [`HttpFetcher`]) and call [`Syncer::run`] with the loaded
//! settings. Per-file failures are reported in the returned [`SyncReport`],
//! never raised.

pub mod diff;
pub mod drift;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod writer;

pub use diff::{diff_workflows, FileDiff};
pub use drift::{Drift, LocalReport, UniqueLocalStatus};
pub use error::SyncError;
pub use fetch::{FetchOutcome, Fetcher, HttpFetcher};
pub use pipeline::{FileOutcome, FileReport, SyncMode, SyncReport, Syncer};
pub use writer::{Content, WriteResult};
