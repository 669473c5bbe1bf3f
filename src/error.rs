//! Failure kinds surfaced by the sync pipeline
//!
//! Each step of [`crate::sync::SyncEngine::sync`] that can halt the run maps to
//! exactly one variant, so callers (and the CLI) can report them distinctly.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`crate::sync::SyncEngine`]
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("not a git repository: {}", path.display())]
    NotARepository { path: PathBuf },

    #[error("failed to list pending changes: {0}")]
    ChangeSetFailed(String),

    #[error("failed to read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "sensitive content detected in {} file(s) ({})",
        files.len(),
        categories.join(", ")
    )]
    SensitiveContentBlocked {
        files: Vec<PathBuf>,
        categories: Vec<String>,
    },

    #[error("failed to stage changes: {0}")]
    StageFailed(String),

    #[error("failed to commit: {0}")]
    CommitFailed(String),

    #[error("push to {remote} rejected: {reason}")]
    PushRejected { remote: String, reason: String },

    #[error("push failed: {0}")]
    PushFailed(String),

    #[error("push timed out after {seconds}s")]
    NetworkTimeout { seconds: u64 },

    #[error("sync cancelled{}", if *committed { " after commit (commit kept locally)" } else { "" })]
    Cancelled { committed: bool },
}

impl SyncError {
    /// Whether re-running the sync (after fetching/rebasing) can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::PushRejected { .. })
    }

    /// Short stable label for this failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::NotARepository { .. } => "not-a-repository",
            SyncError::ChangeSetFailed(_) => "changeset-failed",
            SyncError::ReadFailed { .. } => "read-failed",
            SyncError::SensitiveContentBlocked { .. } => "sensitive-content-blocked",
            SyncError::StageFailed(_) => "stage-failed",
            SyncError::CommitFailed(_) => "commit-failed",
            SyncError::PushRejected { .. } => "push-rejected",
            SyncError::PushFailed(_) => "push-failed",
            SyncError::NetworkTimeout { .. } => "network-timeout",
            SyncError::Cancelled { .. } => "cancelled",
        }
    }
}
