//! Sync Engine - guards and persists pending changes
//!
//! The pipeline is strictly sequential: locate repository, snapshot changes,
//! scan, stage, commit, push. A failure at any step halts the run with the
//! matching [`SyncError`]; nothing is rolled back, since staging and commit
//! are themselves atomic in git.
//!
//! There is no locking. Two syncs running against the same working tree at
//! once can race each other.

use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::changes::ChangeSet;
use crate::error::SyncError;
use crate::git::{PushOutcome, Vcs};
use crate::message;
use crate::scanner::{ScanResult, Scanner};
use crate::Config;

/// Per-invocation options for [`SyncEngine::sync`]
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Commit message; generated from the change set when absent
    pub message: Option<String>,
    /// Proceed even when block-severity content is found
    pub force: bool,
    /// Scan and describe, but do not stage, commit or push
    pub dry_run: bool,
    /// Restrict the sync to this path (relative to the repository root)
    pub only: Option<PathBuf>,
}

/// Outcome of a sync run
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub committed: bool,
    pub pushed: bool,
    /// Final message including trailer (empty when nothing was pending)
    pub commit_message: String,
    pub commit_id: Option<String>,
    /// `remote/branch@sha` after a successful push
    pub remote_ref: Option<String>,
    pub changes: ChangeSet,
    /// Scanner diagnostics for every changed file that had content
    pub scans: Vec<ScanResult>,
    pub dry_run: bool,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    fn empty(changes: ChangeSet, dry_run: bool) -> Self {
        Self {
            committed: false,
            pushed: false,
            commit_message: String::new(),
            commit_id: None,
            remote_ref: None,
            changes,
            scans: Vec::new(),
            dry_run,
            finished_at: Utc::now(),
        }
    }

    /// Scan results that carry at least one finding
    pub fn flagged(&self) -> impl Iterator<Item = &ScanResult> {
        self.scans.iter().filter(|s| !s.is_clean())
    }
}

/// The orchestrator tying the scanner to a version-control backend
pub struct SyncEngine<V: Vcs> {
    vcs: V,
    scanner: Scanner,
    remote: String,
    branch: Option<String>,
    trailer: String,
    push_timeout: Duration,
    cancelled: Arc<AtomicBool>,
}

impl<V: Vcs> SyncEngine<V> {
    /// Create an engine from configuration; fails if a configured rule is invalid
    pub fn new(config: &Config, vcs: V) -> anyhow::Result<Self> {
        let scanner = Scanner::from_config(&config.scanner)?;

        Ok(Self {
            vcs,
            scanner,
            remote: config.remote.clone(),
            branch: config.branch.clone(),
            trailer: config.sync.trailer.clone(),
            push_timeout: Duration::from_secs(config.sync.push_timeout),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Override the push timeout
    pub fn with_push_timeout(mut self, push_timeout: Duration) -> Self {
        self.push_timeout = push_timeout;
        self
    }

    /// Flag checked before staging and before pushing; set it to cancel
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// List pending changes without touching the repository
    pub async fn preview(
        &self,
        working_dir: &Path,
        only: Option<&Path>,
    ) -> Result<ChangeSet, SyncError> {
        let root = self.resolve_root(working_dir).await?;
        self.collect_changes(&root, only).await
    }

    /// Scan, commit and push pending changes
    pub async fn sync(
        &self,
        working_dir: &Path,
        options: SyncOptions,
    ) -> Result<SyncReport, SyncError> {
        let root = self.resolve_root(working_dir).await?;
        let only = options.only.as_deref();

        let changes = self.collect_changes(&root, only).await?;
        if changes.is_empty() {
            info!("No pending changes in {}", root.display());
            return Ok(SyncReport::empty(changes, options.dry_run));
        }
        info!("{} pending change(s) in {}", changes.len(), root.display());

        let scans = self.scan_changes(&root, &changes)?;
        self.enforce_block(&scans, options.force)?;

        let commit_message = match &options.message {
            Some(msg) => message::with_trailer(msg, &self.trailer),
            None => message::with_trailer(&message::generate(&changes), &self.trailer),
        };

        let mut report = SyncReport {
            commit_message,
            scans,
            ..SyncReport::empty(changes, options.dry_run)
        };

        if options.dry_run {
            info!("Dry run: skipping stage, commit and push");
            report.finished_at = Utc::now();
            return Ok(report);
        }

        self.check_cancelled(false)?;

        self.vcs
            .stage(&root, only)
            .await
            .map_err(|e| SyncError::StageFailed(format!("{:#}", e)))?;

        let commit_id = self
            .vcs
            .commit(&root, &report.commit_message, only)
            .await
            .map_err(|e| SyncError::CommitFailed(format!("{:#}", e)))?;
        report.committed = true;
        report.commit_id = Some(commit_id);

        self.check_cancelled(true)?;

        report.remote_ref = Some(self.push(&root).await?);
        report.pushed = true;
        report.finished_at = Utc::now();

        Ok(report)
    }

    async fn resolve_root(&self, working_dir: &Path) -> Result<PathBuf, SyncError> {
        let not_a_repo = || SyncError::NotARepository {
            path: working_dir.to_path_buf(),
        };

        match self.vcs.toplevel(working_dir).await {
            Ok(Some(root)) => Ok(root),
            Ok(None) => Err(not_a_repo()),
            Err(e) => {
                warn!("Repository check failed for {}: {:#}", working_dir.display(), e);
                Err(not_a_repo())
            }
        }
    }

    async fn collect_changes(
        &self,
        root: &Path,
        only: Option<&Path>,
    ) -> Result<ChangeSet, SyncError> {
        self.vcs
            .changed_paths(root, only)
            .await
            .map_err(|e| SyncError::ChangeSetFailed(format!("{:#}", e)))
    }

    fn scan_changes(&self, root: &Path, changes: &ChangeSet) -> Result<Vec<ScanResult>, SyncError> {
        let mut scans = Vec::new();

        for change in changes.iter().filter(|c| c.has_content()) {
            let full_path = root.join(&change.path);

            if full_path.is_dir() {
                debug!("Skipping directory entry {}", change.path.display());
                continue;
            }

            // `add --all` stages whatever is on disk, so an unreadable path fails the run
            let content = match std::fs::read(&full_path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(source) => {
                    if source.kind() == ErrorKind::NotFound {
                        warn!("{} vanished before scanning", change.path.display());
                    }
                    return Err(SyncError::ReadFailed {
                        path: change.path.clone(),
                        source,
                    });
                }
            };

            let result = self.scanner.scan(&change.path, &content);
            for finding in &result.findings {
                debug!(
                    "{}: {} [{}]",
                    change.path.display(),
                    finding.category,
                    finding.severity.as_str()
                );
            }
            scans.push(result);
        }

        Ok(scans)
    }

    fn enforce_block(&self, scans: &[ScanResult], force: bool) -> Result<(), SyncError> {
        let blocked: Vec<&ScanResult> = scans.iter().filter(|s| s.is_blocked()).collect();
        if blocked.is_empty() {
            return Ok(());
        }

        let mut categories: Vec<String> = Vec::new();
        for scan in &blocked {
            for category in scan.blocking_categories() {
                if !categories.iter().any(|c| c == category) {
                    categories.push(category.to_string());
                }
            }
        }

        if force {
            warn!(
                "Force enabled: committing {} file(s) with sensitive content ({})",
                blocked.len(),
                categories.join(", ")
            );
            return Ok(());
        }

        Err(SyncError::SensitiveContentBlocked {
            files: blocked.iter().map(|s| s.path.clone()).collect(),
            categories,
        })
    }

    fn check_cancelled(&self, committed: bool) -> Result<(), SyncError> {
        if self.cancelled.load(Ordering::SeqCst) {
            warn!("Sync cancelled");
            return Err(SyncError::Cancelled { committed });
        }
        Ok(())
    }

    async fn push(&self, root: &Path) -> Result<String, SyncError> {
        info!("Pushing to {}", self.remote);

        let push = self.vcs.push(root, &self.remote, self.branch.as_deref());
        match timeout(self.push_timeout, push).await {
            Ok(Ok(PushOutcome::Pushed { reference })) => Ok(reference),
            Ok(Ok(PushOutcome::Rejected { reason })) => {
                warn!("Push to {} rejected: {}", self.remote, reason);
                Err(SyncError::PushRejected {
                    remote: self.remote.clone(),
                    reason,
                })
            }
            Ok(Err(e)) => Err(SyncError::PushFailed(format!("{:#}", e))),
            Err(_) => {
                warn!(
                    "Push timed out after {}s",
                    self.push_timeout.as_secs_f64()
                );
                Err(SyncError::NetworkTimeout {
                    seconds: self.push_timeout.as_secs(),
                })
            }
        }
    }
}
