use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, info};

use crate::changes::ChangeSet;

/// Outcome of a push attempt that reached the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Remote accepted the update; `reference` is `remote/branch@sha`
    Pushed { reference: String },
    /// Remote refused because it has commits we don't (fetch/rebase and retry)
    Rejected { reason: String },
}

/// The version-control operations the sync pipeline consumes
///
/// All paths are repository roots as returned by [`Vcs::toplevel`]; `only`
/// restricts an operation to a pathspec relative to that root.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Repository root containing `dir`, or `None` if it is not a checkout
    async fn toplevel(&self, dir: &Path) -> Result<Option<PathBuf>>;

    /// List changed paths relative to the last commit
    async fn changed_paths(&self, root: &Path, only: Option<&Path>) -> Result<ChangeSet>;

    /// Stage every pending change
    async fn stage(&self, root: &Path, only: Option<&Path>) -> Result<()>;

    /// Commit staged changes, returning the new commit id
    async fn commit(&self, root: &Path, message: &str, only: Option<&Path>) -> Result<String>;

    /// Push the current (or given) branch to `remote`
    async fn push(&self, root: &Path, remote: &str, branch: Option<&str>) -> Result<PushOutcome>;
}

/// [`Vcs`] backed by the `git` binary
#[derive(Debug, Clone, Default)]
pub struct GitClient;

impl GitClient {
    pub fn new() -> Self {
        Self
    }

    async fn git(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        debug!("git {} (in {})", args.join(" "), dir.display());

        AsyncCommand::new("git")
            .args(args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to execute git {}", args.first().unwrap_or(&"")))
    }

    /// Run git and return raw stdout, failing on a non-zero exit
    async fn git_checked_raw(&self, dir: &Path, args: &[&str]) -> Result<Vec<u8>> {
        let output = self.git(dir, args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "git {} failed: {}",
                args.first().unwrap_or(&""),
                stderr.trim()
            ));
        }

        Ok(output.stdout)
    }

    async fn git_checked(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let stdout = self.git_checked_raw(dir, args).await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    /// Current branch name, `None` on a detached HEAD
    pub async fn current_branch(&self, root: &Path) -> Result<Option<String>> {
        let output = self.git(root, &["branch", "--show-current"]).await?;

        if output.status.success() && !output.stdout.is_empty() {
            let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
            Ok(Some(branch))
        } else {
            Ok(None)
        }
    }

    /// URL of a configured remote
    pub async fn remote_url(&self, root: &Path, remote: &str) -> Result<Option<String>> {
        let output = self.git(root, &["remote", "get-url", remote]).await?;

        if output.status.success() {
            let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
            Ok(Some(url))
        } else {
            Ok(None)
        }
    }

    async fn short_head(&self, root: &Path) -> Result<String> {
        Ok(self
            .git_checked(root, &["rev-parse", "--short", "HEAD"])
            .await?
            .trim()
            .to_string())
    }
}

#[async_trait]
impl Vcs for GitClient {
    async fn toplevel(&self, dir: &Path) -> Result<Option<PathBuf>> {
        if !dir.is_dir() {
            return Ok(None);
        }

        let output = self.git(dir, &["rev-parse", "--show-toplevel"]).await?;

        if output.status.success() {
            let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
            Ok(Some(PathBuf::from(root)))
        } else {
            Ok(None)
        }
    }

    async fn changed_paths(&self, root: &Path, only: Option<&Path>) -> Result<ChangeSet> {
        let mut args = vec!["status", "--porcelain=v1", "-z", "--untracked-files=all"];
        let pathspec = only.map(|p| p.to_string_lossy().into_owned());
        if let Some(spec) = &pathspec {
            args.extend(["--", spec.as_str()]);
        }

        let stdout = self
            .git_checked_raw(root, &args)
            .await
            .context("Failed to check git status")?;

        Ok(ChangeSet::from_porcelain(&stdout))
    }

    async fn stage(&self, root: &Path, only: Option<&Path>) -> Result<()> {
        let pathspec = only
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string());

        self.git_checked(root, &["add", "--all", "--", pathspec.as_str()])
            .await
            .context("Failed to stage changes")?;

        Ok(())
    }

    async fn commit(&self, root: &Path, message: &str, only: Option<&Path>) -> Result<String> {
        let mut args = vec!["commit", "--quiet", "-m", message];
        let pathspec = only.map(|p| p.to_string_lossy().into_owned());
        if let Some(spec) = &pathspec {
            args.extend(["--", spec.as_str()]);
        }

        self.git_checked(root, &args)
            .await
            .context("Failed to commit")?;

        let id = self.short_head(root).await?;
        info!("Created commit {} in {}", id, root.display());
        Ok(id)
    }

    async fn push(&self, root: &Path, remote: &str, branch: Option<&str>) -> Result<PushOutcome> {
        let branch = match branch {
            Some(b) => b.to_string(),
            None => self
                .current_branch(root)
                .await?
                .ok_or_else(|| anyhow!("HEAD is detached; configure a branch to push"))?,
        };
        let refspec = format!("HEAD:refs/heads/{}", branch);

        let output = self
            .git(root, &["push", "--porcelain", remote, refspec.as_str()])
            .await
            .context("Failed to push to remote")?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            if is_non_fast_forward(&stdout, &stderr) {
                return Ok(PushOutcome::Rejected {
                    reason: first_meaningful_line(&stderr)
                        .unwrap_or("remote contains commits not present locally")
                        .to_string(),
                });
            }
            return Err(anyhow!("Git push failed: {}", stderr.trim()));
        }

        let head = self.short_head(root).await?;
        let reference = format!("{}/{}@{}", remote, branch, head);
        info!("Pushed {}", reference);
        Ok(PushOutcome::Pushed { reference })
    }
}

/// Recognise git's non-fast-forward rejection in push output
pub fn is_non_fast_forward(stdout: &str, stderr: &str) -> bool {
    let text = format!("{}\n{}", stdout, stderr);
    text.contains("non-fast-forward")
        || text.contains("fetch first")
        || (text.contains("[rejected]") && !text.contains("remote rejected"))
}

fn first_meaningful_line(stderr: &str) -> Option<&str> {
    stderr
        .lines()
        .map(str::trim)
        .find(|l| l.contains("rejected") || l.starts_with("hint:") || l.starts_with("error:"))
}
