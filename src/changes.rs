//! Pending working-tree changes
//!
//! A [`ChangeSet`] is a read-only snapshot of `git status` taken once per run.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// How a path differs from the last commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Renamed => "renamed",
        }
    }
}

/// A single changed path, relative to the repository root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub path: PathBuf,
    pub kind: ChangeKind,
    /// Previous path for renames and copies
    pub from: Option<PathBuf>,
}

impl Change {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            from: None,
        }
    }

    /// Whether the path still has content on disk to scan
    pub fn has_content(&self) -> bool {
        self.kind != ChangeKind::Deleted
    }
}

/// Snapshot of pending changes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new(changes: Vec<Change>) -> Self {
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.changes.iter().map(|c| c.path.as_path())
    }

    /// Count changes of one kind
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }

    /// Parse `git status --porcelain=v1 -z` output
    ///
    /// Entries are `XY <path>` separated by NUL; renames and copies carry the
    /// original path as the following entry. Untracked (`??`) counts as added.
    /// Paths are taken as raw bytes, so names that are not UTF-8 survive.
    pub fn from_porcelain(output: &[u8]) -> Self {
        let mut changes = Vec::new();
        let mut entries = output.split(|b| *b == 0).filter(|e| !e.is_empty());

        while let Some(entry) = entries.next() {
            if entry.len() < 4 {
                continue;
            }
            let (status, path) = entry.split_at(3);
            let index = status[0] as char;
            let worktree = status[1] as char;

            let kind = match (index, worktree) {
                ('?', '?') | ('A', _) => ChangeKind::Added,
                ('R', _) | ('C', _) => ChangeKind::Renamed,
                ('D', _) | (_, 'D') => ChangeKind::Deleted,
                ('!', '!') => continue,
                _ => ChangeKind::Modified,
            };

            let from = if kind == ChangeKind::Renamed {
                entries.next().map(path_from_bytes)
            } else {
                None
            };

            changes.push(Change {
                path: path_from_bytes(path),
                kind,
                from,
            });
        }

        Self { changes }
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}
