//! Commit-message heuristics
//!
//! Turns a [`ChangeSet`] into a short imperative subject line. Purely advisory:
//! nothing here influences whether a sync runs.

use std::fmt;
use std::path::Path;

use crate::changes::{Change, ChangeKind, ChangeSet};

/// Most file names listed in the context clause
const MAX_NAMED_FILES: usize = 3;

/// Path categories, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Commands,
    ClaudeMd,
    Scripts,
    Agents,
    Skills,
    Other,
}

impl Category {
    /// Classify a repository-relative path
    pub fn of(path: &Path) -> Self {
        let in_dir = |dir: &str| {
            path.parent()
                .map(|p| p.components().any(|c| c.as_os_str() == dir))
                .unwrap_or(false)
        };

        if in_dir("commands") {
            Category::Commands
        } else if path.file_name().map(|n| n == "CLAUDE.md").unwrap_or(false) {
            Category::ClaudeMd
        } else if in_dir("scripts") {
            Category::Scripts
        } else if in_dir("agents") {
            Category::Agents
        } else if in_dir("skills") {
            Category::Skills
        } else {
            Category::Other
        }
    }

    /// Noun used as the message subject
    pub fn noun(&self) -> &'static str {
        match self {
            Category::Commands => "commands",
            Category::ClaudeMd => "CLAUDE.md",
            Category::Scripts => "scripts",
            Category::Agents => "agents",
            Category::Skills => "skills",
            Category::Other => "configuration",
        }
    }
}

/// Structured form of a generated commit message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDescriptor {
    pub verb: &'static str,
    pub subject: String,
    pub context: Option<String>,
}

impl fmt::Display for CommitDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb, self.subject)?;
        if let Some(context) = &self.context {
            write!(f, " ({})", context)?;
        }
        Ok(())
    }
}

/// Describe a change set by its highest-precedence category
pub fn describe(changes: &ChangeSet) -> CommitDescriptor {
    let primary = changes
        .iter()
        .map(|c| Category::of(&c.path))
        .min()
        .unwrap_or(Category::Other);

    let in_primary: Vec<&Change> = changes
        .iter()
        .filter(|c| Category::of(&c.path) == primary)
        .collect();
    let others = changes.len() - in_primary.len();

    let verb = verb_for(primary, &in_primary);

    CommitDescriptor {
        verb,
        subject: primary.noun().to_string(),
        context: context_clause(primary, &in_primary, others),
    }
}

/// Render the generated message for a change set
pub fn generate(changes: &ChangeSet) -> String {
    describe(changes).to_string()
}

/// Append the provenance trailer unless the message already carries it
pub fn with_trailer(message: &str, trailer: &str) -> String {
    let message = message.trim_end();
    let trailer = trailer.trim();
    if trailer.is_empty() || message.lines().any(|l| l.trim() == trailer) {
        return message.to_string();
    }
    format!("{}\n\n{}", message, trailer)
}

fn verb_for(category: Category, changes: &[&Change]) -> &'static str {
    if category == Category::Scripts {
        return "Enhance";
    }
    if !changes.is_empty() && changes.iter().all(|c| c.kind == ChangeKind::Deleted) {
        "Clean up"
    } else if !changes.is_empty() && changes.iter().all(|c| c.kind == ChangeKind::Added) {
        "Add"
    } else {
        "Update"
    }
}

fn context_clause(category: Category, changes: &[&Change], others: usize) -> Option<String> {
    let mut parts = Vec::new();

    // CLAUDE.md names itself already
    if category != Category::ClaudeMd {
        let mut names: Vec<String> = Vec::new();
        for name in changes.iter().filter_map(|c| file_name(c)) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names.truncate(MAX_NAMED_FILES);

        if !names.is_empty() {
            // `+N more` counts files, not names
            let named = changes
                .iter()
                .filter(|c| file_name(c).map(|n| names.contains(&n)).unwrap_or(false))
                .count();
            let extra = changes.len() - named;
            let mut listed = names.join(", ");
            if extra > 0 {
                listed.push_str(&format!(" +{} more", extra));
            }
            parts.push(listed);
        }
    }

    if others > 0 {
        parts.push(format!(
            "and {} other file{}",
            others,
            if others == 1 { "" } else { "s" }
        ));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn file_name(change: &Change) -> Option<String> {
    change
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(changes: &[(&str, ChangeKind)]) -> ChangeSet {
        ChangeSet::new(changes.iter().map(|(p, k)| Change::new(*p, *k)).collect())
    }

    #[test]
    fn test_category_precedence() {
        assert_eq!(Category::of(Path::new(".claude/commands/review.md")), Category::Commands);
        assert_eq!(Category::of(Path::new("CLAUDE.md")), Category::ClaudeMd);
        assert_eq!(Category::of(Path::new("scripts/security-check.sh")), Category::Scripts);
        assert_eq!(Category::of(Path::new(".claude/agents/planner.md")), Category::Agents);
        assert_eq!(Category::of(Path::new("skills/pdf/SKILL.md")), Category::Skills);
        assert_eq!(Category::of(Path::new("zsh/.zshrc")), Category::Other);
        // a file named like a category directory is not inside it
        assert_eq!(Category::of(Path::new("scripts")), Category::Other);
        assert!(Category::Commands < Category::ClaudeMd);
        assert!(Category::Agents < Category::Other);
    }

    #[test]
    fn test_scripts_only_starts_with_enhance() {
        let changes = set(&[
            ("scripts/security-check.sh", ChangeKind::Modified),
            ("scripts/auto-sync.sh", ChangeKind::Added),
        ]);
        let message = generate(&changes);

        assert!(message.starts_with("Enhance"));
        assert!(message.contains("scripts"));
        assert_eq!(message, "Enhance scripts (security-check.sh, auto-sync.sh)");
    }

    #[test]
    fn test_commands_take_precedence() {
        let changes = set(&[
            ("scripts/auto-sync.sh", ChangeKind::Modified),
            (".claude/commands/review.md", ChangeKind::Added),
            ("zsh/.zshrc", ChangeKind::Modified),
        ]);
        let descriptor = describe(&changes);

        assert_eq!(descriptor.verb, "Add");
        assert_eq!(descriptor.subject, "commands");
        assert_eq!(descriptor.to_string(), "Add commands (review.md and 2 other files)");
    }

    #[test]
    fn test_deletions_are_cleanup() {
        let changes = set(&[
            ("agents/old.md", ChangeKind::Deleted),
            ("agents/older.md", ChangeKind::Deleted),
        ]);
        assert_eq!(generate(&changes), "Clean up agents (old.md, older.md)");
    }

    #[test]
    fn test_claude_md_has_no_file_list() {
        let changes = set(&[("CLAUDE.md", ChangeKind::Modified)]);
        assert_eq!(generate(&changes), "Update CLAUDE.md");

        let with_other = set(&[("CLAUDE.md", ChangeKind::Modified), ("bash/.bashrc", ChangeKind::Modified)]);
        assert_eq!(generate(&with_other), "Update CLAUDE.md (and 1 other file)");
    }

    #[test]
    fn test_long_file_lists_are_truncated() {
        let changes = set(&[
            ("skills/a.md", ChangeKind::Modified),
            ("skills/b.md", ChangeKind::Added),
            ("skills/c.md", ChangeKind::Modified),
            ("skills/d.md", ChangeKind::Modified),
            ("skills/e.md", ChangeKind::Deleted),
        ]);
        assert_eq!(generate(&changes), "Update skills (a.md, b.md, c.md +2 more)");
    }

    #[test]
    fn test_same_named_files_count_once_per_file() {
        let changes = set(&[
            ("skills/pdf/SKILL.md", ChangeKind::Modified),
            ("skills/a.md", ChangeKind::Modified),
            ("skills/docx/SKILL.md", ChangeKind::Modified),
            ("skills/b.md", ChangeKind::Modified),
            ("skills/c.md", ChangeKind::Modified),
        ]);
        assert_eq!(generate(&changes), "Update skills (SKILL.md, a.md, b.md +1 more)");
    }

    #[test]
    fn test_fallback_category() {
        let changes = set(&[("brew/Brewfile", ChangeKind::Modified)]);
        assert_eq!(generate(&changes), "Update configuration (Brewfile)");
    }

    #[test]
    fn test_trailer_appended_once() {
        let trailer = "Co-Authored-By: syncguard <bot@example.com>";
        let first = with_trailer("Update skills\n", trailer);
        assert_eq!(first, format!("Update skills\n\n{}", trailer));

        let again = with_trailer(&first, trailer);
        assert_eq!(again, first);

        assert_eq!(with_trailer("Fix typo", ""), "Fix typo");
    }
}
