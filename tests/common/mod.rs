//! Common test utilities and helpers for syncguard tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use syncguard::Config;

/// A working repository wired to a local bare remote, with one initial commit pushed
pub struct GitFixture {
    pub temp_dir: TempDir,
    pub remote: PathBuf,
    pub work: PathBuf,
}

impl GitFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let remote = temp_dir.path().join("remote.git");
        let work = temp_dir.path().join("work");
        std::fs::create_dir_all(&remote).expect("Failed to create remote dir");
        std::fs::create_dir_all(&work).expect("Failed to create work dir");

        git(&remote, &["init", "--bare", "--quiet"]);
        git(&remote, &["symbolic-ref", "HEAD", "refs/heads/main"]);

        git(&work, &["init", "--quiet"]);
        git(&work, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        configure_identity(&work);
        git(&work, &["remote", "add", "origin", remote.to_str().unwrap()]);

        let fixture = Self {
            temp_dir,
            remote,
            work,
        };

        fixture.write("README.md", "# dotfiles\n");
        git(&fixture.work, &["add", "--all"]);
        git(&fixture.work, &["commit", "--quiet", "-m", "Initial commit"]);
        git(&fixture.work, &["push", "--quiet", "origin", "HEAD:refs/heads/main"]);

        fixture
    }

    /// Write a file relative to the working repository, creating parent dirs
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.work.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Clone the remote into a second working copy
    pub fn clone_remote(&self, name: &str) -> PathBuf {
        let target = self.temp_dir.path().join(name);
        git(
            self.temp_dir.path(),
            &[
                "clone",
                "--quiet",
                self.remote.to_str().unwrap(),
                target.to_str().unwrap(),
            ],
        );
        configure_identity(&target);
        target
    }

    /// Subjects of the commits on the remote's main branch, newest first
    pub fn remote_subjects(&self) -> Vec<String> {
        log_subjects(&self.remote)
    }

    /// Subjects of the commits in the working repository, newest first
    pub fn local_subjects(&self) -> Vec<String> {
        log_subjects(&self.work)
    }

    /// Configuration pointing at the working repository
    pub fn config(&self) -> Config {
        Config {
            repository: self.work.display().to_string(),
            ..Config::default()
        }
    }

    /// Write a configuration file for the CLI and return its path
    pub fn config_file(&self) -> PathBuf {
        let path = self.temp_dir.path().join("config.yml");
        self.config().save(&path).expect("Failed to save config");
        path
    }
}

/// Run git in `dir`, panicking on failure; returns stdout
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("Failed to execute git");

    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn configure_identity(dir: &Path) {
    git(dir, &["config", "user.name", "syncguard tests"]);
    git(dir, &["config", "user.email", "tests@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

fn log_subjects(dir: &Path) -> Vec<String> {
    git(dir, &["log", "--format=%s", "main"])
        .lines()
        .map(str::to_string)
        .collect()
}

/// Assertion helpers for test validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}

pub fn assert_contains_any(text: &str, expected: &[&str]) {
    let found = expected.iter().any(|item| text.contains(item));
    assert!(
        found,
        "Expected text to contain at least one of {:?}, but it didn't. Text: {}",
        expected,
        text
    );
}
