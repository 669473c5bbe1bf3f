//! System health checks for syncguard
//!
//! Preflight diagnostics run by `syncguard doctor` to verify that git, the
//! configured repository and its remote, and the rule set are all usable.

use crate::git::{GitClient, Vcs};
use crate::scanner::Scanner;
use crate::Config;

/// Result of system health checks
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Git installation status
    pub git: CheckResult,
    /// Configured repository is a checkout
    pub repository: CheckResult,
    /// Configured remote exists
    pub remote: CheckResult,
    /// Detection rules compile
    pub rules: CheckResult,
}

/// Result of an individual health check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
    pub is_warning: bool,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn ok_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn warning_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: true,
        }
    }
}

impl HealthCheck {
    /// Run all health checks
    pub async fn run(config: &Config) -> Self {
        let client = GitClient::new();
        let git = Self::check_git();

        let root = if git.passed {
            client.toplevel(&config.repository_path()).await.ok().flatten()
        } else {
            None
        };

        let repository = match &root {
            Some(root) => CheckResult::ok_with_details("Repository found", root.display().to_string()),
            None => CheckResult::error_with_details(
                "Not a git repository",
                format!("{} (set `repository` or pass --repo)", config.repository),
            ),
        };

        let remote = match &root {
            Some(root) => match client.remote_url(root, &config.remote).await {
                Ok(Some(url)) => {
                    CheckResult::ok_with_details(format!("Remote '{}' configured", config.remote), url)
                }
                _ => CheckResult::warning_with_details(
                    format!("Remote '{}' not configured", config.remote),
                    "sync will commit locally but the push step will fail",
                ),
            },
            None => CheckResult::error("Remote not checked (no repository)"),
        };

        Self {
            git,
            repository,
            remote,
            rules: Self::check_rules(config),
        }
    }

    /// Check if all required checks passed (excludes warnings)
    pub fn all_passed(&self) -> bool {
        self.all_checks().iter().all(|(_, r)| r.passed)
    }

    /// Get list of failed checks (errors only, not warnings)
    pub fn errors(&self) -> Vec<&CheckResult> {
        self.all_checks()
            .into_iter()
            .map(|(_, r)| r)
            .filter(|r| !r.passed && !r.is_warning)
            .collect()
    }

    /// All checks with display names, in report order
    pub fn all_checks(&self) -> Vec<(&'static str, &CheckResult)> {
        vec![
            ("Git", &self.git),
            ("Repository", &self.repository),
            ("Remote", &self.remote),
            ("Rules", &self.rules),
        ]
    }

    /// Check git installation
    fn check_git() -> CheckResult {
        match std::process::Command::new("git").arg("--version").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                CheckResult::ok_with_details("Git installed", version.trim().to_string())
            }
            Ok(_) => CheckResult::error("Git command failed"),
            Err(_) => CheckResult::error_with_details(
                "Git not found in PATH",
                "Install git: https://git-scm.com/downloads",
            ),
        }
    }

    /// Check that configured rules compile
    fn check_rules(config: &Config) -> CheckResult {
        match Scanner::from_config(&config.scanner) {
            Ok(scanner) => CheckResult::ok(format!("{} detection rules active", scanner.rules().len())),
            Err(e) => CheckResult::error_with_details("Invalid detection rule", format!("{:#}", e)),
        }
    }
}
