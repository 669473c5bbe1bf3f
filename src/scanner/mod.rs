//! Content Scanner - detects material that should not be committed
//!
//! A [`Scanner`] holds an ordered list of compiled [`DetectionRule`]s. Scanning
//! is pure: the same `(path, content)` always produces the same [`ScanResult`].

pub mod filename;
pub mod rules;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ScannerConfig;
use rules::{RuleDef, BUILTIN_RULES};

/// Whether a finding stops a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must prevent the sync from proceeding
    Block,
    /// Reported only
    Warn,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Block => "block",
            Severity::Warn => "warn",
        }
    }
}

/// A compiled detection rule
#[derive(Debug, Clone)]
pub struct DetectionRule {
    pub category: String,
    pub severity: Severity,
    pub regex: Regex,
    pub description: String,
}

impl DetectionRule {
    /// Compile a rule, naming the category if the pattern is invalid
    pub fn new(category: &str, pattern: &str, severity: Severity, description: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .with_context(|| format!("Invalid regex pattern for {}: {}", category, pattern))?;

        Ok(Self {
            category: category.to_string(),
            severity,
            regex,
            description: description.to_string(),
        })
    }

    fn from_def(def: &RuleDef) -> Result<Self> {
        Self::new(def.category, def.pattern, def.severity, def.description)
    }
}

/// One rule match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub category: String,
    pub severity: Severity,
    /// The matched substring (or the offending name for path findings)
    pub matched: String,
    /// 1-based line of the match; `None` for path-based findings
    pub line: Option<usize>,
    pub description: String,
}

impl Finding {
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Block
    }

    /// Matched text with everything past the first few characters masked
    pub fn redacted(&self) -> String {
        if self.line.is_none() {
            return self.matched.clone();
        }
        let visible: String = self.matched.chars().take(6).collect();
        if self.matched.chars().count() > 6 {
            format!("{}****", visible)
        } else {
            visible
        }
    }
}

/// Findings for a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub path: PathBuf,
    pub findings: Vec<Finding>,
}

impl ScanResult {
    /// True if any finding has block severity
    pub fn is_blocked(&self) -> bool {
        self.findings.iter().any(Finding::is_blocking)
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn blocking(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_blocking())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.is_blocking())
    }

    /// Distinct categories of blocking findings, in rule order
    pub fn blocking_categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for finding in self.blocking() {
            if !categories.contains(&finding.category.as_str()) {
                categories.push(&finding.category);
            }
        }
        categories
    }
}

/// Applies detection rules and filename heuristics
#[derive(Debug, Clone)]
pub struct Scanner {
    rules: Vec<DetectionRule>,
    check_filenames: bool,
}

impl Scanner {
    /// Scanner with every built-in rule and filename heuristics enabled
    pub fn builtin() -> Result<Self> {
        Self::from_config(&ScannerConfig::default())
    }

    /// Built-in rules minus `disabled_rules`, followed by `extra_rules`
    pub fn from_config(config: &ScannerConfig) -> Result<Self> {
        let mut rules = Vec::new();

        for def in BUILTIN_RULES {
            if config.disabled_rules.iter().any(|d| d == def.category) {
                debug!("Rule disabled by configuration: {}", def.category);
                continue;
            }
            rules.push(DetectionRule::from_def(def)?);
        }

        for extra in &config.extra_rules {
            rules.push(DetectionRule::new(
                &extra.category,
                &extra.pattern,
                extra.severity,
                &extra.description,
            )?);
        }

        Ok(Self {
            rules,
            check_filenames: config.check_filenames,
        })
    }

    /// Active rules in evaluation order
    pub fn rules(&self) -> &[DetectionRule] {
        &self.rules
    }

    /// Scan `content` as the body of `path`
    ///
    /// Each rule contributes at most one finding (its first match). Content
    /// findings come first in rule order, then path heuristics.
    pub fn scan(&self, path: &Path, content: &str) -> ScanResult {
        let mut findings = Vec::new();

        for rule in &self.rules {
            if let Some(m) = rule.regex.find(content) {
                findings.push(Finding {
                    category: rule.category.clone(),
                    severity: rule.severity,
                    matched: m.as_str().to_string(),
                    line: Some(line_of(content, m.start())),
                    description: rule.description.clone(),
                });
            }
        }

        if self.check_filenames {
            findings.extend(filename::check(path));
        }

        ScanResult {
            path: path.to_path_buf(),
            findings,
        }
    }

    /// Read a file and scan it; non-UTF-8 bytes are replaced, not rejected
    pub fn scan_file(&self, path: &Path) -> Result<ScanResult> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(self.scan(path, &String::from_utf8_lossy(&bytes)))
    }
}

fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}
