use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::scanner::Severity;

/// Main configuration structure for syncguard
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Working tree to guard and sync
    #[serde(default = "default_repository")]
    pub repository: String,

    /// Remote to push to
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Branch to push (current branch when unset)
    #[serde(default)]
    pub branch: Option<String>,

    /// Synchronization behavior settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Content scanner settings
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Synchronization configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncConfig {
    /// Timeout for the push step in seconds
    #[serde(default = "default_push_timeout")]
    pub push_timeout: u64,

    /// Provenance trailer appended to every commit message
    #[serde(default = "default_trailer")]
    pub trailer: String,
}

/// Scanner configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScannerConfig {
    /// Apply filename/extension heuristics in addition to content rules
    #[serde(default = "default_true")]
    pub check_filenames: bool,

    /// Built-in rule categories to switch off
    #[serde(default)]
    pub disabled_rules: Vec<String>,

    /// Additional user-defined rules, checked after the built-in ones
    #[serde(default)]
    pub extra_rules: Vec<RuleConfig>,
}

/// A user-defined detection rule
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RuleConfig {
    pub category: String,
    pub pattern: String,
    #[serde(default = "default_rule_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"
}

// Default value functions
fn default_repository() -> String {
    ".".to_string()
}
fn default_remote() -> String {
    "origin".to_string()
}
fn default_true() -> bool {
    true
}
fn default_push_timeout() -> u64 {
    120
}
fn default_trailer() -> String {
    "Co-Authored-By: syncguard <syncguard@users.noreply.github.com>".to_string()
}
fn default_rule_severity() -> Severity {
    Severity::Block
}
fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations
impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            push_timeout: default_push_timeout(),
            trailer: default_trailer(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            check_filenames: default_true(),
            disabled_rules: Vec::new(),
            extra_rules: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            tracing::debug!("No configuration at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Expand environment variables in paths
        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("syncguard").join("config.yml"))
    }

    /// Expand `~` and environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.repository = shellexpand::full(&self.repository)
            .context("Failed to expand repository path")?
            .into_owned();

        Ok(())
    }

    /// The working tree as a path
    pub fn repository_path(&self) -> PathBuf {
        PathBuf::from(&self.repository)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            remote: default_remote(),
            branch: None,
            sync: SyncConfig::default(),
            scanner: ScannerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
