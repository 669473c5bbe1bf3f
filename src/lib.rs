//! syncguard - Sensitive-Content Guard for Repository Sync
//!
//! syncguard scans pending working-tree changes for credentials, keys and
//! personal data before committing and pushing them to a remote, so a
//! configuration repository can be kept in sync without leaking secrets.
//!
//! ## Core Features
//!
//! - **Content Scanner**: Ordered regex rules with block/warn severities plus filename heuristics
//! - **Sync Orchestrator**: Scan, stage, commit and push as one guarded pipeline
//! - **Commit Messages**: Generated from the categories of the changed paths
//! - **Configuration Management**: YAML-based configuration with XDG compliance
//!
//! ## Modules
//!
//! - [`scanner`]: Detection rules and file scanning
//! - [`sync`]: The sync pipeline
//! - [`git`]: Version-control backend
//! - [`config`]: Configuration management and parsing

pub mod changes;
pub mod config;
pub mod error;
pub mod git;
pub mod health;
pub mod message;
pub mod scanner;
pub mod sync;

pub use changes::{Change, ChangeKind, ChangeSet};
pub use config::Config;
pub use error::SyncError;
pub use git::{GitClient, PushOutcome, Vcs};
pub use health::HealthCheck;
pub use scanner::{Finding, ScanResult, Scanner, Severity};
pub use sync::{SyncEngine, SyncOptions, SyncReport};
