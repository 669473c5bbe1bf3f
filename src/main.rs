use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use syncguard::health::CheckResult;
use syncguard::message;
use syncguard::{
    Config, GitClient, HealthCheck, ScanResult, Scanner, SyncEngine, SyncError, SyncOptions,
    SyncReport,
};

#[derive(Parser)]
#[command(name = "syncguard")]
#[command(about = "Scan pending changes for secrets, then commit and push them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository to operate on (overrides the configured one)
    #[arg(short = 'C', long, global = true)]
    repo: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan files for sensitive content
    Scan {
        /// Files to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan, commit and push pending changes
    Sync {
        /// Commit even if sensitive content is detected
        #[arg(long)]
        force: bool,

        /// Scan and show the commit message without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Only sync changes under this path (relative to the repository root)
        #[arg(long)]
        only: Option<PathBuf>,

        /// Commit message (generated from the changes when omitted)
        message: Option<String>,
    },

    /// Show pending changes and the message that would be generated
    Status {
        /// Only consider changes under this path
        #[arg(long)]
        only: Option<PathBuf>,
    },

    /// List active detection rules
    Rules,

    /// Write a default configuration file
    Init {
        /// Repository to sync
        #[arg(short, long, default_value = ".")]
        repository: String,
    },

    /// System health check and diagnostics
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.command {
        Commands::Init { .. } => Config::default(),
        _ => load_config(cli.config.as_deref())?,
    };
    if let Some(repo) = &cli.repo {
        config.repository = repo.display().to_string();
    }

    init_logging(cli.verbose, &config.logging.level)?;
    debug!("Starting syncguard v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Scan { paths, json } => cmd_scan(&paths, json, &config),
        Commands::Sync {
            force,
            dry_run,
            only,
            message,
        } => {
            let options = SyncOptions {
                message,
                force,
                dry_run,
                only,
            };
            cmd_sync(options, &config).await
        }
        Commands::Status { only } => cmd_status(only, &config).await,
        Commands::Rules => cmd_rules(&config),
        Commands::Init { repository } => cmd_init(repository, cli.config),
        Commands::Doctor => cmd_doctor(&config).await,
    }
}

/// Initialize logging; `--verbose` wins over the configured level, RUST_LOG over both
fn init_logging(verbose: bool, level: &str) -> Result<()> {
    let default_level = if verbose { "debug" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None => Config::load_or_default(),
    }
}

/// Scan files and report findings; exits 1 when anything is blocked
fn cmd_scan(paths: &[PathBuf], json: bool, config: &Config) -> Result<()> {
    let scanner = Scanner::from_config(&config.scanner)?;

    let results = paths
        .iter()
        .map(|path| scanner.scan_file(path))
        .collect::<Result<Vec<ScanResult>>>()?;

    let blocked = results.iter().filter(|r| r.is_blocked()).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            print_scan_result(result);
        }
        println!();
        if blocked > 0 {
            println!("🚫 {} of {} file(s) blocked", blocked, results.len());
        } else {
            println!("✅ No blocking content in {} file(s)", results.len());
        }
    }

    if blocked > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Run the sync pipeline against the configured repository
async fn cmd_sync(options: SyncOptions, config: &Config) -> Result<()> {
    let engine = SyncEngine::new(config, GitClient::new())?;

    let cancel = engine.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping at the next checkpoint");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    match engine.sync(&config.repository_path(), options).await {
        Ok(report) => {
            print_sync_report(&report);
            Ok(())
        }
        Err(e) => {
            print_sync_error(&e);
            std::process::exit(1);
        }
    }
}

/// Preview pending changes
async fn cmd_status(only: Option<PathBuf>, config: &Config) -> Result<()> {
    let engine = SyncEngine::new(config, GitClient::new())?;

    let changes = match engine
        .preview(&config.repository_path(), only.as_deref())
        .await
    {
        Ok(changes) => changes,
        Err(e) => {
            print_sync_error(&e);
            std::process::exit(1);
        }
    };

    if changes.is_empty() {
        println!("✅ Nothing to sync");
        return Ok(());
    }

    println!("📋 Pending changes ({}):", changes.len());
    for change in &changes {
        match &change.from {
            Some(from) => println!(
                "   {:<9} {} (from {})",
                change.kind.as_str(),
                change.path.display(),
                from.display()
            ),
            None => println!("   {:<9} {}", change.kind.as_str(), change.path.display()),
        }
    }
    println!();
    println!("📝 Message: {}", message::generate(&changes));

    Ok(())
}

/// List the rules the scanner would apply
fn cmd_rules(config: &Config) -> Result<()> {
    let scanner = Scanner::from_config(&config.scanner)?;

    println!("🔍 Detection rules ({}):", scanner.rules().len());
    for rule in scanner.rules() {
        println!(
            "   [{:<5}] {:<16} {}",
            rule.severity.as_str(),
            rule.category,
            rule.description
        );
    }

    println!();
    if config.scanner.check_filenames {
        println!("📁 Filename heuristics: enabled");
    } else {
        println!("📁 Filename heuristics: disabled");
    }

    Ok(())
}

/// Write a default configuration file
fn cmd_init(repository: String, config_path: Option<PathBuf>) -> Result<()> {
    let config_path = match config_path {
        Some(path) => path,
        None => Config::default_config_path()?,
    };

    if config_path.exists() {
        println!("⚠️  Configuration already exists: {}", config_path.display());
        println!("   Edit it directly or remove it to start over");
        return Ok(());
    }

    let config = Config {
        repository,
        ..Config::default()
    };
    config.save(&config_path)?;

    info!("Configuration saved to: {:?}", config_path);

    println!("✅ syncguard initialized successfully!");
    println!("   Config: {}", config_path.display());
    println!("   Repository: {}", config.repository);
    println!("   Next: run 'syncguard doctor', then 'syncguard sync --dry-run'");

    Ok(())
}

/// System health check and diagnostics
async fn cmd_doctor(config: &Config) -> Result<()> {
    let health = HealthCheck::run(config).await;
    print_health_report(&health);

    if !health.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_scan_result(result: &ScanResult) {
    let icon = if result.is_blocked() {
        "🚫"
    } else if result.is_clean() {
        "✅"
    } else {
        "⚠️ "
    };
    println!("{} {}", icon, result.path.display());

    for finding in &result.findings {
        let location = finding
            .line
            .map(|l| format!(" line {}", l))
            .unwrap_or_default();
        println!(
            "   [{}] {}{}: {} ({})",
            finding.severity.as_str(),
            finding.category,
            location,
            finding.redacted(),
            finding.description
        );
    }
}

fn print_sync_report(report: &SyncReport) {
    if report.changes.is_empty() {
        println!("✅ Nothing to sync");
        return;
    }

    let flagged: Vec<&ScanResult> = report.flagged().collect();
    if !flagged.is_empty() {
        println!("🔍 Scanner findings:");
        for result in flagged {
            print_scan_result(result);
        }
        println!();
    }

    if report.dry_run {
        println!("🔍 Dry run: {} change(s) would be synced", report.changes.len());
        println!("📝 Message:");
        for line in report.commit_message.lines() {
            println!("   {}", line);
        }
        return;
    }

    println!("🎉 Synced {} change(s)", report.changes.len());
    if let Some(id) = &report.commit_id {
        println!("   📝 Commit: {}", id);
    }
    println!("   💬 Message:");
    for line in report.commit_message.lines() {
        println!("      {}", line);
    }
    if let Some(remote_ref) = &report.remote_ref {
        println!("   🚀 Remote: {}", remote_ref);
    }
    println!(
        "   🕒 Finished: {}",
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}

fn print_sync_error(error: &SyncError) {
    eprintln!("❌ {}", error);

    match error {
        SyncError::NotARepository { .. } => {
            eprintln!("💡 Pass --repo or set `repository` in the configuration");
        }
        SyncError::SensitiveContentBlocked { files, .. } => {
            for file in files {
                eprintln!("   🚫 {}", file.display());
            }
            eprintln!("💡 Run 'syncguard scan <file>' for details, or --force to commit anyway");
        }
        SyncError::PushRejected { .. } => {
            eprintln!("💡 The commit is kept locally. Fetch and rebase, then sync again");
        }
        SyncError::NetworkTimeout { .. } | SyncError::PushFailed(_) => {
            eprintln!("💡 The commit is kept locally. Push it manually once the remote is reachable");
        }
        _ => {}
    }

    debug!("Sync failed ({}), retryable: {}", error.kind(), error.is_retryable());
}

/// Print health check report to stdout
fn print_health_report(health: &HealthCheck) {
    fn print_check(name: &str, result: &CheckResult) {
        println!("{}:", name);
        let icon = if result.passed {
            if result.is_warning { "⚠️ " } else { "✅" }
        } else {
            "❌"
        };
        println!("  {} {}", icon, result.message);
        if let Some(details) = &result.details {
            for line in details.lines() {
                println!("     {}", line);
            }
        }
    }

    println!("🔍 syncguard System Diagnostics");
    println!();

    for (name, result) in health.all_checks() {
        print_check(name, result);
        println!();
    }

    if health.all_passed() {
        println!("✅ All checks passed");
    } else {
        println!("❌ Some checks failed");
    }
}
