//! Path-based heuristics
//!
//! These never block; they flag files that deserve a second look before they
//! leave the machine.

use std::path::Path;

use super::{Finding, Severity};

/// Extensions that usually hold key or certificate material
const SENSITIVE_EXTENSIONS: &[&str] = &[
    "pem", "key", "p12", "pfx", "jks", "keystore", "crt", "cer", "der", "ppk", "asc",
];

/// Basename fragments that suggest credentials
const SENSITIVE_NAME_FRAGMENTS: &[&str] = &["secret", "password", "passwd", "credential", "token"];

/// Well-known private key and credential store filenames
const SENSITIVE_NAMES: &[&str] = &[
    "id_rsa",
    "id_dsa",
    "id_ecdsa",
    "id_ed25519",
    ".netrc",
    ".pgpass",
    ".htpasswd",
];

/// Suffixes marking an env file as a template rather than real values
const ENV_TEMPLATE_SUFFIXES: &[&str] = &[".example", ".sample", ".template"];

/// Check a path against the filename heuristics
pub fn check(path: &Path) -> Vec<Finding> {
    let mut findings = Vec::new();

    let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_lowercase()) else {
        return findings;
    };

    if let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_lowercase()) {
        if SENSITIVE_EXTENSIONS.contains(&ext.as_str()) {
            findings.push(Finding::for_path(
                "sensitive-extension",
                format!(".{}", ext),
                "Extension suggests key or certificate material",
            ));
        }
    }

    if SENSITIVE_NAMES.contains(&name.as_str()) {
        findings.push(Finding::for_path(
            "sensitive-filename",
            name.clone(),
            "Well-known private key or credential file",
        ));
    } else if let Some(fragment) = SENSITIVE_NAME_FRAGMENTS.iter().find(|f| name.contains(*f)) {
        findings.push(Finding::for_path(
            "sensitive-filename",
            (*fragment).to_string(),
            "Filename suggests sensitive content",
        ));
    }

    if is_env_file(&name) {
        findings.push(Finding::for_path(
            "env-file",
            name,
            "Environment definition file, review manually",
        ));
    }

    findings
}

fn is_env_file(name: &str) -> bool {
    if name == ".env" {
        return true;
    }
    name.starts_with(".env.") && !ENV_TEMPLATE_SUFFIXES.iter().any(|s| name.ends_with(s))
}

impl Finding {
    fn for_path(category: &str, matched: String, description: &str) -> Self {
        Self {
            category: category.to_string(),
            severity: Severity::Warn,
            matched,
            line: None,
            description: description.to_string(),
        }
    }
}
