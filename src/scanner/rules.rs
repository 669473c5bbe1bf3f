//! Built-in detection rules
//!
//! The table is data: adding a rule means adding a row, the scanner loop does
//! not change. Rows are checked in order and that order is reported back.

use super::Severity;

/// A detection rule as written in the table, before its pattern is compiled
#[derive(Debug, Clone, Copy)]
pub struct RuleDef {
    /// Category label reported for matches
    pub category: &'static str,

    /// Whether a match blocks a sync
    pub severity: Severity,

    /// Regex pattern to match against file content
    pub pattern: &'static str,

    /// Human-readable explanation
    pub description: &'static str,
}

impl RuleDef {
    pub const fn new(
        category: &'static str,
        severity: Severity,
        pattern: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            category,
            severity,
            pattern,
            description,
        }
    }
}

pub const BUILTIN_RULES: &[RuleDef] = &[
    RuleDef::new(
        "private-key",
        Severity::Block,
        r"-----BEGIN ((RSA|DSA|EC|OPENSSH|PGP|ENCRYPTED) )?PRIVATE KEY( BLOCK)?-----",
        "PEM private key header",
    ),
    RuleDef::new(
        "aws-access-key",
        Severity::Block,
        r"\b(AKIA|ASIA)[0-9A-Z]{16}\b",
        "AWS access key ID",
    ),
    RuleDef::new(
        "aws-secret-key",
        Severity::Block,
        r#"(?i)aws_secret_access_key\s*[:=]\s*["']?[A-Za-z0-9/+=]{40}"#,
        "AWS secret access key",
    ),
    RuleDef::new(
        "github-token",
        Severity::Block,
        r"\bgh[pousr]_[A-Za-z0-9]{36}\b",
        "GitHub token",
    ),
    RuleDef::new(
        "slack-token",
        Severity::Block,
        r"\bxox[baprs]-[A-Za-z0-9-]{10,}",
        "Slack token",
    ),
    RuleDef::new(
        "api-key",
        Severity::Block,
        r#"(?i)api[_-]?key["']?\s*[:=]\s*["']?[A-Za-z0-9_\-]{16,}"#,
        "API key assignment",
    ),
    RuleDef::new(
        "password",
        Severity::Block,
        r#"(?i)(password|passwd|pwd)["']?\s*[:=]\s*["'][^"'\s]{8,}["']"#,
        "Hard-coded password",
    ),
    RuleDef::new(
        "database-url",
        Severity::Block,
        r"(?i)\b(postgres(ql)?|mysql|mongodb(\+srv)?|redis|amqp)://[^\s:/@]+:[^\s@/]+@",
        "Database connection string with embedded credentials",
    ),
    RuleDef::new(
        "url-credentials",
        Severity::Block,
        r"(?i)\b[a-z][a-z0-9+.\-]*://[^\s:/@]+:[^\s@/]+@[^\s/]+",
        "URL with embedded credentials",
    ),
    RuleDef::new(
        "generic-secret",
        Severity::Block,
        r#"(?i)(client_secret|secret_key|auth_token|access_token|secret)["']?\s*[:=]\s*["']?[A-Za-z0-9_\-/+=.]{12,}"#,
        "Secret or token assignment",
    ),
    RuleDef::new(
        "jwt",
        Severity::Block,
        r"\beyJ[A-Za-z0-9_\-]{10,}\.eyJ[A-Za-z0-9_\-]{10,}\.[A-Za-z0-9_\-]{10,}",
        "JSON Web Token",
    ),
    RuleDef::new(
        "credit-card",
        Severity::Block,
        r"\b(4[0-9]{12}([0-9]{3})?|5[1-5][0-9]{14}|3[47][0-9]{13}|6(011|5[0-9]{2})[0-9]{12})\b",
        "Credit card number",
    ),
    RuleDef::new(
        "email",
        Severity::Warn,
        r#"(?i)\be-?mail["']?\s*[:=]\s*["']?[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}"#,
        "Email address field",
    ),
    RuleDef::new(
        "phone",
        Severity::Warn,
        r#"(?i)\bphone(_?number)?["']?\s*[:=]\s*["']?\+?[0-9][0-9 ().\-]{7,}"#,
        "Phone number field",
    ),
    RuleDef::new(
        "private-ip",
        Severity::Warn,
        r"\b(10\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}|192\.168\.[0-9]{1,3}\.[0-9]{1,3}|172\.(1[6-9]|2[0-9]|3[01])\.[0-9]{1,3}\.[0-9]{1,3})\b",
        "Private network IPv4 address",
    ),
];
