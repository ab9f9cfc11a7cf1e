//! Process-wide registry of secret values that must never reach a log line
//!
//! Once a value is registered it stays redacted until the process exits.

use once_cell::sync::Lazy;
use std::sync::RwLock;

const MASK: &str = "***";

static SECRETS: Lazy<RwLock<Vec<String>>> = Lazy::new(|| RwLock::new(Vec::new()));

/// Register a value for redaction. Empty values are ignored.
pub fn register_secret(secret: &str) {
    if secret.is_empty() {
        return;
    }
    let mut secrets = SECRETS.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    if !secrets.iter().any(|s| s == secret) {
        secrets.push(secret.to_string());
        // Longest first so a secret containing another is masked whole
        secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));
    }
}

/// Replace every registered secret in `text` with `***`
pub fn redact(text: &str) -> String {
    let secrets = SECRETS.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut redacted = text.to_string();
    for secret in secrets.iter() {
        if redacted.contains(secret.as_str()) {
            redacted = redacted.replace(secret.as_str(), MASK);
        }
    }
    redacted
}
