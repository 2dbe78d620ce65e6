//! Log Redaction Layer
//!
//! Scrubs API keys, subscription keys, and bearer tokens from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static SUBSCRIPTION_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Ocp-Apim-Subscription-Key\s*[:=]\s*)[^\s,;]+").unwrap()
});
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9_\-]{16,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});
// Azure cognitive services keys are 32 hex characters (84 alphanumerics for newer ones).
static AZURE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9a-fA-F]{32}|[a-zA-Z0-9]{84})\b").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let mut redacted = SUBSCRIPTION_HEADER_RE
        .replace_all(input, "${1}[REDACTED_KEY]")
        .to_string();

    redacted = API_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]").to_string();

    redacted = AZURE_KEY_RE.replace_all(&redacted, "[REDACTED_KEY]").to_string();

    redacted
}
