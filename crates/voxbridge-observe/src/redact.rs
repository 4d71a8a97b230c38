//! Credential scrubbing for log messages.

use regex::Regex;
use std::sync::LazyLock;

static CREDENTIAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:Bearer|Basic)\s+[A-Za-z0-9\-._~+/]{16,}=*|sk-[A-Za-z0-9\-_]{16,}")
        .expect("credential pattern is valid")
});

/// Replaces bearer/basic credentials and `sk-` style API keys with
/// `[REDACTED]`. Credentials shorter than 16 characters are left alone so
/// phrases like "Basic auth failed" survive.
pub fn redact(input: &str) -> String {
    CREDENTIAL_RE.replace_all(input, "[REDACTED]").into_owned()
}
