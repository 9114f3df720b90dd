//! Shared helpers for the Signflow workspace.
//!
//! - [`config`]: the immutable configuration value and its loader/validator
//! - [`retry`]: deterministic exponential-backoff executor
//! - [`cache`]: time-boxed key/value cache used for tokens and the polling marker
//! - [`clock`]: injectable time source
//! - [`validation`]: document and signatory checks
//! - [`async_runtime`]: running hook futures from synchronous hosts

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub mod async_runtime;
pub mod cache;
pub mod clock;
pub mod config;
pub mod retry;
pub mod validation;

pub use async_runtime::*;
pub use cache::*;
pub use clock::*;
pub use retry::*;
pub use validation::*;

static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(bearer\s+)([\w\-\.~+/]+=*)",
        r"(?i)(apptoken[\x22']?\s*[:=]\s*[\x22']?)([\w\-]+)",
        r#"(?i)((?:access_token|accesstoken)[\x22']?\s*[:=]\s*[\x22']?)([^\s\x22',}]+)"#,
        r"(?i)(assertion=)([^\s&]+)",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("redaction pattern should compile"))
    .collect()
});

/// Redacts bearer tokens, app tokens, and JWT assertions in a string.
///
/// Used before provider error bodies or request descriptions reach the logs.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in SECRET_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |caps: &Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}<redacted>")
            })
            .into_owned();
    }
    redacted
}
