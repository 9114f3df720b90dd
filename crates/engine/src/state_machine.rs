//! Mapping from provider envelope states to the local signature status.
//!
//! ```text
//! NEW -> SENT/PENDING -> SUCCESS | DECLINED | VOIDED | EXPIRED | ERROR
//! ```
//!
//! Matching is case-insensitive. Unrecognized states stay pending unless the
//! configuration lists them as error states.

use std::fmt;

use signflow_types::ProcessStatusCode;
use signflow_util::config::PollingConfig;

/// Why an envelope ended without being signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Declined,
    Voided,
    Expired,
    /// A configured error state.
    ProviderError,
    /// The polling window elapsed before a terminal state was seen.
    Timeout,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureReason::Declined => "declined",
            FailureReason::Voided => "voided",
            FailureReason::Expired => "expired",
            FailureReason::ProviderError => "provider_error",
            FailureReason::Timeout => "timeout",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalStatus {
    Pending,
    Success,
    Failure(FailureReason),
}

impl LocalStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LocalStatus::Pending)
    }

    /// The code written to the host process.
    pub fn code(self) -> ProcessStatusCode {
        match self {
            LocalStatus::Pending => ProcessStatusCode::Pending,
            LocalStatus::Success => ProcessStatusCode::Success,
            LocalStatus::Failure(FailureReason::Timeout) => ProcessStatusCode::TimedOut,
            LocalStatus::Failure(_) => ProcessStatusCode::Refused,
        }
    }
}

impl fmt::Display for LocalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalStatus::Pending => f.write_str("pending"),
            LocalStatus::Success => f.write_str("success"),
            LocalStatus::Failure(reason) => write!(f, "failure({reason})"),
        }
    }
}

fn contains_ignore_case(states: &[String], status: &str) -> bool {
    states.iter().any(|state| state.trim().eq_ignore_ascii_case(status))
}

/// Map a provider status string to the local status.
pub fn map_provider_status(provider_status: &str, polling: &PollingConfig) -> LocalStatus {
    let status = provider_status.trim().to_ascii_lowercase();
    match status.as_str() {
        "completed" => LocalStatus::Success,
        "declined" => LocalStatus::Failure(FailureReason::Declined),
        "voided" => LocalStatus::Failure(FailureReason::Voided),
        "expired" => LocalStatus::Failure(FailureReason::Expired),
        "sent" | "delivered" => LocalStatus::Pending,
        other if contains_ignore_case(&polling.pending_states, other) => LocalStatus::Pending,
        other if contains_ignore_case(&polling.error_states, other) => LocalStatus::Failure(FailureReason::ProviderError),
        _ => LocalStatus::Pending,
    }
}

/// True when the status is one the mapping knows about, built in or configured.
pub fn is_recognized_status(provider_status: &str, polling: &PollingConfig) -> bool {
    let status = provider_status.trim().to_ascii_lowercase();
    matches!(status.as_str(), "completed" | "declined" | "voided" | "expired" | "sent" | "delivered")
        || contains_ignore_case(&polling.pending_states, &status)
        || contains_ignore_case(&polling.error_states, &status)
}
