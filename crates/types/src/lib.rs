//! Shared type definitions for the Signflow workspace.
//!
//! These types are used by the API client, the polling engine, and the
//! operator harness. They carry no behavior beyond small conveniences:
//!
//! - [`Signatory`] and [`Document`] describe what gets sent for signature
//! - [`AccessToken`] is the bearer credential handed out by the authenticator
//! - [`ProcessStatusCode`] is the vocabulary written back to the host process
//! - [`envelope`] holds the provider wire models

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod envelope;

pub use envelope::*;

/// A person who must sign, identified by name and email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signatory {
    pub name: String,
    pub email: String,
}

impl Signatory {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Document content encoded as a standard base64 string.
///
/// The content is not validated on construction; the envelope sender checks
/// length and decodability before anything is submitted.
#[derive(Clone, PartialEq, Eq)]
pub struct Document(String);

impl Document {
    /// Wrap an already base64-encoded payload.
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encode raw bytes (for example a PDF read from disk).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(STANDARD.encode(bytes))
    }

    pub fn as_base64(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Decode the payload, returning `None` when it is not valid base64.
    pub fn decode(&self) -> Option<Vec<u8>> {
        STANDARD.decode(self.0.trim()).ok()
    }
}

// Documents can be several megabytes; never dump them into logs.
impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").field("base64_len", &self.0.len()).finish()
    }
}

/// Bearer credential presented on provider API calls.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub value: String,
    pub obtained_at: DateTime<Utc>,
    /// Account reported by the token proxy, overriding the configured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, obtained_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            obtained_at,
            account_id: None,
        }
    }

    pub fn with_account_id(mut self, account_id: Option<String>) -> Self {
        self.account_id = account_id.filter(|id| !id.trim().is_empty());
        self
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Status written to the host process `signatureStatus` field.
///
/// The literal stored in the field comes from the configured status
/// vocabulary; this enum is the semantic side of that mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatusCode {
    Pending,
    Success,
    /// Declined, voided, expired, or a provider error state.
    Refused,
    TokenFailure,
    SendFailure,
    QueryFailure,
    FatalError,
    TimedOut,
}

impl ProcessStatusCode {
    pub const ALL: [ProcessStatusCode; 8] = [
        ProcessStatusCode::Pending,
        ProcessStatusCode::Success,
        ProcessStatusCode::Refused,
        ProcessStatusCode::TokenFailure,
        ProcessStatusCode::SendFailure,
        ProcessStatusCode::QueryFailure,
        ProcessStatusCode::FatalError,
        ProcessStatusCode::TimedOut,
    ];

    /// Whether polling must stop once this code has been written.
    ///
    /// `TokenFailure` and `QueryFailure` are not terminal: a later trigger
    /// may authenticate or reach the provider again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProcessStatusCode::Success
                | ProcessStatusCode::Refused
                | ProcessStatusCode::SendFailure
                | ProcessStatusCode::FatalError
                | ProcessStatusCode::TimedOut
        )
    }
}

impl fmt::Display for ProcessStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProcessStatusCode::Pending => "pending",
            ProcessStatusCode::Success => "success",
            ProcessStatusCode::Refused => "refused",
            ProcessStatusCode::TokenFailure => "token_failure",
            ProcessStatusCode::SendFailure => "send_failure",
            ProcessStatusCode::QueryFailure => "query_failure",
            ProcessStatusCode::FatalError => "fatal_error",
            ProcessStatusCode::TimedOut => "timed_out",
        };
        f.write_str(label)
    }
}
