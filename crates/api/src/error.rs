//! Error types for provider operations.
//!
//! Each operation class has its own error so that callers can apply the
//! right policy: authentication failures halt the current operation,
//! submission failures are reported, and query failures are mostly transient.

use signflow_types::ProviderErrorBody;
use signflow_util::{ValidationError, redact_sensitive};
use thiserror::Error;

use crate::transport::{HttpResponse, TransportError};

const MAX_LOGGED_BODY: usize = 512;

/// Status codes worth another attempt even though the server answered.
fn is_transient_status(status: u16) -> bool {
    status >= 500 || status == 408 || status == 429
}

/// The provider's `message` (or `errorCode`) from an error body, falling back
/// to the redacted raw body.
pub(crate) fn provider_message(response: &HttpResponse) -> String {
    let parsed: ProviderErrorBody = response.json().unwrap_or_default();
    if let Some(message) = parsed.message.filter(|message| !message.trim().is_empty()) {
        return match parsed.error_code {
            Some(code) => format!("{code}: {message}"),
            None => message,
        };
    }
    if let Some(code) = parsed.error_code {
        return code;
    }
    let mut body = redact_sensitive(response.body.trim());
    if body.len() > MAX_LOGGED_BODY {
        let mut cut = MAX_LOGGED_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

/// Failure to obtain an access token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("token request rejected (HTTP {status}): {description}")]
    Rejected { status: u16, description: String },

    #[error("token response did not contain '{field}'")]
    MissingToken { field: String },

    #[error("assertion signing failed: {message}")]
    Signing { message: String },
}

impl AuthError {
    pub fn rejected(status: u16, description: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            description: description.into(),
        }
    }

    pub fn missing_token(field: impl Into<String>) -> Self {
        Self::MissingToken { field: field.into() }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            AuthError::Transport(_) => true,
            AuthError::Rejected { status, .. } => is_transient_status(*status),
            AuthError::MissingToken { .. } | AuthError::Signing { .. } => false,
        }
    }
}

/// The provider did not accept the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("envelope submission failed: {0}")]
    Transport(#[from] TransportError),

    #[error("envelope submission unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("envelope submission rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("envelope response did not contain an envelopeId")]
    MissingEnvelopeId,

    #[error("could not encode envelope: {message}")]
    Encoding { message: String },
}

impl SubmissionError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            SubmissionError::Transport(_) => true,
            SubmissionError::Rejected { status, .. } => is_transient_status(*status),
            SubmissionError::Unauthorized { .. } | SubmissionError::MissingEnvelopeId | SubmissionError::Encoding { .. } => false,
        }
    }
}

/// Failure to read an envelope's status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("status query failed: {0}")]
    Transport(#[from] TransportError),

    #[error("status query unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("status query unavailable (HTTP {status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("status query rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("status response malformed: {message}")]
    Malformed { message: String },
}

impl QueryError {
    /// Classify a non-200 answer.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Unauthorized { message },
            status if is_transient_status(status) => Self::Unavailable { status, message },
            status => Self::Rejected { status, message },
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed { message: message.into() }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, QueryError::Transport(_) | QueryError::Unavailable { .. } | QueryError::Malformed { .. })
    }
}

/// Any reason `EnvelopeSender::send` can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_errors_are_classified_by_status() {
        assert!(matches!(QueryError::from_status(401, "expired"), QueryError::Unauthorized { .. }));
        assert!(matches!(QueryError::from_status(503, "down"), QueryError::Unavailable { .. }));
        assert!(matches!(QueryError::from_status(429, "slow down"), QueryError::Unavailable { .. }));
        assert!(matches!(QueryError::from_status(404, "unknown envelope"), QueryError::Rejected { .. }));
    }

    #[test]
    fn retryability() {
        assert!(AuthError::Transport(TransportError::network("reset")).is_retryable());
        assert!(!AuthError::rejected(400, "invalid_grant").is_retryable());
        assert!(SubmissionError::rejected(502, "bad gateway").is_retryable());
        assert!(!SubmissionError::rejected(400, "INVALID_EMAIL_ADDRESS_FOR_RECIPIENT").is_retryable());
        assert!(QueryError::malformed("no status").is_retryable());
        assert!(!QueryError::from_status(404, "").is_retryable());
    }

    #[test]
    fn provider_message_prefers_structured_body() {
        let response = HttpResponse::new(
            400,
            r#"{"errorCode":"ENVELOPE_IS_INCOMPLETE","message":"The Envelope is not Complete."}"#,
        );
        assert_eq!(provider_message(&response), "ENVELOPE_IS_INCOMPLETE: The Envelope is not Complete.");
        assert_eq!(provider_message(&HttpResponse::new(502, " upstream down ")), "upstream down");
    }
}
