//! Input checks run before anything is sent to the provider.
//!
//! Every check returns the list of violations instead of stopping at the
//! first one, so a caller can report all problems with a submission at once.

use once_cell::sync::Lazy;
use regex::Regex;
use signflow_types::{Document, Signatory};
use thiserror::Error;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex should compile"));

/// One or more problems with a document or its signatories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", .violations.join("; "))]
pub struct ValidationError {
    pub violations: Vec<String>,
}

impl ValidationError {
    pub fn new(violations: Vec<String>) -> Self {
        Self { violations }
    }

    pub fn single(violation: impl Into<String>) -> Self {
        Self {
            violations: vec![violation.into()],
        }
    }

    /// True when any violation mentions `needle` (case-insensitive).
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.violations.iter().any(|violation| violation.to_lowercase().contains(&needle))
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn is_not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Check one signatory. `position` is 1-based and only used in messages.
pub fn validate_signatory(signatory: &Signatory, position: usize) -> Vec<String> {
    let mut violations = Vec::new();
    if !is_not_blank(&signatory.name) {
        violations.push(format!("signatory {position}: name is required"));
    }
    if !is_valid_email(signatory.email.trim()) {
        violations.push(format!("signatory {position}: email '{}' is not a valid address", signatory.email));
    }
    violations
}

/// Check the recipient list as a whole and each entry in it.
pub fn validate_signatories(signatories: &[Signatory]) -> Vec<String> {
    if signatories.is_empty() {
        return vec!["at least one signatory is required".to_string()];
    }
    signatories
        .iter()
        .enumerate()
        .flat_map(|(index, signatory)| validate_signatory(signatory, index + 1))
        .collect()
}

/// Check that the document is present, long enough to be plausible, and
/// decodable base64.
pub fn validate_document(document: Option<&Document>, min_length: usize) -> Vec<String> {
    let Some(document) = document.filter(|document| !document.is_empty()) else {
        return vec!["document is required".to_string()];
    };

    let mut violations = Vec::new();
    if document.len() < min_length {
        violations.push(format!(
            "document base64 is too short ({} characters, minimum {min_length})",
            document.len()
        ));
    }
    if document.decode().is_none() {
        violations.push("document is not valid base64".to_string());
    }
    violations
}

/// Validate a full submission, aggregating every violation.
pub fn validate_submission(document: Option<&Document>, signatories: &[Signatory], min_document_length: usize) -> Result<(), ValidationError> {
    let mut violations = validate_document(document, min_document_length);
    violations.extend(validate_signatories(signatories));
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_document() -> Document {
        Document::from_bytes(&[b'%'; 120])
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("jose.junior@example.com.br"));
        assert!(!is_valid_email("jose.junior@example"));
        assert!(!is_valid_email("jose junior@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn aggregates_all_violations() {
        let signatories = vec![Signatory::new("", "bad-email"), Signatory::new("Ana", "ana@example.com")];
        let error = validate_submission(None, &signatories, 100).unwrap_err();

        assert_eq!(error.violations.len(), 3);
        assert!(error.mentions("document"));
        assert!(error.mentions("signatory 1: name"));
        assert!(error.mentions("signatory 1: email"));
    }

    #[test]
    fn short_document_is_rejected_with_configurable_minimum() {
        let document = Document::from_bytes(b"tiny");
        assert!(!validate_document(Some(&document), 100).is_empty());
        assert!(validate_document(Some(&document), 4).is_empty());
    }

    #[test]
    fn undecodable_document_is_rejected() {
        let document = Document::from_base64("@".repeat(200));
        let violations = validate_document(Some(&document), 100);
        assert_eq!(violations, vec!["document is not valid base64".to_string()]);
    }

    #[test]
    fn empty_recipient_list_is_rejected() {
        assert!(validate_submission(Some(&pdf_document()), &[], 100).is_err());
    }

    #[test]
    fn valid_submission_passes() {
        let signatories = vec![Signatory::new("Ana", "ana@example.com")];
        assert!(validate_submission(Some(&pdf_document()), &signatories, 100).is_ok());
    }
}
