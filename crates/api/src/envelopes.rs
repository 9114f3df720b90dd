//! Envelope submission.

use std::sync::Arc;

use signflow_types::{
    AccessToken, Document, EnvelopeDefinition, EnvelopeDocument, EnvelopeSummary, Recipients, SignHereTab, Signatory, Signer,
    SignerTabs,
};
use signflow_util::config::{EnvelopeConfig, RetryClass, SignflowConfig};
use signflow_util::{ValidationError, validate_submission};
use tracing::{info, warn};

use crate::auth::Authenticator;
use crate::error::{SendError, SubmissionError, provider_message};
use crate::transport::{HttpRequest, HttpTransport};

/// An envelope the provider accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedEnvelope {
    pub envelope_id: String,
    /// Provider status at creation, normally `sent`.
    pub status: Option<String>,
    pub account_id: String,
}

/// Account the API calls go to: the one reported with the token, else the
/// configured one.
pub fn account_for(token: &AccessToken, config: &SignflowConfig) -> String {
    token
        .account_id
        .clone()
        .unwrap_or_else(|| config.provider.account_id.clone())
}

/// Build the request body: one document, one signer per signatory in order.
pub fn build_envelope_definition(
    envelope: &EnvelopeConfig,
    document: &Document,
    signatories: &[Signatory],
    subject: &str,
) -> EnvelopeDefinition {
    let signers = signatories
        .iter()
        .enumerate()
        .map(|(index, signatory)| {
            let position = index + 1;
            Signer {
                email: signatory.email.trim().to_string(),
                name: signatory.name.trim().to_string(),
                recipient_id: position.to_string(),
                routing_order: position.to_string(),
                tabs: SignerTabs {
                    sign_here_tabs: vec![SignHereTab {
                        anchor_string: envelope.anchor_for(position),
                        anchor_units: envelope.anchor_units.clone(),
                        anchor_x_offset: envelope.anchor_x_offset.clone(),
                        anchor_y_offset: envelope.anchor_y_offset.clone(),
                    }],
                },
            }
        })
        .collect();

    EnvelopeDefinition {
        email_subject: subject.to_string(),
        documents: vec![EnvelopeDocument {
            document_id: "1".to_string(),
            name: envelope.document_name.clone(),
            document_base64: document.as_base64().trim().to_string(),
            file_extension: envelope.file_extension.clone(),
        }],
        recipients: Recipients { signers },
        status: "sent".to_string(),
    }
}

pub struct EnvelopeSender {
    config: Arc<SignflowConfig>,
    transport: Arc<dyn HttpTransport>,
    authenticator: Arc<Authenticator>,
}

impl EnvelopeSender {
    pub fn new(config: Arc<SignflowConfig>, transport: Arc<dyn HttpTransport>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            config,
            transport,
            authenticator,
        }
    }

    /// Validate, authenticate, and submit an envelope for signature.
    ///
    /// Validation runs first and aggregates every violation; nothing touches
    /// the network for an invalid submission. The returned identifier is not
    /// persisted here.
    pub async fn send(&self, document: Option<&Document>, signatories: &[Signatory], subject: &str) -> Result<SubmittedEnvelope, SendError> {
        validate_submission(document, signatories, self.config.validation.min_document_length)?;
        let document = document.ok_or_else(|| ValidationError::single("document is required"))?;

        let token = self.authenticator.access_token().await?;
        let account_id = account_for(&token, &self.config);
        let url = self.config.envelopes_url(&account_id);
        let definition = build_envelope_definition(&self.config.envelope, document, signatories, subject);
        let body = serde_json::to_string(&definition).map_err(|error| SubmissionError::Encoding {
            message: error.to_string(),
        })?;

        let policy = self.config.retry.policy(RetryClass::Envelope);
        let result = policy
            .execute_if("envelope_submit", || self.post_envelope(&url, &token, &body), SubmissionError::is_retryable)
            .await;

        let summary = match result {
            Ok(summary) => summary,
            Err(error) => {
                if matches!(error, SubmissionError::Unauthorized { .. }) {
                    self.authenticator.invalidate();
                }
                warn!(account_id = %account_id, error = %error, "envelope submission failed");
                return Err(error.into());
            }
        };

        let envelope_id = summary.envelope_id.unwrap_or_default();
        info!(
            envelope_id = %envelope_id,
            account_id = %account_id,
            signer_count = signatories.len(),
            "envelope submitted"
        );
        Ok(SubmittedEnvelope {
            envelope_id,
            status: summary.status,
            account_id,
        })
    }

    async fn post_envelope(&self, url: &str, token: &AccessToken, body: &str) -> Result<EnvelopeSummary, SubmissionError> {
        let request = HttpRequest::post(url)
            .header("Authorization", token.bearer())
            .header("Content-Type", "application/json")
            .body(body)
            .timeout(self.config.timeouts.envelope_request());

        let response = self.transport.send(request).await?;
        match response.status {
            201 => {
                let summary: EnvelopeSummary = response.json().unwrap_or_default();
                match summary.envelope_id.as_deref() {
                    Some(id) if !id.trim().is_empty() => Ok(summary),
                    _ => Err(SubmissionError::MissingEnvelopeId),
                }
            }
            401 => Err(SubmissionError::Unauthorized {
                message: provider_message(&response),
            }),
            status => Err(SubmissionError::rejected(status, provider_message(&response))),
        }
    }
}
