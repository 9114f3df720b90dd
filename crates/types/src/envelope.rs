//! Provider wire models for the eSignature REST API.
//!
//! Field names follow the provider's camelCase JSON. Response models are
//! lenient (every field optional) so that a missing field surfaces as a typed
//! error in the caller instead of a serde failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for `POST <apiBase>/<accountId>/envelopes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDefinition {
    pub email_subject: String,
    pub documents: Vec<EnvelopeDocument>,
    pub recipients: Recipients,
    /// `"sent"` submits immediately; `"created"` would leave a draft.
    pub status: String,
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDocument {
    pub document_id: String,
    pub name: String,
    pub document_base64: String,
    pub file_extension: String,
}

impl std::fmt::Debug for EnvelopeDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeDocument")
            .field("document_id", &self.document_id)
            .field("name", &self.name)
            .field("document_base64_len", &self.document_base64.len())
            .field("file_extension", &self.file_extension)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipients {
    pub signers: Vec<Signer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    pub email: String,
    pub name: String,
    pub recipient_id: String,
    pub routing_order: String,
    pub tabs: SignerTabs,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignerTabs {
    pub sign_here_tabs: Vec<SignHereTab>,
}

/// Signature field placed by the provider next to a text anchor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignHereTab {
    pub anchor_string: String,
    pub anchor_units: String,
    pub anchor_x_offset: String,
    pub anchor_y_offset: String,
}

/// Response body of a successful envelope submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeSummary {
    #[serde(default)]
    pub envelope_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_date_time: Option<String>,
}

/// Response body of `GET <apiBase>/<accountId>/envelopes/<envelopeId>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeStatusReport {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_date_time: Option<String>,
    #[serde(default)]
    pub completed_date_time: Option<String>,
    #[serde(default)]
    pub declined_date_time: Option<String>,
    #[serde(default)]
    pub voided_date_time: Option<String>,
    #[serde(default)]
    pub recipients: Option<Value>,
}

/// Error body returned by the eSignature API on non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderErrorBody {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// OAuth token endpoint response, success and failure shapes merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Token proxy response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyTokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}
