//! Data models for the integration configuration.
//!
//! Every section has defaults so a configuration file only needs to carry the
//! credentials and whatever it overrides. Credential defaults are `SEU_*`
//! placeholders, which [`crate::config::validate_config`] rejects.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use signflow_types::ProcessStatusCode;
use thiserror::Error;

use crate::retry::RetryPolicy;

/// Root configuration value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SignflowConfig {
    pub provider: ProviderConfig,
    pub auth: AuthConfig,
    pub jwt: JwtConfig,
    pub timeouts: TimeoutConfig,
    pub retry: RetryConfig,
    pub polling: PollingConfig,
    pub cache: CacheConfig,
    pub envelope: EnvelopeConfig,
    pub validation: ValidationConfig,
    pub fields: FieldNames,
    pub status_values: StatusValues,
}

impl SignflowConfig {
    /// Read-only lookup by dotted path, e.g. `retry.max_status_retries`.
    ///
    /// Returns `None` for unknown paths. Secrets are returned like any other
    /// value; callers must not log them.
    pub fn lookup(&self, dotted_path: &str) -> Option<Value> {
        let root = serde_json::to_value(self).ok()?;
        let mut current = &root;
        for segment in dotted_path.split('.') {
            if segment.is_empty() {
                continue;
            }
            current = current.get(segment)?;
        }
        Some(current.clone())
    }

    /// URL of the envelopes collection for `account_id`.
    pub fn envelopes_url(&self, account_id: &str) -> String {
        format!("{}/{}/envelopes", self.provider.api_base_url.trim_end_matches('/'), account_id)
    }
}

/// Provider credentials and endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// OAuth client id, used as the assertion issuer.
    pub integration_key: String,
    /// Impersonated user GUID, used as the assertion subject.
    pub user_id: String,
    pub account_id: String,
    pub private_key_path: String,
    pub auth_url: String,
    /// Base URL up to and including `/accounts`.
    pub api_base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            integration_key: "SEU_INTEGRATION_KEY_CLIENT_ID".into(),
            user_id: "SEU_USER_ID_GUID".into(),
            account_id: "SEU_DOCUSIGN_ACCOUNT_ID".into(),
            private_key_path: "/path/seguro/para/sua/chave.pem".into(),
            auth_url: "https://account-d.docusign.com/oauth/token".into(),
            api_base_url: "https://demo.docusign.net/restapi/v2.1/accounts".into(),
        }
    }
}

/// How access tokens are obtained.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// JWT-bearer grant against `provider.auth_url`.
    #[default]
    Jwt,
    /// Pre-authenticated token proxy reached through an integration service.
    Proxy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    pub url: String,
    /// Shared secret sent in the `AppToken` header.
    pub app_token: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            url: "SEU_PROXY_URL".into(),
            app_token: "SEU_APP_TOKEN".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct JwtConfig {
    pub expiration_secs: u64,
    pub audience: String,
    pub scope: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            expiration_secs: 3600,
            audience: "account-d.docusign.com".into(),
            scope: "signature impersonation".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    pub token_request_ms: u64,
    pub envelope_request_ms: u64,
    pub status_request_ms: u64,
    /// Polling window after which a non-terminal envelope is failed.
    pub max_polling_ms: u64,
}

impl TimeoutConfig {
    pub fn token_request(&self) -> Duration {
        Duration::from_millis(self.token_request_ms)
    }

    pub fn envelope_request(&self) -> Duration {
        Duration::from_millis(self.envelope_request_ms)
    }

    pub fn status_request(&self) -> Duration {
        Duration::from_millis(self.status_request_ms)
    }

    pub fn max_polling(&self) -> Duration {
        Duration::from_millis(self.max_polling_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            token_request_ms: 30_000,
            envelope_request_ms: 60_000,
            status_request_ms: 30_000,
            max_polling_ms: 1_800_000,
        }
    }
}

/// Which retry budget an operation draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Token,
    Envelope,
    Status,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_token_retries: u32,
    pub max_envelope_retries: u32,
    pub max_status_retries: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn policy(&self, class: RetryClass) -> RetryPolicy {
        let max_attempts = match class {
            RetryClass::Token => self.max_token_retries,
            RetryClass::Envelope => self.max_envelope_retries,
            RetryClass::Status => self.max_status_retries,
        };
        RetryPolicy::new(max_attempts, Duration::from_millis(self.initial_delay_ms), self.backoff_multiplier)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_token_retries: 3,
            max_envelope_retries: 3,
            max_status_retries: 5,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PollingConfig {
    /// Interval the host scheduler should use between poll triggers.
    pub interval_ms: u64,
    /// Provider states treated as still in progress.
    pub pending_states: Vec<String>,
    /// Unrecognized provider states treated as terminal errors.
    pub error_states: Vec<String>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 300_000,
            pending_states: vec!["sent".into(), "delivered".into()],
            error_states: vec!["error".into(), "failed".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Kept below the token's real lifetime as a safety margin.
    pub token_ttl_ms: u64,
    pub token_key: String,
    pub polling_start_key: String,
}

impl CacheConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_millis(self.token_ttl_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            token_ttl_ms: 3_000_000,
            token_key: "docusign_access_token".into(),
            polling_start_key: "polling_start_timestamp".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EnvelopeConfig {
    pub email_subject: String,
    pub document_name: String,
    pub file_extension: String,
    /// Text anchor for signer `n` (1-based); `{n}` is replaced by the position.
    pub anchor_template: String,
    pub anchor_units: String,
    pub anchor_x_offset: String,
    pub anchor_y_offset: String,
}

impl EnvelopeConfig {
    pub fn anchor_for(&self, position: usize) -> String {
        self.anchor_template.replace("{n}", &position.to_string())
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            email_subject: "Documento para Assinatura Fluig".into(),
            document_name: "Documento do Processo Fluig".into(),
            file_extension: "pdf".into(),
            anchor_template: "/assinar{n}/".into(),
            anchor_units: "pixels".into(),
            anchor_x_offset: "10".into(),
            anchor_y_offset: "20".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    pub min_document_length: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { min_document_length: 100 }
    }
}

/// Host process field names, by semantic role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FieldNames {
    pub envelope_id: String,
    pub signature_status: String,
    pub document_id: String,
    pub signer_name: String,
    pub signer_email: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            envelope_id: "docusign_envelope_id".into(),
            signature_status: "assDocSignPropoente".into(),
            document_id: "documento_id_field".into(),
            signer_name: "assinante_nome".into(),
            signer_email: "assinante_email".into(),
        }
    }
}

/// Literals written to the signature status field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StatusValues {
    pub pending: String,
    pub success: String,
    pub refused: String,
    pub token_failure: String,
    pub send_failure: String,
    pub query_failure: String,
    pub fatal_error: String,
    pub timed_out: String,
}

impl StatusValues {
    pub fn literal(&self, code: ProcessStatusCode) -> &str {
        match code {
            ProcessStatusCode::Pending => &self.pending,
            ProcessStatusCode::Success => &self.success,
            ProcessStatusCode::Refused => &self.refused,
            ProcessStatusCode::TokenFailure => &self.token_failure,
            ProcessStatusCode::SendFailure => &self.send_failure,
            ProcessStatusCode::QueryFailure => &self.query_failure,
            ProcessStatusCode::FatalError => &self.fatal_error,
            ProcessStatusCode::TimedOut => &self.timed_out,
        }
    }

    /// Reverse lookup of a stored field value.
    pub fn code_for(&self, literal: &str) -> Option<ProcessStatusCode> {
        let literal = literal.trim();
        ProcessStatusCode::ALL.into_iter().find(|code| self.literal(*code) == literal)
    }
}

impl Default for StatusValues {
    fn default() -> Self {
        Self {
            pending: "PENDENTE".into(),
            success: "S".into(),
            refused: "N".into(),
            token_failure: "FALHA_TOKEN".into(),
            send_failure: "FALHA_ENVIO".into(),
            query_failure: "FALHA_CONSULTA".into(),
            fatal_error: "ERRO_FATAL".into(),
            timed_out: "FALHA_TIMEOUT".into(),
        }
    }
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {}", .violations.join("; "))]
    Invalid { violations: Vec<String> },
}

impl ConfigError {
    pub fn invalid(violations: Vec<String>) -> Self {
        Self::Invalid { violations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_by_dotted_path() {
        let config = SignflowConfig::default();
        assert_eq!(config.lookup("retry.max_status_retries"), Some(json!(5)));
        assert_eq!(config.lookup("cache.token_key"), Some(json!("docusign_access_token")));
        assert_eq!(config.lookup("retry.nope"), None);
    }

    #[test]
    fn status_values_round_trip_codes() {
        let values = StatusValues::default();
        for code in ProcessStatusCode::ALL {
            assert_eq!(values.code_for(values.literal(code)), Some(code));
        }
        assert_eq!(values.code_for("unknown"), None);
    }

    #[test]
    fn retry_classes_pick_their_budget() {
        let retry = RetryConfig::default();
        assert_eq!(retry.policy(RetryClass::Token).max_attempts, 3);
        assert_eq!(retry.policy(RetryClass::Status).max_attempts, 5);
        assert_eq!(retry.policy(RetryClass::Envelope).initial_delay, Duration::from_secs(1));
    }

    #[test]
    fn anchors_follow_signer_position() {
        let envelope = EnvelopeConfig::default();
        assert_eq!(envelope.anchor_for(2), "/assinar2/");
    }

    #[test]
    fn envelopes_url_joins_account() {
        let config = SignflowConfig::default();
        assert_eq!(
            config.envelopes_url("acc-1"),
            "https://demo.docusign.net/restapi/v2.1/accounts/acc-1/envelopes"
        );
    }
}
