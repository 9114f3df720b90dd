//! Envelope status queries.

use std::sync::Arc;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use signflow_types::{AccessToken, EnvelopeStatusReport};
use signflow_util::config::{RetryClass, SignflowConfig};
use tracing::debug;

use crate::envelopes::account_for;
use crate::error::{QueryError, provider_message};
use crate::transport::{HttpRequest, HttpTransport};

/// Characters escaped in a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'#').add(b'%').add(b'/').add(b'?').add(b'<').add(b'>').add(b'`').add(b'{').add(b'}');

pub struct StatusQuery {
    config: Arc<SignflowConfig>,
    transport: Arc<dyn HttpTransport>,
}

impl StatusQuery {
    pub fn new(config: Arc<SignflowConfig>, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// URL of a single envelope.
    pub fn envelope_url(&self, envelope_id: &str, token: &AccessToken) -> String {
        let account_id = account_for(token, &self.config);
        format!(
            "{}/{}",
            self.config.envelopes_url(&account_id),
            utf8_percent_encode(envelope_id.trim(), PATH_SEGMENT)
        )
    }

    /// Read the current provider status of an envelope.
    ///
    /// Transient failures are retried with the status budget; a 401 or other
    /// 4xx is returned after the first attempt.
    pub async fn fetch(&self, envelope_id: &str, token: &AccessToken) -> Result<EnvelopeStatusReport, QueryError> {
        let url = self.envelope_url(envelope_id, token);
        let policy = self.config.retry.policy(RetryClass::Status);
        let report = policy
            .execute_if("status_query", || self.fetch_once(&url, token), QueryError::is_retryable)
            .await?;
        debug!(envelope_id, status = report.status.as_deref().unwrap_or_default(), "envelope status fetched");
        Ok(report)
    }

    async fn fetch_once(&self, url: &str, token: &AccessToken) -> Result<EnvelopeStatusReport, QueryError> {
        let request = HttpRequest::get(url)
            .header("Authorization", token.bearer())
            .timeout(self.config.timeouts.status_request());

        let response = self.transport.send(request).await?;
        if response.status != 200 {
            return Err(QueryError::from_status(response.status, provider_message(&response)));
        }

        let report: EnvelopeStatusReport = response
            .json()
            .map_err(|error| QueryError::malformed(format!("invalid status body: {error}")))?;
        match report.status.as_deref() {
            Some(status) if !status.trim().is_empty() => Ok(report),
            _ => Err(QueryError::malformed("response has no status")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use chrono::Utc;
    use serde_json::json;

    fn query(transport: Arc<ScriptedTransport>) -> StatusQuery {
        let mut config = SignflowConfig::default();
        config.provider.account_id = "acc-1".into();
        config.retry.initial_delay_ms = 10;
        StatusQuery::new(Arc::new(config), transport)
    }

    fn token() -> AccessToken {
        AccessToken::new("tok-1", Utc::now())
    }

    #[tokio::test]
    async fn completed_report_is_returned() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            200,
            json!({
                "status": "completed",
                "statusDateTime": "2025-03-01T12:00:00Z",
                "completedDateTime": "2025-03-01T12:00:00Z"
            }),
        );
        let query = query(transport.clone());

        let report = query.fetch("env-1", &token()).await.unwrap();
        assert_eq!(report.status.as_deref(), Some("completed"));
        assert_eq!(report.completed_date_time.as_deref(), Some("2025-03-01T12:00:00Z"));

        let request = &transport.requests()[0];
        assert_eq!(request.url, "https://demo.docusign.net/restapi/v2.1/accounts/acc-1/envelopes/env-1");
        assert_eq!(request.header_value("authorization"), Some("Bearer tok-1"));
    }

    #[test]
    fn envelope_id_is_escaped() {
        let query = query(Arc::new(ScriptedTransport::new()));
        assert!(query.envelope_url("a/b c", &token()).ends_with("/envelopes/a%2Fb%20c"));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_status_is_retried_then_reported() {
        let transport = Arc::new(ScriptedTransport::new());
        for _ in 0..5 {
            transport.push_json(200, json!({ "statusDateTime": "2025-03-01T12:00:00Z" }));
        }
        let query = query(transport.clone());

        assert!(matches!(query.fetch("env-1", &token()).await, Err(QueryError::Malformed { .. })));
        assert_eq!(transport.request_count(), 5);
    }

    #[tokio::test]
    async fn unknown_envelope_is_rejected_without_retry() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(404, json!({ "errorCode": "ENVELOPE_DOES_NOT_EXIST", "message": "Invalid envelope" }));
        let query = query(transport.clone());

        assert!(matches!(query.fetch("env-x", &token()).await, Err(QueryError::Rejected { status: 404, .. })));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn unauthorized_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_response(401, "");
        let query = query(transport.clone());

        assert!(matches!(query.fetch("env-1", &token()).await, Err(QueryError::Unauthorized { .. })));
        assert_eq!(transport.request_count(), 1);
    }
}
