//! Workflow entry points.
//!
//! The host calls [`SignatureHooks::submit`] when a process reaches the
//! signature task and [`SignatureHooks::poll`] on every scheduled trigger
//! afterwards. Both return the advance signal: `true` only once the envelope
//! is completed. Failures are recorded in the signature status field and
//! logged; they never escape as panics or errors.
//!
//! A successful submission does not advance the process. Polling starts on
//! the next trigger.

use std::sync::Arc;

use signflow_api::{
    AuthError, Authenticator, EnvelopeSender, HttpTransport, QueryError, SendError, StatusQuery, SubmittedEnvelope,
    TokenSource,
};
use signflow_types::{Document, ProcessStatusCode};
use signflow_util::config::SignflowConfig;
use signflow_util::{CacheStore, Clock, RuntimeError, run_blocking};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::bridge::{FieldStore, FieldStoreError, ProcessStateBridge};
use crate::document::{DocumentSource, DocumentSourceError};
use crate::poller::{PollOutcome, StatusPoller};

/// Per-invocation context supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookContext {
    /// Process instance number, appended to the email subject.
    pub process_instance: Option<String>,
}

impl HookContext {
    pub fn for_instance(process_instance: impl Into<String>) -> Self {
        Self {
            process_instance: Some(process_instance.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum HookFailure {
    #[error("authentication failed: {0}")]
    Token(#[from] AuthError),

    #[error("envelope could not be sent: {0}")]
    Send(SendError),

    #[error("document unavailable: {0}")]
    Document(#[from] DocumentSourceError),

    #[error("status query failed: {0}")]
    Query(#[from] QueryError),

    #[error("hook could not run: {0}")]
    Runtime(#[from] RuntimeError),
}

impl From<SendError> for HookFailure {
    fn from(error: SendError) -> Self {
        match error {
            SendError::Auth(error) => HookFailure::Token(error),
            other => HookFailure::Send(other),
        }
    }
}

/// What an invocation did.
#[derive(Debug, Default)]
pub struct HookReport {
    pub advance: bool,
    /// Status code written during this invocation, if any.
    pub recorded: Option<ProcessStatusCode>,
    /// Envelope created during this invocation.
    pub envelope_id: Option<String>,
    /// A process field write that failed after the provider call succeeded.
    /// Does not make the invocation a failure.
    pub bookkeeping_error: Option<FieldStoreError>,
    pub failure: Option<HookFailure>,
}

impl HookReport {
    fn idle(advance: bool) -> Self {
        Self {
            advance,
            ..Self::default()
        }
    }

    fn failed(recorded: Option<ProcessStatusCode>, failure: HookFailure) -> Self {
        Self {
            recorded,
            failure: Some(failure),
            ..Self::default()
        }
    }
}

/// Collaborators injected into [`SignatureHooks`].
pub struct HookServices {
    pub token_source: Arc<dyn TokenSource>,
    pub transport: Arc<dyn HttpTransport>,
    pub cache: Arc<dyn CacheStore>,
    pub clock: Arc<dyn Clock>,
    pub fields: Arc<dyn FieldStore>,
    pub documents: Arc<dyn DocumentSource>,
}

pub struct SignatureHooks {
    config: Arc<SignflowConfig>,
    authenticator: Arc<Authenticator>,
    sender: EnvelopeSender,
    poller: StatusPoller,
    bridge: ProcessStateBridge,
    documents: Arc<dyn DocumentSource>,
}

impl SignatureHooks {
    pub fn new(config: Arc<SignflowConfig>, services: HookServices) -> Self {
        let authenticator = Arc::new(Authenticator::new(&config, services.token_source, services.cache.clone()));
        let sender = EnvelopeSender::new(config.clone(), services.transport.clone(), authenticator.clone());
        let query = StatusQuery::new(config.clone(), services.transport);
        let poller = StatusPoller::new(config.clone(), query, services.cache, services.clock);
        let bridge = ProcessStateBridge::new(&config, services.fields);
        Self {
            config,
            authenticator,
            sender,
            poller,
            bridge,
            documents: services.documents,
        }
    }

    pub fn bridge(&self) -> &ProcessStateBridge {
        &self.bridge
    }

    /// Submit the process document for signature. Always returns `false`.
    pub async fn submit(&self, ctx: &HookContext) -> bool {
        self.submit_report(ctx).await.advance
    }

    /// Check the envelope once; `true` when the process may advance.
    pub async fn poll(&self, ctx: &HookContext) -> bool {
        self.poll_report(ctx).await.advance
    }

    /// [`SignatureHooks::submit`] for synchronous hosts.
    pub fn submit_blocking(&self, ctx: &HookContext) -> bool {
        run_blocking(self.submit(ctx)).unwrap_or_else(|error| {
            error!(error = %error, "submit hook could not run");
            false
        })
    }

    /// [`SignatureHooks::poll`] for synchronous hosts.
    pub fn poll_blocking(&self, ctx: &HookContext) -> bool {
        run_blocking(self.poll(ctx)).unwrap_or_else(|error| {
            error!(error = %error, "poll hook could not run");
            false
        })
    }

    fn subject_for(&self, ctx: &HookContext) -> String {
        let base = self.config.envelope.email_subject.as_str();
        match ctx.process_instance.as_deref().map(str::trim) {
            Some(instance) if !instance.is_empty() => format!("{base} - {instance}"),
            _ => base.to_string(),
        }
    }

    /// Write `code`, logging a failed write. Returns the code when stored.
    fn record(&self, code: ProcessStatusCode) -> Option<ProcessStatusCode> {
        match self.bridge.record_status(code) {
            Ok(()) => Some(code),
            Err(error) => {
                error!(status = %code, error = %error, "could not record signature status");
                None
            }
        }
    }

    pub async fn submit_report(&self, ctx: &HookContext) -> HookReport {
        if let Some(envelope_id) = self.bridge.envelope_id() {
            info!(envelope_id = %envelope_id, "envelope already submitted; skipping send");
            return HookReport::idle(false);
        }

        let document = match self.load_document() {
            Ok(document) => document,
            Err(failure) => {
                error!(error = %failure, "document source failed");
                return HookReport::failed(self.record(ProcessStatusCode::FatalError), failure.into());
            }
        };
        let signatories = self.bridge.signatories();
        let subject = self.subject_for(ctx);

        match self.sender.send(document.as_ref(), &signatories, &subject).await {
            Ok(submitted) => self.after_send(submitted),
            Err(send_error) => {
                let code = match send_error {
                    SendError::Auth(_) => ProcessStatusCode::TokenFailure,
                    SendError::Validation(_) | SendError::Submission(_) => ProcessStatusCode::SendFailure,
                };
                warn!(status = %code, error = %send_error, "envelope send failed");
                HookReport::failed(self.record(code), send_error.into())
            }
        }
    }

    fn load_document(&self) -> Result<Option<Document>, DocumentSourceError> {
        match self.bridge.document_id() {
            Some(document_id) => self.documents.fetch_base64(&document_id).map(Some),
            None => Ok(None),
        }
    }

    fn after_send(&self, submitted: SubmittedEnvelope) -> HookReport {
        if let Err(store_error) = self.bridge.record_envelope_id(&submitted.envelope_id) {
            // The envelope exists at the provider; the host has to reconcile the id.
            error!(envelope_id = %submitted.envelope_id, error = %store_error, "envelope sent but id could not be recorded");
            return HookReport {
                envelope_id: Some(submitted.envelope_id),
                bookkeeping_error: Some(store_error),
                ..HookReport::default()
            };
        }
        info!(envelope_id = %submitted.envelope_id, "envelope sent; awaiting signatures");
        HookReport {
            recorded: self.record(ProcessStatusCode::Pending),
            envelope_id: Some(submitted.envelope_id),
            ..HookReport::default()
        }
    }

    pub async fn poll_report(&self, ctx: &HookContext) -> HookReport {
        let stored = self.bridge.signature_status();
        if let Some(code) = stored
            && code.is_terminal()
        {
            info!(status = %code, "signature status already terminal; not polling");
            return HookReport::idle(code == ProcessStatusCode::Success);
        }

        let Some(envelope_id) = self.bridge.envelope_id() else {
            info!("no envelope recorded; submitting first");
            return self.submit_report(ctx).await;
        };

        // The window closes even while the token exchange keeps failing.
        let outcome = match self.poller.check_window(&envelope_id) {
            Some(timed_out) => timed_out,
            None => match self.poll_with_reauth(&envelope_id).await {
                Ok(outcome) => outcome,
                Err(failure) => {
                    warn!(envelope_id = %envelope_id, error = %failure, "poll failed; will retry on next trigger");
                    return HookReport::failed(None, failure);
                }
            },
        };

        let code = outcome.code();
        let recorded = if stored == Some(code) { None } else { self.record(code) };
        HookReport {
            advance: code == ProcessStatusCode::Success,
            recorded,
            ..HookReport::default()
        }
    }

    /// Poll once; on a 401 drop the cached token and try once more.
    async fn poll_with_reauth(&self, envelope_id: &str) -> Result<PollOutcome, HookFailure> {
        let token = self.authenticator.access_token().await?;
        match self.poller.poll(envelope_id, &token).await {
            Err(QueryError::Unauthorized { message }) => {
                warn!(envelope_id, message = %message, "status query unauthorized; re-authenticating");
                self.authenticator.invalidate();
                let token = self.authenticator.access_token().await?;
                Ok(self.poller.poll(envelope_id, &token).await?)
            }
            result => Ok(result?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::MemoryFieldStore;
    use crate::document::MemoryDocumentSource;
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};
    use signflow_api::testing::{ScriptedTransport, StaticSigner};
    use signflow_api::JwtGrantSource;
    use signflow_util::{ManualClock, MemoryCache};
    use std::time::Duration;

    const ENVELOPE_FIELD: &str = "docusign_envelope_id";
    const STATUS_FIELD: &str = "assDocSignPropoente";

    struct Harness {
        hooks: SignatureHooks,
        transport: Arc<ScriptedTransport>,
        fields: Arc<MemoryFieldStore>,
        clock: Arc<ManualClock>,
    }

    fn config() -> SignflowConfig {
        let mut config = SignflowConfig::default();
        config.provider.integration_key = "client-id".into();
        config.provider.user_id = "user-guid".into();
        config.provider.account_id = "acc-1".into();
        config.provider.private_key_path = "/etc/signflow/key.pem".into();
        config.retry.max_token_retries = 1;
        config.retry.max_envelope_retries = 1;
        config.retry.max_status_retries = 1;
        config
    }

    fn harness(fields: &[(&str, &str)]) -> Harness {
        harness_with(config(), fields)
    }

    fn harness_with(config: SignflowConfig, fields: &[(&str, &str)]) -> Harness {
        let config = Arc::new(config);
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()));
        let transport = Arc::new(ScriptedTransport::new());
        let field_store = Arc::new(MemoryFieldStore::with_fields(fields.iter().copied()));
        let documents = MemoryDocumentSource::new().with_document("doc-7", Document::from_bytes(&[b'%'; 200]));
        let token_source = JwtGrantSource::new(&config, transport.clone(), Arc::new(StaticSigner), clock.clone());

        let hooks = SignatureHooks::new(
            config,
            HookServices {
                token_source: Arc::new(token_source),
                transport: transport.clone(),
                cache: Arc::new(MemoryCache::with_clock(clock.clone())),
                clock: clock.clone(),
                fields: field_store.clone(),
                documents: Arc::new(documents),
            },
        );
        Harness {
            hooks,
            transport,
            fields: field_store,
            clock,
        }
    }

    fn field(harness: &Harness, name: &str) -> Option<String> {
        harness.fields.get(name)
    }

    const READY: &[(&str, &str)] = &[
        ("documento_id_field", "doc-7"),
        ("assinante_nome", "Ana Souza"),
        ("assinante_email", "ana@example.com"),
    ];

    #[tokio::test]
    async fn absent_document_is_a_send_failure_without_network() {
        let h = harness(&[("assinante_nome", "Ana"), ("assinante_email", "ana@example.com")]);

        let report = h.hooks.submit_report(&HookContext::default()).await;

        assert!(!report.advance);
        let Some(HookFailure::Send(SendError::Validation(error))) = &report.failure else {
            panic!("expected validation failure, got {:?}", report.failure);
        };
        assert!(error.mentions("document"));
        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("FALHA_ENVIO"));
        assert_eq!(h.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn successful_send_records_id_and_pending() {
        let h = harness(READY);
        h.transport.push_json(200, json!({ "access_token": "tok1" }));
        h.transport.push_json(201, json!({ "envelopeId": "env-123" }));

        let report = h.hooks.submit_report(&HookContext::for_instance("1042")).await;

        assert!(!report.advance);
        assert!(report.failure.is_none());
        assert_eq!(report.recorded, Some(ProcessStatusCode::Pending));
        assert_eq!(field(&h, ENVELOPE_FIELD).as_deref(), Some("env-123"));
        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("PENDENTE"));

        let body: Value = serde_json::from_str(h.transport.requests()[1].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["emailSubject"], "Documento para Assinatura Fluig - 1042");
    }

    #[tokio::test]
    async fn existing_envelope_is_never_resent() {
        let h = harness(&[("docusign_envelope_id", "env-123"), ("documento_id_field", "doc-7")]);

        assert!(!h.hooks.submit(&HookContext::default()).await);
        assert_eq!(h.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn completed_envelope_advances_process() {
        let h = harness(&[(ENVELOPE_FIELD, "env-123"), (STATUS_FIELD, "PENDENTE")]);
        h.transport.push_json(200, json!({ "access_token": "tok1" }));
        h.transport.push_json(200, json!({ "status": "completed" }));

        assert!(h.hooks.poll(&HookContext::default()).await);
        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("S"));
        assert!(h.transport.requests()[1].url.ends_with("/acc-1/envelopes/env-123"));
    }

    #[tokio::test]
    async fn pending_envelope_does_not_advance() {
        let h = harness(&[(ENVELOPE_FIELD, "env-123"), (STATUS_FIELD, "PENDENTE")]);
        h.transport.push_json(200, json!({ "access_token": "tok1" }));
        h.transport.push_json(200, json!({ "status": "delivered" }));

        let report = h.hooks.poll_report(&HookContext::default()).await;
        assert!(!report.advance);
        assert_eq!(report.recorded, None);
        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("PENDENTE"));
    }

    #[tokio::test]
    async fn declined_envelope_is_refused() {
        let h = harness(&[(ENVELOPE_FIELD, "env-123"), (STATUS_FIELD, "PENDENTE")]);
        h.transport.push_json(200, json!({ "access_token": "tok1" }));
        h.transport.push_json(200, json!({ "status": "declined" }));

        assert!(!h.hooks.poll(&HookContext::default()).await);
        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("N"));
    }

    #[tokio::test]
    async fn terminal_status_is_idempotent() {
        let h = harness(&[(ENVELOPE_FIELD, "env-123"), (STATUS_FIELD, "S")]);
        assert!(h.hooks.poll(&HookContext::default()).await);

        let h = harness(&[(ENVELOPE_FIELD, "env-123"), (STATUS_FIELD, "N")]);
        assert!(!h.hooks.poll(&HookContext::default()).await);
        assert_eq!(h.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn poll_without_envelope_submits() {
        let h = harness(READY);
        h.transport.push_json(200, json!({ "access_token": "tok1" }));
        h.transport.push_json(201, json!({ "envelopeId": "env-9" }));

        assert!(!h.hooks.poll(&HookContext::default()).await);
        assert_eq!(field(&h, ENVELOPE_FIELD).as_deref(), Some("env-9"));
    }

    #[tokio::test]
    async fn token_failure_during_poll_leaves_status() {
        let h = harness(&[(ENVELOPE_FIELD, "env-123"), (STATUS_FIELD, "PENDENTE")]);
        h.transport.push_json(400, json!({ "error": "invalid_grant" }));

        let report = h.hooks.poll_report(&HookContext::default()).await;
        assert!(matches!(report.failure, Some(HookFailure::Token(_))));
        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("PENDENTE"));
    }

    #[tokio::test]
    async fn token_failure_during_submit_is_recorded() {
        let h = harness(READY);
        h.transport.push_json(401, json!({ "error": "invalid_client" }));

        let report = h.hooks.submit_report(&HookContext::default()).await;
        assert!(matches!(report.failure, Some(HookFailure::Token(_))));
        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("FALHA_TOKEN"));
    }

    #[tokio::test]
    async fn transient_query_failure_leaves_status() {
        let h = harness(&[(ENVELOPE_FIELD, "env-123"), (STATUS_FIELD, "PENDENTE")]);
        h.transport.push_json(200, json!({ "access_token": "tok1" }));
        h.transport.push_response(503, "maintenance");

        let report = h.hooks.poll_report(&HookContext::default()).await;
        assert!(matches!(report.failure, Some(HookFailure::Query(QueryError::Unavailable { .. }))));
        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("PENDENTE"));
    }

    #[tokio::test]
    async fn rejected_query_is_retried_on_next_trigger() {
        let h = harness(&[(ENVELOPE_FIELD, "env-123"), (STATUS_FIELD, "PENDENTE")]);
        h.transport.push_json(200, json!({ "access_token": "tok1" }));
        h.transport.push_json(400, json!({ "errorCode": "TRANSIENT_GLITCH" }));

        let report = h.hooks.poll_report(&HookContext::default()).await;
        assert!(matches!(report.failure, Some(HookFailure::Query(QueryError::Rejected { status: 400, .. }))));
        assert_eq!(report.recorded, None);
        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("PENDENTE"));

        h.transport.push_json(200, json!({ "status": "completed" }));
        assert!(h.hooks.poll(&HookContext::default()).await);
        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("S"));
        assert_eq!(h.transport.request_count(), 3);
    }

    #[tokio::test]
    async fn stored_query_failure_does_not_stop_polling() {
        let h = harness(&[(ENVELOPE_FIELD, "env-123"), (STATUS_FIELD, "FALHA_CONSULTA")]);
        h.transport.push_json(200, json!({ "access_token": "tok1" }));
        h.transport.push_json(200, json!({ "status": "completed" }));

        assert!(h.hooks.poll(&HookContext::default()).await);
        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("S"));
    }

    #[tokio::test]
    async fn unauthorized_query_reauthenticates_once() {
        let h = harness(&[(ENVELOPE_FIELD, "env-123"), (STATUS_FIELD, "PENDENTE")]);
        h.transport.push_json(200, json!({ "access_token": "stale" }));
        h.transport.push_response(401, "");
        h.transport.push_json(200, json!({ "access_token": "fresh" }));
        h.transport.push_json(200, json!({ "status": "completed" }));

        assert!(h.hooks.poll(&HookContext::default()).await);
        let requests = h.transport.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[3].header_value("Authorization"), Some("Bearer fresh"));
    }

    #[tokio::test]
    async fn polling_window_expiry_times_out() {
        let h = harness(&[(ENVELOPE_FIELD, "env-123"), (STATUS_FIELD, "PENDENTE")]);
        h.transport.push_json(200, json!({ "access_token": "tok1" }));
        h.transport.push_json(200, json!({ "status": "sent" }));

        assert!(!h.hooks.poll(&HookContext::default()).await);
        h.clock.advance(Duration::from_secs(31 * 60));
        assert!(!h.hooks.poll(&HookContext::default()).await);

        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("FALHA_TIMEOUT"));
        // The second poll reused the cached token and skipped the provider.
        assert_eq!(h.transport.request_count(), 2);
    }

    #[tokio::test]
    async fn polling_window_closes_while_token_keeps_failing() {
        let h = harness(&[(ENVELOPE_FIELD, "env-123"), (STATUS_FIELD, "PENDENTE")]);
        h.transport.push_json(400, json!({ "error": "invalid_grant" }));

        let report = h.hooks.poll_report(&HookContext::default()).await;
        assert!(matches!(report.failure, Some(HookFailure::Token(_))));
        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("PENDENTE"));

        h.clock.advance(Duration::from_secs(4 * 60 * 60));
        let report = h.hooks.poll_report(&HookContext::default()).await;

        assert!(report.failure.is_none());
        assert_eq!(report.recorded, Some(ProcessStatusCode::TimedOut));
        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("FALHA_TIMEOUT"));
        // Only the failed token exchange reached the network.
        assert_eq!(h.transport.request_count(), 1);
    }

    struct FailingEnvelopeField {
        inner: MemoryFieldStore,
    }

    impl FieldStore for FailingEnvelopeField {
        fn get(&self, name: &str) -> Option<String> {
            self.inner.get(name)
        }

        fn set(&self, name: &str, value: &str) -> Result<(), FieldStoreError> {
            if name == ENVELOPE_FIELD {
                return Err(FieldStoreError::Io {
                    path: "fields.json".into(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                });
            }
            self.inner.set(name, value)
        }
    }

    #[tokio::test]
    async fn unrecorded_envelope_id_is_not_a_failed_send() {
        let config = Arc::new(config());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()));
        let transport = Arc::new(ScriptedTransport::new());
        let fields = Arc::new(FailingEnvelopeField {
            inner: MemoryFieldStore::with_fields(READY.iter().copied()),
        });
        let documents = MemoryDocumentSource::new().with_document("doc-7", Document::from_bytes(&[b'%'; 200]));
        let token_source = JwtGrantSource::new(&config, transport.clone(), Arc::new(StaticSigner), clock.clone());
        let hooks = SignatureHooks::new(
            config,
            HookServices {
                token_source: Arc::new(token_source),
                transport: transport.clone(),
                cache: Arc::new(MemoryCache::with_clock(clock.clone())),
                clock,
                fields: fields.clone(),
                documents: Arc::new(documents),
            },
        );
        transport.push_json(200, json!({ "access_token": "tok1" }));
        transport.push_json(201, json!({ "envelopeId": "env-555" }));

        let report = hooks.submit_report(&HookContext::default()).await;

        assert!(report.failure.is_none());
        assert!(!report.advance);
        assert_eq!(report.envelope_id.as_deref(), Some("env-555"));
        assert!(matches!(report.bookkeeping_error, Some(FieldStoreError::Io { .. })));
        assert_eq!(fields.get(STATUS_FIELD), None);
    }

    #[tokio::test]
    async fn missing_document_file_is_fatal() {
        let h = harness(&[
            ("documento_id_field", "doc-unknown"),
            ("assinante_nome", "Ana"),
            ("assinante_email", "ana@example.com"),
        ]);

        let report = h.hooks.submit_report(&HookContext::default()).await;
        assert!(matches!(report.failure, Some(HookFailure::Document(_))));
        assert_eq!(field(&h, STATUS_FIELD).as_deref(), Some("ERRO_FATAL"));
        assert_eq!(h.transport.request_count(), 0);
    }

    #[test]
    fn blocking_wrapper_runs_without_runtime() {
        let h = harness(&[(ENVELOPE_FIELD, "env-123"), (STATUS_FIELD, "S")]);
        assert!(h.hooks.poll_blocking(&HookContext::default()));
        assert!(!h.hooks.submit_blocking(&HookContext::default()));
    }

    #[test]
    fn custom_subject_base_is_used() {
        let mut config = config();
        config.envelope.email_subject = "Contrato".into();
        let h = harness_with(config, &[]);
        assert_eq!(h.hooks.subject_for(&HookContext::for_instance(" 7 ")), "Contrato - 7");
        assert_eq!(h.hooks.subject_for(&HookContext::default()), "Contrato");
    }
}
