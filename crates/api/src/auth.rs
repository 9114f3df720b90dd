//! Access-token acquisition.
//!
//! [`Authenticator`] fronts a [`TokenSource`] with the token cache and the
//! token retry budget. Two sources exist:
//!
//! - [`JwtGrantSource`] performs the OAuth JWT-bearer grant against the
//!   provider's token endpoint, signing the assertion with an
//!   [`AssertionSigner`].
//! - [`ProxyTokenSource`] asks an integration proxy that already holds a
//!   token, authenticating with a shared `AppToken`.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use signflow_types::{AccessToken, ProxyTokenResponse, TokenResponse};
use signflow_util::config::{RetryClass, SignflowConfig};
use signflow_util::{CacheStore, Clock, RetryPolicy, redact_sensitive};
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Form value encoding that leaves the grant URN readable.
const FORM_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~').remove(b':');

/// Claims of the JWT-bearer assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
    pub scope: String,
}

/// Produces a compact, signed RS256 JWT from assertion claims.
pub trait AssertionSigner: Send + Sync {
    fn sign(&self, claims: &AssertionClaims) -> Result<String, AuthError>;
}

/// Signs assertions with an RSA private key in PEM form.
pub struct RsaPemSigner {
    key: EncodingKey,
}

impl RsaPemSigner {
    pub fn from_pem(pem: &[u8]) -> Result<Self, AuthError> {
        let key = EncodingKey::from_rsa_pem(pem).map_err(|error| AuthError::Signing {
            message: format!("invalid RSA private key: {error}"),
        })?;
        Ok(Self { key })
    }

    pub fn from_pem_file(path: &Path) -> Result<Self, AuthError> {
        let pem = fs::read(path).map_err(|error| AuthError::Signing {
            message: format!("could not read private key {}: {error}", path.display()),
        })?;
        Self::from_pem(&pem)
    }
}

impl AssertionSigner for RsaPemSigner {
    fn sign(&self, claims: &AssertionClaims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, &self.key).map_err(|error| AuthError::Signing {
            message: error.to_string(),
        })
    }
}

/// Something that can obtain a fresh access token from the network.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    async fn fetch_token(&self) -> Result<AccessToken, AuthError>;
}

/// OAuth 2.0 JWT-bearer grant.
pub struct JwtGrantSource {
    transport: Arc<dyn HttpTransport>,
    signer: Arc<dyn AssertionSigner>,
    clock: Arc<dyn Clock>,
    auth_url: String,
    issuer: String,
    subject: String,
    audience: String,
    scope: String,
    lifetime_secs: i64,
    timeout: Duration,
}

impl JwtGrantSource {
    pub fn new(
        config: &SignflowConfig,
        transport: Arc<dyn HttpTransport>,
        signer: Arc<dyn AssertionSigner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            signer,
            clock,
            auth_url: config.provider.auth_url.clone(),
            issuer: config.provider.integration_key.clone(),
            subject: config.provider.user_id.clone(),
            audience: config.jwt.audience.clone(),
            scope: config.jwt.scope.clone(),
            lifetime_secs: i64::try_from(config.jwt.expiration_secs).unwrap_or(i64::MAX),
            timeout: config.timeouts.token_request(),
        }
    }

    /// Claims for an assertion issued now.
    pub fn claims(&self) -> AssertionClaims {
        let iat = self.clock.now().timestamp();
        AssertionClaims {
            iss: self.issuer.clone(),
            sub: self.subject.clone(),
            iat,
            exp: iat.saturating_add(self.lifetime_secs),
            aud: self.audience.clone(),
            scope: self.scope.clone(),
        }
    }
}

/// Form body of the token request.
pub fn grant_form_body(assertion: &str) -> String {
    format!(
        "grant_type={}&assertion={}",
        utf8_percent_encode(JWT_BEARER_GRANT, FORM_VALUE),
        utf8_percent_encode(assertion, FORM_VALUE)
    )
}

/// Best human-readable reason from a failed token response.
fn token_error_description(response: &HttpResponse) -> String {
    let parsed: TokenResponse = response.json().unwrap_or_default();
    parsed
        .error_description
        .filter(|description| !description.trim().is_empty())
        .or(parsed.error)
        .unwrap_or_else(|| redact_sensitive(response.body.trim()))
}

#[async_trait]
impl TokenSource for JwtGrantSource {
    fn name(&self) -> &'static str {
        "jwt"
    }

    async fn fetch_token(&self) -> Result<AccessToken, AuthError> {
        let assertion = self.signer.sign(&self.claims())?;
        let request = HttpRequest::post(&self.auth_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(grant_form_body(&assertion))
            .timeout(self.timeout);

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(AuthError::rejected(response.status, token_error_description(&response)));
        }

        let parsed: TokenResponse = response.json().unwrap_or_default();
        let value = parsed
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| AuthError::missing_token("access_token"))?;
        debug!(expires_in = ?parsed.expires_in, "token issued by jwt grant");
        Ok(AccessToken::new(value, self.clock.now()))
    }
}

/// Token proxy that hands out a pre-authenticated token.
pub struct ProxyTokenSource {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    url: String,
    app_token: String,
    timeout: Duration,
}

impl ProxyTokenSource {
    pub fn new(config: &SignflowConfig, transport: Arc<dyn HttpTransport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            clock,
            url: config.auth.proxy.url.clone(),
            app_token: config.auth.proxy.app_token.clone(),
            timeout: config.timeouts.token_request(),
        }
    }
}

#[async_trait]
impl TokenSource for ProxyTokenSource {
    fn name(&self) -> &'static str {
        "proxy"
    }

    async fn fetch_token(&self) -> Result<AccessToken, AuthError> {
        let request = HttpRequest::get(&self.url)
            .header("AppToken", &self.app_token)
            .timeout(self.timeout);

        let response = self.transport.send(request).await?;
        if response.status != 200 {
            return Err(AuthError::rejected(response.status, redact_sensitive(response.body.trim())));
        }

        let parsed: ProxyTokenResponse = response.json().unwrap_or_default();
        let value = parsed
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| AuthError::missing_token("accessToken"))?;
        Ok(AccessToken::new(value, self.clock.now()).with_account_id(parsed.account_id))
    }
}

/// Cached access to a [`TokenSource`].
pub struct Authenticator {
    source: Arc<dyn TokenSource>,
    cache: Arc<dyn CacheStore>,
    policy: RetryPolicy,
    cache_key: String,
    ttl: Duration,
}

impl Authenticator {
    pub fn new(config: &SignflowConfig, source: Arc<dyn TokenSource>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            source,
            cache,
            policy: config.retry.policy(RetryClass::Token),
            cache_key: config.cache.token_key.clone(),
            ttl: config.cache.token_ttl(),
        }
    }

    /// A valid token, from the cache when possible.
    pub async fn access_token(&self) -> Result<AccessToken, AuthError> {
        if let Some(token) = self.cached_token() {
            debug!(source = self.source.name(), "using cached access token");
            return Ok(token);
        }

        let token = self
            .policy
            .execute_if("token_request", || self.source.fetch_token(), AuthError::is_retryable)
            .await?;
        info!(source = self.source.name(), account_override = token.account_id.is_some(), "access token obtained");

        match serde_json::to_string(&token) {
            Ok(serialized) => {
                if let Err(error) = self.cache.set(&self.cache_key, &serialized, Some(self.ttl)) {
                    warn!(error = %error, "could not cache access token");
                }
            }
            Err(error) => warn!(error = %error, "could not serialize access token"),
        }
        Ok(token)
    }

    /// The cached token, if present and younger than the token TTL.
    pub fn cached_token(&self) -> Option<AccessToken> {
        let raw = self.cache.get_valid(&self.cache_key, self.ttl)?;
        serde_json::from_str(&raw).ok()
    }

    /// Forget the cached token so the next call fetches a new one.
    pub fn invalidate(&self) {
        debug!("invalidating cached access token");
        if let Err(error) = self.cache.remove(&self.cache_key) {
            warn!(error = %error, "could not drop cached access token");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, StaticSigner};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use signflow_util::{ManualClock, MemoryCache};

    fn config() -> SignflowConfig {
        let mut config = SignflowConfig::default();
        config.provider.integration_key = "client-id".into();
        config.provider.user_id = "user-guid".into();
        config.provider.account_id = "acc-1".into();
        config.retry.initial_delay_ms = 10;
        config
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()))
    }

    fn jwt_authenticator(
        config: &SignflowConfig,
        transport: Arc<ScriptedTransport>,
        clock: Arc<ManualClock>,
    ) -> Authenticator {
        let source = JwtGrantSource::new(config, transport, Arc::new(StaticSigner), clock.clone());
        Authenticator::new(config, Arc::new(source), Arc::new(MemoryCache::with_clock(clock)))
    }

    #[test]
    fn grant_body_keeps_urn_readable() {
        assert_eq!(
            grant_form_body("aaa.bbb.ccc"),
            "grant_type=urn:ietf:params:oauth:grant-type:jwt-bearer&assertion=aaa.bbb.ccc"
        );
    }

    #[test]
    fn claims_use_configured_identity_and_lifetime() {
        let config = config();
        let clock = clock();
        let source = JwtGrantSource::new(&config, Arc::new(ScriptedTransport::new()), Arc::new(StaticSigner), clock.clone());

        let claims = source.claims();
        assert_eq!(claims.iss, "client-id");
        assert_eq!(claims.sub, "user-guid");
        assert_eq!(claims.aud, "account-d.docusign.com");
        assert_eq!(claims.scope, "signature impersonation");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.iat, clock.now().timestamp());
    }

    #[test]
    fn garbage_pem_is_a_signing_error() {
        assert!(matches!(RsaPemSigner::from_pem(b"not a key"), Err(AuthError::Signing { .. })));
    }

    #[tokio::test]
    async fn second_call_within_ttl_uses_cache() {
        let config = config();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({ "access_token": "tok-1", "expires_in": 3600 }));
        let auth = jwt_authenticator(&config, transport.clone(), clock());

        let first = auth.access_token().await.unwrap();
        let second = auth.access_token().await.unwrap();

        assert_eq!(first.value, "tok-1");
        assert_eq!(second.value, "tok-1");
        assert_eq!(transport.request_count(), 1);

        let request = &transport.requests()[0];
        assert_eq!(request.url, "https://account-d.docusign.com/oauth/token");
        assert_eq!(request.header_value("Content-Type"), Some("application/x-www-form-urlencoded"));
        let body = request.body.as_deref().unwrap();
        assert!(body.starts_with("grant_type=urn:ietf:params:oauth:grant-type:jwt-bearer&assertion="));
    }

    #[tokio::test]
    async fn expired_cache_entry_triggers_new_exchange() {
        let config = config();
        let clock = clock();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({ "access_token": "tok-1" }));
        transport.push_json(200, json!({ "access_token": "tok-2" }));
        let auth = jwt_authenticator(&config, transport.clone(), clock.clone());

        assert_eq!(auth.access_token().await.unwrap().value, "tok-1");
        clock.advance(config.cache.token_ttl() + Duration::from_secs(1));
        assert_eq!(auth.access_token().await.unwrap().value, "tok-2");
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let config = config();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({ "access_token": "tok-1" }));
        transport.push_json(200, json!({ "access_token": "tok-2" }));
        let auth = jwt_authenticator(&config, transport.clone(), clock());

        auth.access_token().await.unwrap();
        auth.invalidate();
        assert!(auth.cached_token().is_none());
        assert_eq!(auth.access_token().await.unwrap().value, "tok-2");
    }

    #[tokio::test]
    async fn invalid_grant_carries_description_and_is_not_retried() {
        let config = config();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(400, json!({ "error": "invalid_grant", "error_description": "no_valid_keys_or_signatures" }));
        let auth = jwt_authenticator(&config, transport.clone(), clock());

        let error = auth.access_token().await.unwrap_err();
        assert_eq!(error, AuthError::rejected(400, "no_valid_keys_or_signatures"));
        assert_eq!(transport.request_count(), 1);
        assert!(auth.cached_token().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_are_retried_with_token_budget() {
        let config = config();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_response(503, "unavailable");
        transport.push_response(502, "bad gateway");
        transport.push_json(200, json!({ "access_token": "tok-3" }));
        let auth = jwt_authenticator(&config, transport.clone(), clock());

        assert_eq!(auth.access_token().await.unwrap().value, "tok-3");
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn success_without_token_is_missing_token() {
        let config = config();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({ "token_type": "Bearer" }));
        let auth = jwt_authenticator(&config, transport, clock());

        assert_eq!(auth.access_token().await.unwrap_err(), AuthError::missing_token("access_token"));
    }

    #[tokio::test]
    async fn proxy_token_carries_account_override() {
        let mut config = config();
        config.auth.proxy.url = "https://proxy.example.com/token-proxy".into();
        config.auth.proxy.app_token = "app-secret".into();
        let clock = clock();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({ "accessToken": "proxy-tok", "accountId": "acc-proxy" }));

        let source = ProxyTokenSource::new(&config, transport.clone(), clock.clone());
        let token = source.fetch_token().await.unwrap();

        assert_eq!(token.value, "proxy-tok");
        assert_eq!(token.account_id.as_deref(), Some("acc-proxy"));
        let request = &transport.requests()[0];
        assert_eq!(request.method, reqwest::Method::GET);
        assert_eq!(request.header_value("AppToken"), Some("app-secret"));
    }

    #[tokio::test]
    async fn proxy_requires_exact_200() {
        let config = config();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(204, json!({}));
        let source = ProxyTokenSource::new(&config, transport, clock());

        assert!(matches!(source.fetch_token().await, Err(AuthError::Rejected { status: 204, .. })));
    }
}
