//! HTTP transport seam.
//!
//! Provider calls are expressed as plain [`HttpRequest`] values and sent
//! through an [`HttpTransport`]. Production uses [`ReqwestTransport`]; tests
//! script responses with [`crate::testing::ScriptedTransport`]. Status codes
//! are never turned into errors here: callers decide what a 401 or a 500
//! means for their operation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure to exchange a request/response at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest { message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Sends one HTTP request and returns whatever the server answered.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
    user_agent: String,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|error| TransportError::network(format!("could not build http client: {error}")))?;

        Ok(Self {
            http,
            user_agent: format!("signflow/{}; {}", env!("CARGO_PKG_VERSION"), std::env::consts::OS),
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let start = Instant::now();
        let timeout_ms = request.timeout.as_millis() as u64;
        debug!(method = %request.method, url = %request.url, "http request started");

        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .header(header::USER_AGENT, &self.user_agent)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|error| {
            warn!(
                method = %request.method,
                url = %request.url,
                error = %error,
                duration_ms = start.elapsed().as_millis() as u64,
                "http request failed"
            );
            if error.is_timeout() {
                TransportError::Timeout { timeout_ms }
            } else if error.is_builder() {
                TransportError::invalid_request(error.to_string())
            } else {
                TransportError::network(error.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|error| TransportError::network(format!("could not read response body: {error}")))?;
        debug!(
            method = %request.method,
            url = %request.url,
            status,
            body_len = body.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "http request completed"
        );
        Ok(HttpResponse { status, body })
    }
}
