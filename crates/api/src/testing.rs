//! Test doubles for the provider seams.
//!
//! Used by this crate's tests and by the engine's hook scenarios.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;

use crate::auth::{AssertionClaims, AssertionSigner};
use crate::error::AuthError;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Transport answering from a queue of scripted responses and recording
/// every request it receives. An empty queue answers with a network error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.push(Ok(HttpResponse::new(status, body)));
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push_response(status, body.to_string());
    }

    pub fn push_error(&self, error: TransportError) {
        self.push(Err(error));
    }

    fn push(&self, outcome: Result<HttpResponse, TransportError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Responses that were scripted but never consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network(format!("no scripted response for {}", request.url))))
    }
}

/// Signer producing a well-formed but unsigned JWT.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticSigner;

impl AssertionSigner for StaticSigner {
    fn sign(&self, claims: &AssertionClaims) -> Result<String, AuthError> {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = serde_json::to_vec(claims).map_err(|error| AuthError::Signing {
            message: error.to_string(),
        })?;
        Ok(format!("{header}.{}.c2lnbmF0dXJl", URL_SAFE_NO_PAD.encode(payload)))
    }
}
