//! Single-shot envelope status polling with a wall-clock timeout.
//!
//! The poller never loops. Each call performs at most one provider query; the
//! host re-triggers it every `polling.interval_ms`. The start of the polling
//! window is kept in the cache under `cache.polling_start_key` so that it
//! survives between invocations, and is cleared once a terminal outcome is
//! reached.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signflow_api::{QueryError, StatusQuery};
use signflow_types::{AccessToken, ProcessStatusCode};
use signflow_util::config::SignflowConfig;
use signflow_util::{CacheStore, Clock};
use tracing::{debug, info, warn};

use crate::state_machine::{FailureReason, LocalStatus, is_recognized_status, map_provider_status};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The provider was queried.
    Checked { status: LocalStatus, provider_status: String },
    /// The polling window elapsed; the provider was not queried.
    TimedOut { elapsed: Duration },
}

impl PollOutcome {
    pub fn status(&self) -> LocalStatus {
        match self {
            PollOutcome::Checked { status, .. } => *status,
            PollOutcome::TimedOut { .. } => LocalStatus::Failure(FailureReason::Timeout),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn code(&self) -> ProcessStatusCode {
        self.status().code()
    }
}

/// Cached start of the polling window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct PollingMarker {
    envelope_id: String,
    started_at: DateTime<Utc>,
}

pub struct StatusPoller {
    config: Arc<SignflowConfig>,
    query: StatusQuery,
    cache: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
}

impl StatusPoller {
    pub fn new(config: Arc<SignflowConfig>, query: StatusQuery, cache: Arc<dyn CacheStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            query,
            cache,
            clock,
        }
    }

    /// Check the envelope once.
    ///
    /// Query errors are returned after the status retry budget is spent; the
    /// polling window keeps running in that case.
    pub async fn poll(&self, envelope_id: &str, token: &AccessToken) -> Result<PollOutcome, QueryError> {
        if let Some(timed_out) = self.check_window(envelope_id) {
            return Ok(timed_out);
        }

        let report = self.query.fetch(envelope_id, token).await?;
        let provider_status = report.status.unwrap_or_default();
        let status = map_provider_status(&provider_status, &self.config.polling);
        if !is_recognized_status(&provider_status, &self.config.polling) {
            warn!(envelope_id, provider_status = %provider_status, "unknown provider status; treating as pending");
        }

        if status.is_terminal() {
            info!(envelope_id, provider_status = %provider_status, status = %status, "envelope reached terminal status");
            self.clear_window();
        } else {
            debug!(envelope_id, provider_status = %provider_status, "envelope still pending");
        }
        Ok(PollOutcome::Checked { status, provider_status })
    }

    /// Start the polling window if needed and report a timeout once it has
    /// elapsed. Needs no token and never calls the provider.
    pub fn check_window(&self, envelope_id: &str) -> Option<PollOutcome> {
        let now = self.clock.now();
        let started_at = match self.polling_started_at(envelope_id) {
            Some(started_at) => started_at,
            None => {
                self.start_window(envelope_id, now);
                now
            }
        };

        let elapsed = (now - started_at).to_std().unwrap_or(Duration::ZERO);
        let max_polling = self.config.timeouts.max_polling();
        if elapsed <= max_polling {
            return None;
        }
        warn!(
            envelope_id,
            elapsed_ms = elapsed.as_millis() as u64,
            max_polling_ms = max_polling.as_millis() as u64,
            "polling window elapsed"
        );
        self.clear_window();
        Some(PollOutcome::TimedOut { elapsed })
    }

    /// Start of the polling window for `envelope_id`, if one is running.
    pub fn polling_started_at(&self, envelope_id: &str) -> Option<DateTime<Utc>> {
        let raw = self.cache.get(&self.config.cache.polling_start_key)?;
        match serde_json::from_str::<PollingMarker>(&raw) {
            Ok(marker) if marker.envelope_id == envelope_id => Some(marker.started_at),
            Ok(marker) => {
                debug!(envelope_id, previous = %marker.envelope_id, "polling marker belongs to another envelope");
                None
            }
            Err(error) => {
                warn!(error = %error, "discarding unreadable polling marker");
                None
            }
        }
    }

    fn start_window(&self, envelope_id: &str, now: DateTime<Utc>) {
        let marker = PollingMarker {
            envelope_id: envelope_id.to_string(),
            started_at: now,
        };
        let stored = serde_json::to_string(&marker)
            .map_err(|error| error.to_string())
            .and_then(|raw| {
                self.cache
                    .set(&self.config.cache.polling_start_key, &raw, None)
                    .map_err(|error| error.to_string())
            });
        match stored {
            Ok(()) => debug!(envelope_id, started_at = %now, "polling window started"),
            Err(error) => warn!(envelope_id, error = %error, "could not record polling start"),
        }
    }

    fn clear_window(&self) {
        if let Err(error) = self.cache.remove(&self.config.cache.polling_start_key) {
            warn!(error = %error, "could not clear polling marker");
        }
    }
}
