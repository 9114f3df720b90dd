//! Exponential-backoff retry executor.
//!
//! Every provider call (token exchange, envelope submit, status query) runs
//! through a [`RetryPolicy`]. The backoff sequence is deterministic: the first
//! delay is `initial_delay`, and each later delay is the previous one times
//! `backoff_multiplier`. There is no jitter.
//!
//! Delays are awaited with `tokio::time::sleep`, so an invocation's total
//! latency is the sum of the delays of every retried sub-operation.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, warn};

/// Upper bound for a single backoff sleep.
pub const MAX_DELAY: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts,
            initial_delay,
            backoff_multiplier,
        }
    }

    /// A policy that calls the operation exactly once.
    pub fn single_attempt() -> Self {
        Self::new(1, Duration::ZERO, 1.0)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// `delay` scaled by the multiplier, capped at [`MAX_DELAY`].
    ///
    /// A NaN or negative multiplier keeps the delay at zero; an overflowing
    /// product saturates at the cap.
    fn next_delay(&self, delay: Duration) -> Duration {
        let multiplier = if self.backoff_multiplier.is_nan() { 0.0 } else { self.backoff_multiplier.max(0.0) };
        Duration::try_from_secs_f64(delay.as_secs_f64() * multiplier)
            .unwrap_or(MAX_DELAY)
            .min(MAX_DELAY)
    }

    /// The sleep performed after each failed attempt except the last.
    pub fn delays(&self) -> Vec<Duration> {
        let mut delays = Vec::new();
        let mut current = self.initial_delay;
        for _ in 1..self.attempts() {
            delays.push(current.min(MAX_DELAY));
            current = self.next_delay(current);
        }
        delays
    }

    /// Run `operation` until it succeeds or the attempts are exhausted.
    ///
    /// The error of the final attempt is returned unchanged.
    pub async fn execute<T, E, F, Fut>(&self, operation_name: &str, operation: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_if(operation_name, operation, |_| true).await
    }

    /// Like [`RetryPolicy::execute`], but stops at the first error for which
    /// `is_retryable` returns false and returns that error unchanged.
    pub async fn execute_if<T, E, F, Fut, P>(&self, operation_name: &str, mut operation: F, is_retryable: P) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let max_attempts = self.attempts();
        let mut delay = self.initial_delay.min(MAX_DELAY);
        let mut attempt = 1;
        loop {
            debug!(operation = operation_name, attempt, max_attempts, "attempt started");
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !is_retryable(&error) {
                warn!(operation = operation_name, attempt, error = %error, "permanent failure; not retrying");
                return Err(error);
            }
            if attempt >= max_attempts {
                error!(operation = operation_name, attempts = attempt, error = %error, "all attempts failed");
                return Err(error);
            }

            warn!(
                operation = operation_name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "attempt failed; backing off"
            );
            tokio::time::sleep(delay).await;
            delay = self.next_delay(delay);
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000), 2.0)
    }
}
