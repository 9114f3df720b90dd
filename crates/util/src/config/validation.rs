//! Configuration validation.
//!
//! Runs before any network call. All violations are collected so an operator
//! can fix a configuration in one pass.

use url::Url;

use crate::config::{AuthMode, ConfigError, SignflowConfig};
use crate::retry::MAX_DELAY;

/// Prefix of the placeholder values shipped as defaults.
pub const PLACEHOLDER_PREFIX: &str = "SEU_";

/// Largest accepted `retry.backoff_multiplier`.
pub const MAX_BACKOFF_MULTIPLIER: f64 = 10.0;

/// Largest accepted attempt count for any retry class.
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Hostnames allowed to use plain HTTP.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Validate the entire configuration.
pub fn validate_config(config: &SignflowConfig) -> Result<(), ConfigError> {
    let mut violations = Vec::new();

    match config.auth.mode {
        AuthMode::Jwt => {
            require_credential(&mut violations, "provider.integration_key", &config.provider.integration_key);
            require_credential(&mut violations, "provider.user_id", &config.provider.user_id);
            require_credential(&mut violations, "provider.account_id", &config.provider.account_id);
            require_credential(&mut violations, "provider.private_key_path", &config.provider.private_key_path);
            if config.provider.private_key_path.starts_with("/path/") {
                violations.push("provider.private_key_path still points at the example path".to_string());
            }
            check_url(&mut violations, "provider.auth_url", &config.provider.auth_url);
        }
        AuthMode::Proxy => {
            require_credential(&mut violations, "auth.proxy.url", &config.auth.proxy.url);
            require_credential(&mut violations, "auth.proxy.app_token", &config.auth.proxy.app_token);
            // The proxy may report the account; a configured one is only a fallback.
            if config.provider.account_id.starts_with(PLACEHOLDER_PREFIX) {
                violations.push("provider.account_id must be set or left empty in proxy mode".to_string());
            }
            if !is_placeholder(&config.auth.proxy.url) {
                check_url(&mut violations, "auth.proxy.url", &config.auth.proxy.url);
            }
        }
    }
    check_url(&mut violations, "provider.api_base_url", &config.provider.api_base_url);

    let multiplier = config.retry.backoff_multiplier;
    if !multiplier.is_finite() || !(1.0..=MAX_BACKOFF_MULTIPLIER).contains(&multiplier) {
        violations.push(format!("retry.backoff_multiplier must be between 1 and {MAX_BACKOFF_MULTIPLIER}"));
    }
    for (name, attempts) in [
        ("retry.max_token_retries", config.retry.max_token_retries),
        ("retry.max_envelope_retries", config.retry.max_envelope_retries),
        ("retry.max_status_retries", config.retry.max_status_retries),
    ] {
        if attempts > MAX_RETRY_ATTEMPTS {
            violations.push(format!("{name} must be at most {MAX_RETRY_ATTEMPTS}"));
        }
    }
    if config.retry.initial_delay_ms > MAX_DELAY.as_millis() as u64 {
        violations.push(format!("retry.initial_delay_ms must be at most {}", MAX_DELAY.as_millis()));
    }
    if config.cache.token_ttl_ms / 1000 >= config.jwt.expiration_secs {
        violations.push("cache.token_ttl_ms must be shorter than jwt.expiration_secs".to_string());
    }
    if config.cache.token_key == config.cache.polling_start_key {
        violations.push("cache.token_key and cache.polling_start_key must differ".to_string());
    }
    if !config.envelope.anchor_template.contains("{n}") {
        violations.push("envelope.anchor_template must contain {n}".to_string());
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::invalid(violations))
    }
}

fn is_placeholder(value: &str) -> bool {
    value.trim().is_empty() || value.trim().starts_with(PLACEHOLDER_PREFIX)
}

fn require_credential(violations: &mut Vec<String>, name: &str, value: &str) {
    if is_placeholder(value) {
        violations.push(format!("required setting not defined: {name}"));
    }
}

/// Non-localhost hosts must use https.
fn check_url(violations: &mut Vec<String>, name: &str, value: &str) {
    let parsed = match Url::parse(value) {
        Ok(parsed) => parsed,
        Err(error) => {
            violations.push(format!("{name} is not a valid URL: {error}"));
            return;
        }
    };
    let Some(host) = parsed.host_str() else {
        violations.push(format!("{name} must include a host"));
        return;
    };
    let is_local = LOCALHOST_DOMAINS.iter().any(|local| host.eq_ignore_ascii_case(local));
    if !is_local && parsed.scheme() != "https" {
        violations.push(format!("{name} must use https for non-localhost hosts; got '{}://'", parsed.scheme()));
    }
}
