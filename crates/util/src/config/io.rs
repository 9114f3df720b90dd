//! Configuration file loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::{config_dir, home_dir};
use tracing::debug;

use crate::config::{ConfigError, SignflowConfig, validate_config};

/// Environment variable allowing callers to override the configuration path.
pub const CONFIG_PATH_ENV: &str = "SIGNFLOW_CONFIG_PATH";

/// Returns the default path for the configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_home(path.trim());
    }

    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("signflow").join("config.json")
}

/// Loads and validates the configuration from the default path.
pub fn load_config() -> Result<SignflowConfig, ConfigError> {
    load_config_from_path(&default_config_path())
}

/// Loads and validates the configuration from `path`.
///
/// `.yaml`/`.yml` files are parsed as YAML, everything else as JSON.
pub fn load_config_from_path(path: &Path) -> Result<SignflowConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let is_yaml = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("yaml") || extension.eq_ignore_ascii_case("yml"));

    let config = parse_config(&content, is_yaml)?;
    validate_config(&config)?;
    debug!(path = %path.display(), mode = ?config.auth.mode, "configuration loaded");
    Ok(config)
}

/// Parse configuration text without validating it.
pub fn parse_config(content: &str, is_yaml: bool) -> Result<SignflowConfig, ConfigError> {
    if is_yaml {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
