//! Configuration for the e-signature integration.
//!
//! A [`SignflowConfig`] is built once at start-up (usually from a JSON or YAML
//! file) and passed by reference into every component. Loading validates the
//! result and refuses configurations that still carry placeholder credentials.

mod io;
mod model;
mod validation;

pub use io::{CONFIG_PATH_ENV, default_config_path, load_config, load_config_from_path, parse_config};
pub use model::{
    AuthConfig, AuthMode, CacheConfig, ConfigError, EnvelopeConfig, FieldNames, JwtConfig, PollingConfig, ProviderConfig, ProxyConfig,
    RetryClass, RetryConfig, SignflowConfig, StatusValues, TimeoutConfig, ValidationConfig,
};
pub use validation::{PLACEHOLDER_PREFIX, validate_config};
