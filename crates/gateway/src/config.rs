//! Configuration for the peerlink gateway
//!
//! Values are layered: built-in defaults, then an optional config file
//! (TOML, YAML or JSON by extension), then `PEERLINK_*` environment
//! variables. Nested keys use `__`, e.g.
//! `PEERLINK_SIGNALING__CLOSE_SUPERSEDED=true`.

use std::path::Path;

use peerlink_signaling::registry::DEFAULT_OUTBOUND_CAPACITY;
use peerlink_signaling::RouterConfig;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PEERLINK";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind_address: String,
    pub signaling: SignalingConfig,
    pub logging: LogSettings,
}

/// Connection and routing settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignalingConfig {
    /// Frames buffered per connection before sends to it start failing
    pub outbound_queue_capacity: usize,
    /// Close the older connection when a handle connects again
    pub close_superseded: bool,
}

/// Logging settings as they appear in the config file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
    pub file_info: bool,
}

impl GatewayConfig {
    /// Load configuration from an optional file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        let config: GatewayConfig = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_address must not be empty".to_string()));
        }
        if self.signaling.outbound_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "signaling.outbound_queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            close_superseded: self.signaling.close_superseded,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            signaling: SignalingConfig::default(),
            logging: LogSettings::default(),
        }
    }
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: DEFAULT_OUTBOUND_CAPACITY,
            close_superseded: false,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
        }
    }
}
