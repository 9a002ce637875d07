//! Service Settings
//!
//! Layered with the `config` crate, later sources win:
//! 1. built-in defaults
//! 2. optional `config.{yaml,yml,toml,json}` in the working directory
//! 3. `ALERT_RELAY_*` environment variables, `__` between nesting levels
//!    (e.g. `ALERT_RELAY_SERVER__PORT=8080`)
//!
//! Variables from an optional `.env` file are exported first; ones already
//! set in the process environment win.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use dispatch::DispatchConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Base name of the optional config file
pub const CONFIG_BASENAME: &str = "config";

/// Optional env file read before the environment source
pub const ENV_FILE: &str = ".env";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ALERT_RELAY";

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub dispatch: DispatchConfig,
    pub notifier: NotifierConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9847,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Membership store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

/// Membership store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// sqlx connection URL, used by the sqlite backend
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: "sqlite://alert-relay.db".to_string(),
            max_connections: 4,
            acquire_timeout_ms: 3000,
        }
    }
}

impl StoreConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

/// Notification transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    Log,
    Webhook,
}

/// Notifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    pub kind: NotifierKind,
    /// Target for the webhook notifier
    pub webhook_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Log,
            webhook_url: None,
            timeout_ms: 10_000,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub level: String,
    /// Emit JSON lines instead of plain text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ServiceConfig {
    /// Load from defaults, the optional config file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        load_env_file(ENV_FILE)?;
        Self::defaults()?
            .add_source(File::with_name(CONFIG_BASENAME).required(false))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
    }

    /// Builder seeded with [`ServiceConfig::default`]
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder().add_source(Config::try_from(&ServiceConfig::default())?))
    }

    /// Environment source for the `ALERT_RELAY_` prefix
    pub fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }
}

/// Export the variables of an env file into the process environment.
///
/// A missing file is skipped. Variables that are already set are kept.
pub fn load_env_file(path: impl AsRef<Path>) -> Result<(), ConfigError> {
    match dotenvy::from_path(path.as_ref()) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::Foreign(Box::new(e))),
    }
}
