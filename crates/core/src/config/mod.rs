//! Gateway configuration.
//!
//! Values are layered with figment, lowest to highest precedence:
//! built-in defaults, then a TOML file named by `CACHEGATE_CONFIG_FILE`,
//! then `CACHEGATE_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Runtime configuration for the gateway process.
///
/// Every field can be overridden through the matching `CACHEGATE_` env
/// variable, e.g. `CACHEGATE_PORT` or `CACHEGATE_MAX_BYTES`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listen port for the HTTP gateway.
    pub port: u16,

    /// SQLite record database location.
    pub db_path: PathBuf,

    /// Root directory of the destination object store.
    pub store_root: PathBuf,

    /// Bucket name within the destination namespace.
    pub bucket: String,

    /// Base URL under which deposited objects are reachable. The gateway
    /// serves its own objects at `/objects`, so the default points back at
    /// the local listener.
    pub public_base_url: String,

    /// User-Agent sent on upstream fetches.
    pub user_agent: String,

    /// Per-fetch response size cap in bytes.
    pub max_bytes: usize,

    /// Upstream fetch timeout in milliseconds.
    pub timeout_ms: u64,

    /// Redirect cap for upstream fetches.
    pub max_redirects: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 9444,
            db_path: PathBuf::from("./cachegate.sqlite"),
            store_root: PathBuf::from("./cachegate-data"),
            bucket: "cachegate".into(),
            public_base_url: "http://127.0.0.1:9444/objects".into(),
            user_agent: "cachegate/0.1".into(),
            max_bytes: 32 * 1024 * 1024,
            timeout_ms: 20_000,
            max_redirects: 5,
        }
    }
}

impl AppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load and validate configuration from all layered sources.
    pub fn load() -> Result<Self, ConfigError> {
        let file_layer = std::env::var("CACHEGATE_CONFIG_FILE").ok();

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = &file_layer {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(
            Env::prefixed("CACHEGATE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;

        Ok(config)
    }
}
