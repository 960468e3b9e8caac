//! Post-load sanity checks for configuration values.

use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}

impl AppConfig {
    /// Reject configurations the gateway cannot safely run with.
    ///
    /// Bounds: `max_bytes` in (0, 256MB], `timeout_ms` in [100ms, 5min],
    /// non-empty slash-free `bucket`, non-empty `user_agent`, and an
    /// absolute `public_base_url`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.max_bytes {
            0 => return Err(invalid("max_bytes", "must be greater than 0")),
            n if n > 256 * 1024 * 1024 => return Err(invalid("max_bytes", "must not exceed 256MB")),
            _ => {}
        }

        if !(100..=300_000).contains(&self.timeout_ms) {
            return Err(invalid("timeout_ms", "must be between 100ms and 300000ms"));
        }

        if self.bucket.is_empty() {
            return Err(invalid("bucket", "must not be empty"));
        }
        if self.bucket.contains('/') {
            return Err(invalid("bucket", "must not contain '/'"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        url::Url::parse(&self.public_base_url)
            .map_err(|e| invalid("public_base_url", format!("must be an absolute URL: {e}")))?;

        Ok(())
    }
}
