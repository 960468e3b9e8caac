//! Origin fetch pipeline.
//!
//! A single GET with guardrails: origins resolving to private or reserved
//! addresses are refused before any connection, redirects and body size
//! are capped, and anything other than a 2xx is a fetch failure. The
//! caller hands in an already canonicalized URL.

pub mod guard;

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::{Client, StatusCode, Url, header};

pub use guard::GuardError;

use cachegate_core::Error;

/// Tunables for the fetch client, filled from application config.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Hard cap on response size, enforced against both the advertised
    /// Content-Length and the bytes actually received.
    pub max_bytes: usize,
    pub timeout: Duration,
    pub max_redirects: usize,
    /// Refuse origins that are, or resolve to, non-public addresses.
    pub deny_private_hosts: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "cachegate/0.1".to_string(),
            max_bytes: 32 * 1024 * 1024,
            timeout: Duration::from_secs(20),
            max_redirects: 5,
            deny_private_hosts: true,
        }
    }
}

/// What came back from the origin.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: Url,
    /// Where the origin ultimately redirected to, if anywhere.
    pub final_url: Url,
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub fetch_ms: u64,
}

/// HTTP client wrapper that owns the guardrails.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::RelocateFailed(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Fetch the origin content as raw bytes plus response metadata.
    pub async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        if self.config.deny_private_hosts {
            guard::check_url(url)
                .await
                .map_err(|e| Error::RelocateFailed(format!("blocked origin: {e}")))?;
        }

        let response = self
            .http
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| Error::RelocateFailed(format!("network error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::RelocateFailed(format!("origin status {}", status.as_u16())));
        }

        if let Some(advertised) = response.content_length() {
            self.check_size(advertised as usize)?;
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::RelocateFailed(format!("failed to read response: {e}")))?;
        self.check_size(bytes.len())?;

        let fetch_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(%url, %final_url, fetch_ms, bytes = bytes.len(), "fetched origin");

        Ok(FetchResponse { url: url.clone(), final_url, status, content_type, bytes, fetch_ms })
    }

    fn check_size(&self, len: usize) -> Result<(), Error> {
        if len > self.config.max_bytes {
            return Err(Error::RelocateFailed(format!(
                "{len} bytes exceeds limit of {}",
                self.config.max_bytes
            )));
        }
        Ok(())
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_guarded() {
        let config = FetchConfig::default();
        assert!(config.deny_private_hosts);
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.max_bytes, 32 * 1024 * 1024);
    }

    #[test]
    fn test_size_cap_enforced() {
        let client = FetchClient::new(FetchConfig { max_bytes: 10, ..FetchConfig::default() }).unwrap();
        assert!(client.check_size(10).is_ok());
        assert!(client.check_size(11).is_err());
    }

    #[tokio::test]
    async fn test_private_origin_is_blocked_before_any_request() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let url = Url::parse("http://192.168.1.1/internal").unwrap();
        let err = client.fetch(&url).await.unwrap_err();
        assert!(err.to_string().contains("blocked origin"));
    }
}
