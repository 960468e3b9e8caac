//! The HTTP relocator: fetch from the origin, deposit into the object store.

use async_trait::async_trait;
use url::Url;

use cachegate_core::{Error, Relocator, Visibility};

use crate::deposit::ObjectStore;
use crate::fetch::FetchClient;

/// Relocator backed by the HTTP fetch pipeline and the filesystem object
/// store. Both collaborators are constructed once at startup and shared
/// across requests.
pub struct HttpRelocator {
    fetch: FetchClient,
    store: ObjectStore,
}

impl HttpRelocator {
    pub fn new(fetch: FetchClient, store: ObjectStore) -> Self {
        Self { fetch, store }
    }
}

#[async_trait]
impl Relocator for HttpRelocator {
    async fn relocate(&self, source: &Url, destination: &str, visibility: Visibility) -> Result<String, Error> {
        let response = self.fetch.fetch(source).await?;
        let cached_url = self
            .store
            .deposit(destination, &response.bytes, visibility)
            .await?;

        tracing::info!(
            source = %source,
            destination,
            bytes = response.bytes.len(),
            fetch_ms = response.fetch_ms,
            "relocated content"
        );

        Ok(cached_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchConfig;

    #[tokio::test]
    async fn test_relocate_failure_deposits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::open(dir.path(), "bucket", "http://cdn.test/objects")
            .await
            .unwrap();
        let fetch = FetchClient::new(FetchConfig::default()).unwrap();
        let relocator = HttpRelocator::new(fetch, store.clone());

        // Private origin is rejected by the fetch guard before any deposit.
        let source = Url::parse("http://10.0.0.1/internal").unwrap();
        let err = relocator
            .relocate(&source, "10.0.0.1/abc", Visibility::Public)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RelocateFailed(_)));
        assert!(!store.object_path("10.0.0.1/abc").unwrap().exists());
    }
}
