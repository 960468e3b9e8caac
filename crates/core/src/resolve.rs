//! Cache orchestration: check the store, relocate on miss, record, re-read.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use url::Url;

use crate::Error;
use crate::key;
use crate::origin;
use crate::relocate::{Relocator, Visibility};
use crate::store::{CacheRecord, RecordStore};

/// Resolves an origin URL to a `CacheRecord`, performing at most one
/// relocation per distinct origin.
///
/// The resolver is stateless between requests apart from the in-flight
/// map used to coalesce concurrent misses; the record store and the
/// relocator are shared, injected collaborators constructed once at
/// process start.
pub struct Resolver {
    store: Arc<dyn RecordStore>,
    relocator: Arc<dyn Relocator>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Resolver {
    pub fn new(store: Arc<dyn RecordStore>, relocator: Arc<dyn Relocator>) -> Self {
        Self { store, relocator, in_flight: Mutex::new(HashMap::new()) }
    }

    /// Resolve an origin URL to its cache record.
    ///
    /// Unless `force_refetch` is set, an existing record is returned
    /// directly (the fast path). On a miss the content is relocated to a
    /// deterministic destination derived from the canonical origin, the
    /// record is upserted, and the stored row is re-read and returned.
    ///
    /// `expiry_seconds` is accepted for interface compatibility but
    /// expiration semantics are not implemented.
    pub async fn resolve(
        &self, raw_url: &str, force_refetch: bool, _expiry_seconds: i64,
    ) -> Result<CacheRecord, Error> {
        let url = origin::canonicalize(raw_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let origin = url.to_string();

        if !force_refetch
            && let Some(record) = self.store.get(&origin).await?
        {
            tracing::debug!(%origin, "cache hit");
            return Ok(record);
        }

        // Coalesce concurrent misses for the same origin. The outer lock
        // guards only map access; the relocation itself runs under the
        // per-origin handle. Coalescing is best-effort within this process;
        // deterministic destination naming keeps duplicate relocations safe
        // across processes.
        let flight = {
            let mut map = self.in_flight.lock().await;
            Arc::clone(map.entry(origin.clone()).or_default())
        };
        let _guard = flight.lock().await;

        let result = self.resolve_miss(&url, &origin, force_refetch).await;
        self.forget(&origin).await;
        result
    }

    async fn resolve_miss(&self, url: &Url, origin: &str, force_refetch: bool) -> Result<CacheRecord, Error> {
        // A coalesced winner may have stored the record while we waited.
        if !force_refetch
            && let Some(record) = self.store.get(origin).await?
        {
            tracing::debug!(origin, "cache hit after coalescing");
            return Ok(record);
        }

        self.relocate_and_record(url, origin).await
    }

    async fn relocate_and_record(&self, url: &Url, origin: &str) -> Result<CacheRecord, Error> {
        let destination = key::destination_name(url);
        let cached_url = self
            .relocator
            .relocate(url, &destination, Visibility::Public)
            .await?;

        let record = CacheRecord {
            origin: origin.to_string(),
            cached_url,
            err: String::new(),
            time_at: chrono::Utc::now().timestamp(),
        };
        self.store
            .upsert(&record)
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;

        // The store is the single source of truth: never synthesize a
        // success response from the local write attempt.
        match self.store.get(origin).await? {
            Some(stored) => {
                tracing::debug!(origin, cached_url = %stored.cached_url, "record stored");
                Ok(stored)
            }
            None => Err(Error::Inconsistent),
        }
    }

    async fn forget(&self, origin: &str) {
        let mut map = self.in_flight.lock().await;
        map.remove(origin);
    }
}
