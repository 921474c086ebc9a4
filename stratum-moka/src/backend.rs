use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use smol_str::SmolStr;
use stratum_backend::{Backend, BackendResult, DeleteStatus};
use stratum_core::{CacheKey, CacheValue, Raw};
use tracing::trace;

use crate::builder::{MokaBackendBuilder, NoCapacity};
use crate::metrics;

/// Process-local cache tier.
///
/// Clones share the same underlying cache.
#[derive(Clone)]
pub struct MokaBackend {
    cache: Cache<CacheKey, CacheValue<Raw>>,
    label: SmolStr,
    max_age: Duration,
}

impl std::fmt::Debug for MokaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("label", &self.label)
            .field("max_age", &self.max_age)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MokaBackend {
    /// Creates a new builder for `MokaBackend`.
    pub fn builder() -> MokaBackendBuilder<NoCapacity> {
        MokaBackendBuilder::new()
    }

    pub(crate) fn new(
        cache: Cache<CacheKey, CacheValue<Raw>>,
        label: SmolStr,
        max_age: Duration,
    ) -> Self {
        MokaBackend {
            cache,
            label,
            max_age,
        }
    }

    /// Returns the underlying moka cache.
    pub fn cache(&self) -> &Cache<CacheKey, CacheValue<Raw>> {
        &self.cache
    }

    /// Returns the maximum age of an entry.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    fn record_size(&self) {
        metrics::record_size(
            &self.label,
            self.cache.entry_count(),
            self.cache.weighted_size(),
        );
    }
}

#[async_trait]
impl Backend for MokaBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        let value = self.cache.get(key).await;
        Ok(value.filter(|value| !value.is_expired()))
    }

    async fn write(&self, key: &CacheKey, value: CacheValue<Raw>) -> BackendResult<()> {
        trace!(backend = %self.label, %key, "insert");
        self.cache.insert(key.clone(), value).await;
        self.record_size();
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let removed = self.cache.remove(key).await;
        self.record_size();
        match removed {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn clear(&self) -> BackendResult<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        self.record_size();
        Ok(())
    }

    fn label(&self) -> &str {
        &self.label
    }
}
