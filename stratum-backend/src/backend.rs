use std::sync::Arc;

use async_trait::async_trait;
use stratum_core::{CacheKey, CacheValue, Raw};

use crate::{BackendError, DeleteStatus};

/// Result alias used by every backend operation.
pub type BackendResult<T> = Result<T, BackendError>;

/// The capability set shared by every cache tier.
///
/// Local, remote and tiered caches all implement this trait, so they can be
/// swapped for one another or nested. Values are raw bytes; typed access goes
/// through [`TypedCache`](crate::TypedCache).
///
/// Expiration travels with the value: [`CacheValue::expire`] is the absolute
/// instant after which the entry must no longer be returned by
/// [`read`](Backend::read). `None` means the caller gave no TTL.
#[async_trait]
pub trait Backend: Sync + Send {
    /// Returns the entry for `key`, or `None` if absent or expired.
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>>;

    /// Inserts or overwrites the entry for `key`.
    async fn write(&self, key: &CacheKey, value: CacheValue<Raw>) -> BackendResult<()>;

    /// Removes the entry for `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus>;

    /// Removes every entry this backend can reach.
    ///
    /// For shared backends this is destructive to every other user of the
    /// same namespace, not only to the caller's keys.
    async fn clear(&self) -> BackendResult<()>;

    /// Returns the label of this backend, used in logs and metrics.
    fn label(&self) -> &str {
        "backend"
    }
}

#[async_trait]
impl Backend for &dyn Backend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        (*self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: CacheValue<Raw>) -> BackendResult<()> {
        (*self).write(key, value).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (*self).remove(key).await
    }

    async fn clear(&self) -> BackendResult<()> {
        (*self).clear().await
    }

    fn label(&self) -> &str {
        (*self).label()
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: CacheValue<Raw>) -> BackendResult<()> {
        (**self).write(key, value).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> BackendResult<()> {
        (**self).clear().await
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend + Send + 'static> {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: CacheValue<Raw>) -> BackendResult<()> {
        (**self).write(key, value).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> BackendResult<()> {
        (**self).clear().await
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}
