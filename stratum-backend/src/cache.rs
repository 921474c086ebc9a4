use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use stratum_core::{CacheKey, CacheValue};

use crate::format::{Format, JsonFormat};
use crate::{Backend, BackendResult, DeleteStatus};

/// Typed view over a byte-oriented [`Backend`].
///
/// Values of `T` are encoded with `S` before they reach the tier, so every
/// tier behind the backend sees the same bytes. A value stored under a key is
/// always read back as the same `T`; keying distinct types apart is up to the
/// caller (usually through a key prefix).
pub struct TypedCache<T, B, S = JsonFormat> {
    backend: B,
    format: S,
    _value: PhantomData<fn() -> T>,
}

impl<T, B> TypedCache<T, B, JsonFormat>
where
    B: Backend,
{
    /// Creates a typed cache using the JSON format.
    pub fn new(backend: B) -> Self {
        TypedCache {
            backend,
            format: JsonFormat,
            _value: PhantomData,
        }
    }
}

impl<T, B, S> TypedCache<T, B, S>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    B: Backend,
    S: Format,
{
    /// Replaces the value format.
    pub fn with_format<S2: Format>(self, format: S2) -> TypedCache<T, B, S2> {
        TypedCache {
            backend: self.backend,
            format,
            _value: PhantomData,
        }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Stores `value` without a TTL; the tiers apply their own retention.
    pub async fn put(&self, key: &str, value: &T) -> BackendResult<()> {
        self.put_until(key, value, None).await
    }

    /// Stores `value` for `ttl`.
    pub async fn put_with_ttl(&self, key: &str, value: &T, ttl: Duration) -> BackendResult<()> {
        let raw = self.format.serialize(value)?;
        self.backend
            .write(&CacheKey::from(key), CacheValue::with_ttl(raw, ttl))
            .await
    }

    /// Stores `value` until the absolute instant `expire`.
    pub async fn put_until(
        &self,
        key: &str,
        value: &T,
        expire: Option<DateTime<Utc>>,
    ) -> BackendResult<()> {
        let raw = self.format.serialize(value)?;
        self.backend
            .write(&CacheKey::from(key), CacheValue::new(raw, expire))
            .await
    }

    /// Returns the live value for `key`.
    ///
    /// Bytes that do not decode as `T` surface as a format error, never as a
    /// miss.
    pub async fn get(&self, key: &str) -> BackendResult<Option<T>> {
        match self.backend.read(&CacheKey::from(key)).await? {
            Some(value) => Ok(Some(self.format.deserialize(value.data())?)),
            None => Ok(None),
        }
    }

    /// Removes `key` from every tier.
    pub async fn evict(&self, key: &str) -> BackendResult<DeleteStatus> {
        self.backend.remove(&CacheKey::from(key)).await
    }

    /// Removes every entry from every tier.
    pub async fn clear(&self) -> BackendResult<()> {
        self.backend.clear().await
    }
}

impl<T, B: Clone, S: Clone> Clone for TypedCache<T, B, S> {
    fn clone(&self) -> Self {
        TypedCache {
            backend: self.backend.clone(),
            format: self.format.clone(),
            _value: PhantomData,
        }
    }
}

impl<T, B: Backend, S> fmt::Debug for TypedCache<T, B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedCache")
            .field("backend", &self.backend.label())
            .field("value", &std::any::type_name::<T>())
            .finish()
    }
}
