//! Simple in-memory test backends implemented with DashMap.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use stratum_backend::{Backend, BackendError, BackendResult, DeleteStatus};
use stratum_core::{CacheKey, CacheValue, Raw};

/// In-memory backend that counts reads and writes.
///
/// Clones share state.
#[derive(Clone)]
pub struct TestBackend {
    name: &'static str,
    store: Arc<DashMap<CacheKey, CacheValue<Raw>>>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl TestBackend {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            store: Arc::new(DashMap::new()),
            reads: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }

    pub fn get_raw(&self, key: &str) -> Option<CacheValue<Raw>> {
        self.store.get(key).map(|v| v.clone())
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for TestBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .store
            .get(key)
            .map(|v| v.clone())
            .filter(|v| !v.is_expired()))
    }

    async fn write(&self, key: &CacheKey, value: CacheValue<Raw>) -> BackendResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.store.insert(key.clone(), value);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        Ok(match self.store.remove(key) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    async fn clear(&self) -> BackendResult<()> {
        self.store.clear();
        Ok(())
    }

    fn label(&self) -> &str {
        self.name
    }
}

/// Backend that always returns errors (for error testing).
#[derive(Clone, Debug)]
pub struct ErrorBackend {
    connectivity: bool,
}

impl ErrorBackend {
    /// Fails every call with a connection error.
    pub fn unreachable() -> Self {
        Self { connectivity: true }
    }

    /// Fails every call with an internal error.
    pub fn broken() -> Self {
        Self {
            connectivity: false,
        }
    }

    fn error(&self) -> BackendError {
        let error = std::io::Error::other("simulated error");
        if self.connectivity {
            BackendError::connection(error)
        } else {
            BackendError::internal(error)
        }
    }
}

#[async_trait]
impl Backend for ErrorBackend {
    async fn read(&self, _key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        Err(self.error())
    }

    async fn write(&self, _key: &CacheKey, _value: CacheValue<Raw>) -> BackendResult<()> {
        Err(self.error())
    }

    async fn remove(&self, _key: &CacheKey) -> BackendResult<DeleteStatus> {
        Err(self.error())
    }

    async fn clear(&self) -> BackendResult<()> {
        Err(self.error())
    }

    fn label(&self) -> &str {
        "error"
    }
}

pub fn raw(data: &'static str, ttl: Duration) -> CacheValue<Raw> {
    CacheValue::with_ttl(Bytes::from_static(data.as_bytes()), ttl)
}
