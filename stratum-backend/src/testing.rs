//! In-memory backend for tests of crates built on top of this one.
//!
//! [`InMemoryBackend`] stands in for a remote tier: it counts every call and
//! can be switched into a failing state that reports connectivity errors.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use stratum_core::{CacheKey, CacheValue, Raw};

use crate::{Backend, BackendError, BackendResult, DeleteStatus};

#[derive(Debug, Default)]
struct Counters {
    reads: AtomicUsize,
    writes: AtomicUsize,
    removes: AtomicUsize,
    clears: AtomicUsize,
}

/// DashMap-backed backend with call counters and a failure switch.
///
/// Clones share the same store, counters and switch.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    store: Arc<DashMap<CacheKey, CacheValue<Raw>>>,
    counters: Arc<Counters>,
    failing: Arc<AtomicBool>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with a connection error (or stop failing).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `read` calls so far.
    pub fn reads(&self) -> usize {
        self.counters.reads.load(Ordering::SeqCst)
    }

    /// Number of `write` calls so far.
    pub fn writes(&self) -> usize {
        self.counters.writes.load(Ordering::SeqCst)
    }

    /// Number of `remove` calls so far.
    pub fn removes(&self) -> usize {
        self.counters.removes.load(Ordering::SeqCst)
    }

    /// Number of `clear` calls so far.
    pub fn clears(&self) -> usize {
        self.counters.clears.load(Ordering::SeqCst)
    }

    /// Returns `true` if `key` is stored, expired or not.
    pub fn has(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }

    /// Returns the stored entry, bypassing counters and expiry.
    pub fn get_raw(&self, key: &str) -> Option<CacheValue<Raw>> {
        self.store.get(key).map(|v| v.clone())
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn check(&self) -> BackendResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(BackendError::connection(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "in-memory backend switched to failing",
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .store
            .get(key)
            .map(|v| v.clone())
            .filter(|v| !v.is_expired()))
    }

    async fn write(&self, key: &CacheKey, value: CacheValue<Raw>) -> BackendResult<()> {
        self.counters.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.store.insert(key.clone(), value);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        self.counters.removes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(match self.store.remove(key) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    async fn clear(&self) -> BackendResult<()> {
        self.counters.clears.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.store.clear();
        Ok(())
    }

    fn label(&self) -> &str {
        "in-memory"
    }
}
