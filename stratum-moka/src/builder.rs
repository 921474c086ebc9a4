//! Builder for configuring [`MokaBackend`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use moka::Expiry;
use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use smol_str::SmolStr;
use stratum_core::{CacheKey, CacheValue, Raw};
use tracing::trace;

use crate::DEFAULT_MAX_AGE;
use crate::backend::MokaBackend;
use crate::metrics;

type MokaCacheBuilder = CacheBuilder<CacheKey, CacheValue<Raw>, Cache<CacheKey, CacheValue<Raw>>>;

/// Expiration policy: the earlier of the value's own expiration and the
/// maximum age.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Expiration {
    max_age: Duration,
}

impl Expiry<CacheKey, CacheValue<Raw>> for Expiration {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &CacheValue<Raw>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(self.calculate_ttl(value))
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &CacheValue<Raw>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // Always the new value's expiration; moka's default keeps the old one.
        Some(self.calculate_ttl(value))
    }
}

impl Expiration {
    fn calculate_ttl(&self, value: &CacheValue<Raw>) -> Duration {
        match value.ttl_at(Utc::now()) {
            Some(ttl) => ttl.min(self.max_age),
            None => self.max_age,
        }
    }
}

/// Marker type: capacity has not been configured yet.
///
/// You must call either [`max_entries()`](MokaBackendBuilder::max_entries) or
/// [`max_bytes()`](MokaBackendBuilder::max_bytes) before calling `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for creating and configuring a [`MokaBackend`].
///
/// Use [`MokaBackend::builder`] to create a new builder instance.
///
/// # Capacity Configuration (Required)
///
/// You must configure capacity using exactly one of:
/// - [`max_entries(n)`](Self::max_entries) - limit by entry count
/// - [`max_bytes(n)`](Self::max_bytes) - limit by approximate memory usage
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use stratum_moka::MokaBackend;
///
/// let backend = MokaBackend::builder()
///     .label("sessions")
///     .max_entries(10_000)
///     .max_age(Duration::from_secs(300))
///     .build();
/// ```
pub struct MokaBackendBuilder<Cap> {
    capacity: Cap,
    max_age: Duration,
    label: SmolStr,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaBackendBuilder<NoCapacity> {
    /// Creates a new builder with no capacity configured.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            max_age: DEFAULT_MAX_AGE,
            label: SmolStr::new_static("moka"),
            eviction_policy: None,
        }
    }

    /// Sets the maximum number of entries the cache can hold.
    pub fn max_entries(self, capacity: u64) -> MokaBackendBuilder<EntryCapacity> {
        MokaBackendBuilder {
            capacity: EntryCapacity(capacity),
            max_age: self.max_age,
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }

    /// Sets the maximum memory budget in bytes.
    ///
    /// The byte count includes the serialized value and an estimate of the key
    /// and metadata overhead.
    pub fn max_bytes(self, bytes: u64) -> MokaBackendBuilder<ByteCapacity> {
        MokaBackendBuilder {
            capacity: ByteCapacity(bytes),
            max_age: self.max_age,
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl Default for MokaBackendBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaBackendBuilder<Cap> {
    /// Sets a custom label for this backend.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the maximum age of an entry, measured from its last write.
    ///
    /// Reads do not extend it. Entries written with a shorter expiration
    /// expire earlier.
    ///
    /// # Default
    ///
    /// 10 minutes
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Sets the eviction policy for the cache.
    ///
    /// # Default
    ///
    /// [`EvictionPolicy::lru()`]: under capacity pressure the least recently
    /// used entry goes first.
    ///
    /// # Options
    ///
    /// | Policy | Description | Best for |
    /// |--------|-------------|----------|
    /// | [`lru()`](EvictionPolicy::lru) | Pure least-recently-used | Predictable eviction |
    /// | [`tiny_lfu()`](EvictionPolicy::tiny_lfu) | LRU eviction + LFU admission | Skewed workloads |
    ///
    /// TinyLFU may refuse to admit a new entry at all when the cache is full.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    fn into_parts(self) -> (MokaCacheBuilder, SmolStr, Duration)
    where
        Cap: Capacity,
    {
        let listener_label = self.label.clone();
        let builder = CacheBuilder::new(self.capacity.limit())
            .name(self.label.as_str())
            .eviction_policy(self.eviction_policy.unwrap_or_else(EvictionPolicy::lru))
            .expire_after(Expiration {
                max_age: self.max_age,
            })
            .eviction_listener(move |key: Arc<CacheKey>, _value, cause| {
                trace!(backend = %listener_label, %key, cause = metrics::cause_label(cause), "entry dropped");
                metrics::record_eviction(&listener_label, cause);
            });
        (builder, self.label, self.max_age)
    }
}

/// Capacity states that can be built.
pub(crate) trait Capacity {
    fn limit(&self) -> u64;
}

impl Capacity for EntryCapacity {
    fn limit(&self) -> u64 {
        self.0
    }
}

impl Capacity for ByteCapacity {
    fn limit(&self) -> u64 {
        self.0
    }
}

impl MokaBackendBuilder<EntryCapacity> {
    /// Builds the [`MokaBackend`] with entry-count capacity.
    pub fn build(self) -> MokaBackend {
        let (builder, label, max_age) = self.into_parts();
        MokaBackend::new(builder.build(), label, max_age)
    }
}

impl MokaBackendBuilder<ByteCapacity> {
    /// Builds the [`MokaBackend`] with byte-based capacity.
    pub fn build(self) -> MokaBackend {
        let (builder, label, max_age) = self.into_parts();
        MokaBackend::new(builder.weigher(Self::byte_weigher).build(), label, max_age)
    }

    /// Approximate byte cost of a cache entry.
    fn byte_weigher(key: &CacheKey, value: &CacheValue<Raw>) -> u32 {
        (key.memory_size() + value.memory_size()).min(u32::MAX as usize) as u32
    }
}
