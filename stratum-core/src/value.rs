//! Cached value with absolute expiration.
//!
//! [`CacheValue`] pairs a payload with the instant it stops being valid. The
//! instant is absolute wall-clock time (not sliding): reading an entry never
//! extends it. `expire = None` means the writer supplied no TTL and the tier
//! applies its own policy (the local tier caps every entry at its max age,
//! the remote tier keeps it until evicted).
//!
//! ```
//! use stratum_core::CacheValue;
//! use std::time::Duration;
//!
//! let value = CacheValue::with_ttl("session", Duration::from_secs(60));
//! assert!(!value.is_expired());
//! assert!(value.ttl().unwrap() <= Duration::from_secs(60));
//!
//! let forever = CacheValue::new("config", None);
//! assert_eq!(forever.ttl(), None);
//! ```

use chrono::{DateTime, Utc};
use std::mem::size_of;
use std::time::Duration;

use crate::Raw;

/// A cached payload with optional absolute expiration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheValue<T> {
    data: T,
    expire: Option<DateTime<Utc>>,
}

impl<T> CacheValue<T> {
    /// Creates a cache value expiring at `expire` (or never, if `None`).
    pub fn new(data: T, expire: Option<DateTime<Utc>>) -> Self {
        CacheValue { data, expire }
    }

    /// Creates a cache value expiring `ttl` from now.
    ///
    /// A `ttl` too large to represent is treated as no expiration.
    pub fn with_ttl(data: T, ttl: Duration) -> Self {
        let expire = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));
        CacheValue { data, expire }
    }

    /// Returns a reference to the cached data.
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Returns when the data expires.
    #[inline]
    pub fn expire(&self) -> Option<DateTime<Utc>> {
        self.expire
    }

    /// Consumes the value and returns the inner data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Consumes the value and returns the expiration and data separately.
    pub fn into_parts(self) -> (Option<DateTime<Utc>>, T) {
        (self.expire, self.data)
    }

    /// Replaces the payload, keeping the expiration.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheValue<U> {
        CacheValue {
            data: f(self.data),
            expire: self.expire,
        }
    }

    /// Remaining lifetime measured from `now`.
    ///
    /// Returns `None` when there is no expiration, `Some(Duration::ZERO)` once
    /// the value has expired.
    pub fn ttl_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expire.map(|expire| {
            expire
                .signed_duration_since(now)
                .to_std()
                .unwrap_or(Duration::ZERO)
        })
    }

    /// Remaining lifetime measured from the current time.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_at(Utc::now())
    }

    /// Returns `true` at or after the expiration instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expire, Some(expire) if expire <= now)
    }

    /// Returns `true` if the value has expired by the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl CacheValue<Raw> {
    /// Returns the estimated memory usage of this cache value in bytes.
    pub fn memory_size(&self) -> usize {
        size_of::<Self>() + self.data.len()
    }
}
