//! Cache key type.
//!
//! A [`CacheKey`] is an opaque string. Every tier stores it verbatim, so a key
//! written through the local tier names the same entry in the remote tier.
//!
//! ```
//! use stratum_core::CacheKey;
//!
//! let key = CacheKey::new("token:alice");
//! assert_eq!(key.as_str(), "token:alice");
//! assert_eq!(format!("{}", key), "token:alice");
//!
//! // Keys can be built from a prefix and an identity.
//! let key = CacheKey::with_prefix("user:", "bob");
//! assert_eq!(key.as_str(), "user:bob");
//! ```
//!
//! [`CacheKey`] is backed by [`SmolStr`]: keys up to 23 bytes live inline and
//! clones never allocate.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::borrow::Borrow;
use std::fmt;

/// Opaque cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(SmolStr);

impl CacheKey {
    /// Creates a key from any string-like value.
    pub fn new(key: impl Into<SmolStr>) -> Self {
        CacheKey(key.into())
    }

    /// Creates a key by concatenating `prefix` and `id`.
    pub fn with_prefix(prefix: &str, id: &str) -> Self {
        let mut key = String::with_capacity(prefix.len() + id.len());
        key.push_str(prefix);
        key.push_str(id);
        CacheKey(SmolStr::from(key))
    }

    /// Returns the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the key as bytes, the form remote stores receive.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Returns the estimated memory usage of this key in bytes.
    ///
    /// Inline keys cost only the struct itself, heap keys add their length.
    pub fn memory_size(&self) -> usize {
        let inline = std::mem::size_of::<Self>();
        if self.0.is_heap_allocated() {
            inline + self.0.len()
        } else {
            inline
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        CacheKey::new(value)
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        CacheKey::new(value)
    }
}

impl From<&String> for CacheKey {
    fn from(value: &String) -> Self {
        CacheKey::new(value.as_str())
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for CacheKey {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}
