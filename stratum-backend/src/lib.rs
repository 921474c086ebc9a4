//! Backend capability, typed caches and tier composition.
//!
//! Every tier in Stratum implements [`Backend`]: a byte-oriented store with
//! per-entry expiration. [`TypedCache`] adds typed access on top of any
//! backend, and [`TieredBackend`] stacks a fast local tier in front of a
//! shared remote tier.
//!
//! ```ignore
//! use stratum_backend::{Compose, TypedCache};
//! use stratum_moka::MokaBackend;
//! use stratum_redis::RedisBackend;
//!
//! let local = MokaBackend::builder().max_entries(10_000).build();
//! let remote = RedisBackend::builder().server("redis://127.0.0.1/").build()?;
//! let cache: TypedCache<String, _> = TypedCache::new(local.compose(remote));
//! ```
mod backend;
mod cache;
pub mod composition;
mod error;
pub mod format;
pub mod metrics;
#[cfg(feature = "test-helpers")]
pub mod testing;

pub use backend::{Backend, BackendResult};
pub use cache::TypedCache;
pub use composition::{Compose, RefillPolicy, TieredBackend};
pub use error::BackendError;
pub use format::{BincodeFormat, Format, FormatError, JsonFormat};

/// Status of deleting result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record successfully deleted from the given number of tiers.
    Deleted(u32),
    /// Record already missing.
    Missing,
}

impl DeleteStatus {
    /// Merges the outcome of removing the same key from two tiers.
    pub fn merge(self, other: DeleteStatus) -> DeleteStatus {
        match (self, other) {
            (DeleteStatus::Deleted(a), DeleteStatus::Deleted(b)) => DeleteStatus::Deleted(a + b),
            (DeleteStatus::Deleted(a), DeleteStatus::Missing)
            | (DeleteStatus::Missing, DeleteStatus::Deleted(a)) => DeleteStatus::Deleted(a),
            (DeleteStatus::Missing, DeleteStatus::Missing) => DeleteStatus::Missing,
        }
    }
}
