//! Process-local cache tier backed by [Moka](https://github.com/moka-rs/moka).
//!
//! Entries are bounded by count (or approximate bytes) and by a maximum age
//! measured from the last write. An entry written with its own expiration
//! lives until the earlier of that expiration and the maximum age.
//!
//! ```
//! use std::time::Duration;
//! use stratum_moka::MokaBackend;
//!
//! let local = MokaBackend::builder()
//!     .max_entries(10_000)
//!     .max_age(Duration::from_secs(300))
//!     .build();
//! ```
#![warn(missing_docs)]

mod backend;
mod builder;
pub mod metrics;

pub use backend::MokaBackend;
pub use builder::{ByteCapacity, EntryCapacity, MokaBackendBuilder, NoCapacity};
pub use moka::policy::EvictionPolicy;

/// Default maximum entry count of a local tier.
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Default maximum age of a local entry, measured from its last write.
pub const DEFAULT_MAX_AGE: std::time::Duration = std::time::Duration::from_secs(10 * 60);
