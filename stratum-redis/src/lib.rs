//! Shared remote cache tier backed by Redis.
//!
//! Values are stored as plain strings under the caller's key (`SET`), with
//! the expiration translated into a millisecond TTL (`PX`). Every process
//! pointing at the same logical database sees the same entries.
//!
//! ```no_run
//! use std::time::Duration;
//! use stratum_redis::RedisBackend;
//!
//! # fn main() -> Result<(), stratum_redis::error::Error> {
//! let remote = RedisBackend::builder()
//!     .host("cache.internal")
//!     .port(6379)
//!     .database(2)
//!     .timeout(Duration::from_millis(500))
//!     .build()?;
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]

pub mod backend;
pub mod error;

#[doc(inline)]
pub use crate::backend::{RedisBackend, RedisBackendBuilder};
