//! Core types shared by every Stratum cache tier.
//!
//! - [`CacheKey`] - opaque string key, identical in every tier
//! - [`CacheValue`] - payload plus its absolute expiration instant
//! - [`Raw`] - serialized bytes, the payload type every tier stores
#![warn(missing_docs)]

pub mod key;
pub mod value;

pub use key::CacheKey;
pub use value::CacheValue;

/// Serialized cache payload as stored by the tiers.
pub type Raw = bytes::Bytes;
