//! Value serialization formats.
//!
//! Tiers store [`Raw`] bytes; a [`Format`] turns a typed value into bytes and
//! back. A [`TypedCache`](crate::TypedCache) owns exactly one format, so every
//! tier behind it sees the same encoding.
//!
//! | Format | Size | Human-readable |
//! |--------|------|----------------|
//! | [`JsonFormat`] | Large | Yes |
//! | [`BincodeFormat`] | Compact | No |

use serde::{Serialize, de::DeserializeOwned};
use stratum_core::Raw;
use thiserror::Error;

mod bincode;
mod json;

pub use bincode::BincodeFormat;
pub use json::JsonFormat;

/// Error produced while encoding or decoding a cached value.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The value could not be encoded.
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    /// The stored bytes could not be decoded into the requested type.
    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// A value encoding used by typed caches.
pub trait Format: Send + Sync {
    /// Encodes `value` into bytes.
    fn serialize<T>(&self, value: &T) -> Result<Raw, FormatError>
    where
        T: Serialize;

    /// Decodes bytes produced by [`Format::serialize`].
    fn deserialize<T>(&self, data: &[u8]) -> Result<T, FormatError>
    where
        T: DeserializeOwned;
}
