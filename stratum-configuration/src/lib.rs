//! YAML configuration for the cache tiers and the token service.
//!
//! ```yaml
//! local:
//!   max_entries: 10000
//!   max_age: 10m
//! remote:
//!   host: localhost
//!   port: 6379
//!   database: 0
//!   timeout: 2s
//! refill: Always
//! token:
//!   secret: "at-least-thirty-two-bytes-of-secret-material"
//!   lifetime: 60m
//!   renewal_threshold: 5m
//! ```
//!
//! Every section except `token.secret` has defaults.

mod config;
mod error;
mod secret;

pub use config::{Config, LocalConfig, Refill, RemoteConfig, TokenConfig};
pub use error::ConfigError;
pub use secret::Secret;
