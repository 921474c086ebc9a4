//! Token lifecycle policy on top of a tiered cache.
//!
//! [`TokenService`] keeps at most one live token per principal in a cache and
//! decides on every request whether that token can be reused, must be renewed
//! ahead of its expiry, or has to be minted from scratch. The cache entry
//! doubles as a revocation gate: a token is only accepted while the entry
//! for its principal exists and carries the same token id.
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use stratum_backend::Compose;
//! use stratum_token::{JwtSigner, SystemClock, TokenService};
//!
//! let signer = JwtSigner::new(secret, Duration::from_secs(3600), Arc::new(SystemClock))?;
//! let tokens = TokenService::new(moka.compose(redis), signer, users);
//!
//! let token = tokens.get_or_create_token("alice").await?;
//! assert!(tokens.is_token_valid(&token, "alice").await?);
//! ```

pub mod clock;
pub mod error;
pub mod principal;
pub mod record;
pub mod service;
pub mod signer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::TokenError;
pub use principal::{
    Authenticator, CachedPrincipalLookup, Credentials, PrincipalDetails, PrincipalError,
    PrincipalLookup,
};
pub use record::{TokenClaims, TokenRecord};
pub use service::{TokenService, TokenSettings, TokenState};
pub use signer::{JwtError, JwtSigner, TokenMinter, TokenVerifier};
