//! Fluent construction of tiered backends.
//!
//! ```ignore
//! use stratum_backend::{Compose, RefillPolicy};
//!
//! let cache = moka.compose(redis);
//! let no_refill = moka.compose_with(redis, RefillPolicy::Never);
//! ```

use super::{RefillPolicy, TieredBackend};
use crate::Backend;

/// Builds a [`TieredBackend`] with `self` as the local tier.
///
/// Implemented for every [`Backend`].
pub trait Compose: Backend + Sized {
    /// Puts `self` in front of `remote`, refilling the local tier on remote hits.
    fn compose<R>(self, remote: R) -> TieredBackend<Self, R>
    where
        R: Backend,
    {
        TieredBackend::new(self, remote)
    }

    /// Puts `self` in front of `remote` with an explicit refill policy.
    fn compose_with<R>(self, remote: R, refill: RefillPolicy) -> TieredBackend<Self, R>
    where
        R: Backend,
    {
        TieredBackend::new(self, remote).refill(refill)
    }
}

impl<T> Compose for T where T: Backend {}
