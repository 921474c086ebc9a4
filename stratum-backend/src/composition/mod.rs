//! Tiered backend that stacks a local tier in front of a remote tier.
//!
//! # Read Strategy
//! 1. Check local → Hit: return value
//! 2. Check remote → Hit: copy into local (per [`RefillPolicy`]), return value
//! 3. Miss: return None
//!
//! A local failure is logged and treated as a miss. A remote failure is
//! returned to the caller. A failed refill is logged and the remote value is
//! still returned.
//!
//! # Write Strategy
//! Write-through: the local tier is written first, then the remote tier. Both
//! writes are always attempted.
//!
//! | local | remote | result |
//! |-------|--------|--------|
//! | ok    | ok     | `Ok(())` |
//! | ok    | err    | [`BackendError::DegradedWrite`] |
//! | err   | ok     | the local error |
//! | err   | err    | [`BackendError::BothLayersFailed`] |
//!
//! # Remove and Clear
//! Both tiers run concurrently. Any failure is returned; both failing yields
//! [`BackendError::BothLayersFailed`].

pub mod compose;
pub mod policy;

pub use compose::Compose;
pub use policy::RefillPolicy;

use async_trait::async_trait;
use smol_str::SmolStr;
use stratum_core::{CacheKey, CacheValue, Raw};
use tracing::{debug, error, trace, warn};

use crate::metrics::{self, ReadOutcome};
use crate::{Backend, BackendError, BackendResult, DeleteStatus};

/// A backend combining a local tier and a remote tier.
///
/// Neither tier is aware of the other. Consistency between processes is only
/// as good as the local tier's expiry: a process that still holds a local
/// copy keeps serving it after another process overwrites or evicts the
/// remote entry.
#[derive(Debug, Clone)]
pub struct TieredBackend<L, R>
where
    L: Backend,
    R: Backend,
{
    /// Process-local tier.
    local: L,
    /// Shared tier.
    remote: R,
    refill: RefillPolicy,
    label: SmolStr,
}

impl<L, R> TieredBackend<L, R>
where
    L: Backend,
    R: Backend,
{
    /// Creates a tiered backend that refills the local tier on remote hits.
    pub fn new(local: L, remote: R) -> Self {
        TieredBackend {
            local,
            remote,
            refill: RefillPolicy::default(),
            label: SmolStr::new_static("tiered"),
        }
    }

    /// Sets the refill policy.
    pub fn refill(mut self, refill: RefillPolicy) -> Self {
        self.refill = refill;
        self
    }

    /// Sets the label used in logs and metrics.
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns the local tier.
    pub fn local(&self) -> &L {
        &self.local
    }

    /// Returns the remote tier.
    pub fn remote(&self) -> &R {
        &self.remote
    }
}

#[async_trait]
impl<L, R> Backend for TieredBackend<L, R>
where
    L: Backend,
    R: Backend,
{
    #[tracing::instrument(skip(self), level = "trace", fields(backend = %self.label))]
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        match self.local.read(key).await {
            Ok(Some(value)) => {
                trace!(tier = self.local.label(), "local hit");
                metrics::record_read(self.local.label(), ReadOutcome::Hit);
                return Ok(Some(value));
            }
            Ok(None) => {
                metrics::record_read(self.local.label(), ReadOutcome::Miss);
            }
            Err(error) => {
                warn!(tier = self.local.label(), %error, "local read failed, falling back to remote");
                metrics::record_read(self.local.label(), ReadOutcome::Error);
            }
        }

        let value = match self.remote.read(key).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                trace!(tier = self.remote.label(), "remote miss");
                metrics::record_read(self.remote.label(), ReadOutcome::Miss);
                return Ok(None);
            }
            Err(error) => {
                metrics::record_read(self.remote.label(), ReadOutcome::Error);
                return Err(error);
            }
        };
        metrics::record_read(self.remote.label(), ReadOutcome::Hit);

        if self.refill.should_refill() {
            match self.local.write(key, value.clone()).await {
                Ok(()) => {
                    debug!(tier = self.local.label(), "promoted remote hit");
                    metrics::record_promotion(&self.label);
                }
                Err(error) => {
                    warn!(tier = self.local.label(), %error, "failed to promote remote hit");
                }
            }
        }
        Ok(Some(value))
    }

    #[tracing::instrument(skip(self, value), level = "trace", fields(backend = %self.label))]
    async fn write(&self, key: &CacheKey, value: CacheValue<Raw>) -> BackendResult<()> {
        let local = self.local.write(key, value.clone()).await;
        let remote = self.remote.write(key, value).await;

        match (local, remote) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(remote)) => {
                warn!(tier = self.remote.label(), error = %remote, "degraded write, remote tier failed");
                metrics::record_degraded_write(&self.label);
                Err(BackendError::DegradedWrite(Box::new(remote)))
            }
            (Err(local), Ok(())) => {
                warn!(tier = self.local.label(), error = %local, "local write failed");
                Err(local)
            }
            (Err(local), Err(remote)) => {
                error!(local = %local, remote = %remote, "both tiers failed");
                Err(BackendError::BothLayersFailed {
                    l1: Box::new(local),
                    l2: Box::new(remote),
                })
            }
        }
    }

    #[tracing::instrument(skip(self), level = "trace", fields(backend = %self.label))]
    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let (local, remote) = futures::join!(self.local.remove(key), self.remote.remove(key));

        match (local, remote) {
            (Ok(local), Ok(remote)) => Ok(local.merge(remote)),
            (Ok(_), Err(error)) | (Err(error), Ok(_)) => Err(error),
            (Err(local), Err(remote)) => Err(BackendError::BothLayersFailed {
                l1: Box::new(local),
                l2: Box::new(remote),
            }),
        }
    }

    #[tracing::instrument(skip(self), level = "debug", fields(backend = %self.label))]
    async fn clear(&self) -> BackendResult<()> {
        let (local, remote) = futures::join!(self.local.clear(), self.remote.clear());

        match (local, remote) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(error)) | (Err(error), Ok(())) => Err(error),
            (Err(local), Err(remote)) => Err(BackendError::BothLayersFailed {
                l1: Box::new(local),
                l2: Box::new(remote),
            }),
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}
