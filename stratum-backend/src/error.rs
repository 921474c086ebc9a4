//! Error types for backend operations.

use crate::format::FormatError;
use thiserror::Error;

/// Error type for backend operations.
///
/// The variants separate failures a caller can recover from by retrying or
/// degrading (connectivity) from failures that indicate a bug or corrupt data
/// (internal, format).
#[derive(Debug, Error)]
pub enum BackendError {
    /// Internal backend error, state or computation error.
    ///
    /// Any error not related to network interaction.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// Network interaction error.
    ///
    /// The remote store was unreachable, dropped the connection, or did not
    /// answer before the operation timeout.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),

    /// Serialization or deserialization error.
    #[error(transparent)]
    FormatError(#[from] FormatError),

    /// The write reached the first tier only.
    ///
    /// The entry is readable from this process but is missing (or stale) in
    /// the shared tier and is lost if the local tier evicts it.
    #[error("degraded write, entry stored in the local tier only: {0}")]
    DegradedWrite(#[source] Box<BackendError>),

    /// Both tiers of a composition failed.
    #[error("both cache layers failed - L1: {l1}, L2: {l2}")]
    BothLayersFailed {
        /// Error from L1 layer
        l1: Box<BackendError>,
        /// Error from L2 layer
        l2: Box<BackendError>,
    },
}

impl BackendError {
    /// Wraps any error as a connectivity failure.
    pub fn connection(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        BackendError::ConnectionError(Box::new(error))
    }

    /// Wraps any error as an internal failure.
    pub fn internal(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        BackendError::InternalError(Box::new(error))
    }

    /// Returns `true` if the failure was caused by the network or a timeout.
    ///
    /// Degraded writes and double-tier failures are connectivity failures when
    /// the underlying remote error is one.
    pub fn is_connectivity(&self) -> bool {
        match self {
            BackendError::ConnectionError(_) => true,
            BackendError::DegradedWrite(inner) => inner.is_connectivity(),
            BackendError::BothLayersFailed { l1, l2 } => {
                l1.is_connectivity() || l2.is_connectivity()
            }
            _ => false,
        }
    }

    /// Returns `true` if the write succeeded in the local tier only.
    pub fn is_degraded_write(&self) -> bool {
        matches!(self, BackendError::DegradedWrite(_))
    }
}
