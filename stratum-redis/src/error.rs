//! Error types for Redis backend operations.
//!
//! All errors convert into [`BackendError`]. Failures reaching the server
//! (I/O, refused or dropped connections, timeouts) become
//! [`BackendError::ConnectionError`]; everything else becomes
//! [`BackendError::InternalError`].

use std::time::Duration;

use redis::RedisError;
use stratum_backend::BackendError;

/// Error type for Redis backend operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client.
    ///
    /// This includes connection failures, protocol errors, authentication
    /// failures, and command execution errors.
    #[error("Redis backend error: {0}")]
    Redis(#[from] RedisError),

    /// The operation did not complete within the configured timeout.
    #[error("Redis operation timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Returns `true` if the server could not be reached in time.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Error::Redis(error) => {
                error.is_io_error()
                    || error.is_connection_refusal()
                    || error.is_connection_dropped()
                    || error.is_timeout()
            }
            Error::Timeout(_) => true,
        }
    }
}

impl From<Error> for BackendError {
    fn from(error: Error) -> Self {
        if error.is_connectivity() {
            Self::ConnectionError(Box::new(error))
        } else {
            Self::InternalError(Box::new(error))
        }
    }
}
