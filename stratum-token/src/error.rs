//! Error type of the token service.

use stratum_backend::BackendError;

use crate::principal::PrincipalError;
use crate::signer::JwtError;

/// Error returned by [`TokenService`](crate::TokenService) operations.
///
/// A rejected token is not an error for [`is_token_valid`], which answers
/// `false`; the variants here are the conditions a caller must branch on.
///
/// [`is_token_valid`]: crate::TokenService::is_token_valid
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The principal does not exist.
    #[error("principal not found: {username}")]
    PrincipalNotFound {
        /// The username that was looked up.
        username: String,
    },

    /// Login failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The principal store could not be queried.
    #[error("principal store unavailable: {0}")]
    PrincipalUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A cache tier failed.
    #[error("token cache error: {0}")]
    Cache(#[from] BackendError),

    /// A token could not be minted.
    #[error("failed to mint token: {0}")]
    Mint(#[source] JwtError),

    /// The authorization header is missing or not a bearer token.
    #[error("missing bearer token")]
    MissingBearer,

    /// The presented token was rejected.
    #[error("invalid token")]
    InvalidToken,
}

impl TokenError {
    /// Returns `true` if the principal does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TokenError::PrincipalNotFound { .. })
    }

    /// Returns `true` if a cache tier could not be reached.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, TokenError::Cache(error) if error.is_connectivity())
    }

    /// Returns `true` if the caller should be answered with an authorization failure.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            TokenError::InvalidCredentials | TokenError::MissingBearer | TokenError::InvalidToken
        )
    }
}

impl From<PrincipalError> for TokenError {
    fn from(error: PrincipalError) -> Self {
        match error {
            PrincipalError::NotFound { username } => TokenError::PrincipalNotFound { username },
            PrincipalError::InvalidCredentials => TokenError::InvalidCredentials,
            PrincipalError::Unavailable(source) => TokenError::PrincipalUnavailable(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct_from_unauthorized() {
        let error: TokenError = PrincipalError::not_found("alice").into();
        assert!(error.is_not_found());
        assert!(!error.is_unauthorized());
        assert!(TokenError::InvalidToken.is_unauthorized());
        assert!(!TokenError::InvalidToken.is_not_found());
    }

    #[test]
    fn test_connectivity() {
        let error = TokenError::Cache(BackendError::connection(std::io::Error::other("down")));
        assert!(error.is_connectivity());
        assert!(!TokenError::Mint(JwtError::Expired).is_connectivity());
    }
}
