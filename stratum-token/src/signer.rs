//! Token minting and verification.
//!
//! [`JwtSigner`] issues HS256 tokens. It owns its key material from
//! construction on and holds no mutable state, so one instance can be shared
//! by every request.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::clock::Clock;
use crate::principal::PrincipalDetails;
use crate::record::{TokenClaims, TokenRecord};

/// Minimum HMAC secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Default token lifetime.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(60 * 60);

const RESERVED_CLAIMS: [&str; 7] = ["sub", "iat", "exp", "jti", "nbf", "iss", "aud"];

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    Encoding {
        /// Description of the encoding error.
        message: String,
    },

    /// The token is malformed or its claims are unusable.
    #[error("Failed to decode token: {message}")]
    Decoding {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token was issued for another principal.
    #[error("Token subject does not match the expected principal")]
    SubjectMismatch,

    /// The principal is disabled.
    #[error("Principal is disabled")]
    Disabled,

    /// The token lifetime is zero.
    #[error("Token lifetime must be positive")]
    InvalidLifetime,

    /// Invalid key material.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },
}

impl JwtError {
    /// Returns `true` if the token itself was rejected.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Decoding { .. }
                | Self::Expired
                | Self::InvalidSignature
                | Self::SubjectMismatch
                | Self::Disabled
        )
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidKeyFormat => Self::InvalidKey {
                message: err.to_string(),
            },
            _ => Self::Decoding {
                message: err.to_string(),
            },
        }
    }
}

/// Issues signed tokens for a principal.
pub trait TokenMinter: Send + Sync {
    /// Mints a new token for `principal`.
    ///
    /// `claims` are embedded next to the standard claims; reserved names are
    /// ignored.
    fn mint(
        &self,
        principal: &str,
        claims: Option<&Map<String, Value>>,
    ) -> Result<TokenRecord, JwtError>;
}

/// Checks tokens issued by a [`TokenMinter`].
///
/// Every failure is a rejection; there is no partial success.
pub trait TokenVerifier: Send + Sync {
    /// Verifies structure, signature and expiry, and returns the claims.
    fn decode(&self, token: &str) -> Result<TokenClaims, JwtError>;

    /// Verifies `token` for `expected`: [`decode`](Self::decode), then the
    /// subject must be `expected.username` and the principal must be enabled.
    fn verify(&self, token: &str, expected: &PrincipalDetails) -> Result<TokenClaims, JwtError> {
        let claims = self.decode(token)?;
        if claims.sub != expected.username {
            return Err(JwtError::SubjectMismatch);
        }
        if !expected.enabled {
            return Err(JwtError::Disabled);
        }
        Ok(claims)
    }
}

impl<T> TokenMinter for Arc<T>
where
    T: TokenMinter + ?Sized,
{
    fn mint(
        &self,
        principal: &str,
        claims: Option<&Map<String, Value>>,
    ) -> Result<TokenRecord, JwtError> {
        (**self).mint(principal, claims)
    }
}

impl<T> TokenVerifier for Arc<T>
where
    T: TokenVerifier + ?Sized,
{
    fn decode(&self, token: &str) -> Result<TokenClaims, JwtError> {
        (**self).decode(token)
    }

    fn verify(&self, token: &str, expected: &PrincipalDetails) -> Result<TokenClaims, JwtError> {
        (**self).verify(token, expected)
    }
}

/// HS256 signer and verifier.
pub struct JwtSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSigner")
            .field("algorithm", &Algorithm::HS256)
            .field("lifetime", &self.lifetime)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl JwtSigner {
    /// Creates a signer from a shared secret of at least [`MIN_SECRET_LEN`] bytes.
    pub fn new(
        secret: impl AsRef<[u8]>,
        lifetime: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, JwtError> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_LEN {
            return Err(JwtError::InvalidKey {
                message: format!(
                    "secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                    secret.len()
                ),
            });
        }
        if lifetime.is_zero() {
            return Err(JwtError::InvalidLifetime);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock in `decode`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);

        Ok(JwtSigner {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime,
            clock,
        })
    }

    /// Returns the lifetime of minted tokens.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

impl TokenMinter for JwtSigner {
    fn mint(
        &self,
        principal: &str,
        claims: Option<&Map<String, Value>>,
    ) -> Result<TokenRecord, JwtError> {
        let iat = self.clock.now().timestamp();
        let lifetime = i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX);
        let exp = iat.saturating_add(lifetime);

        let extra = claims
            .map(|claims| {
                claims
                    .iter()
                    .filter(|(name, _)| !RESERVED_CLAIMS.contains(&name.as_str()))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let claims = TokenClaims {
            sub: principal.to_owned(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
            extra,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(
            |e| JwtError::Encoding {
                message: e.to_string(),
            },
        )?;

        let timestamp = |secs: i64| {
            DateTime::from_timestamp(secs, 0).ok_or_else(|| JwtError::Encoding {
                message: format!("timestamp {secs} out of range"),
            })
        };

        Ok(TokenRecord {
            token,
            subject: claims.sub,
            token_id: claims.jti,
            issued_at: timestamp(iat)?,
            expires_at: timestamp(exp)?,
        })
    }
}

impl TokenVerifier for JwtSigner {
    fn decode(&self, token: &str) -> Result<TokenClaims, JwtError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;
        if data.claims.exp <= self.clock.now().timestamp() {
            return Err(JwtError::Expired);
        }
        Ok(data.claims)
    }
}
