//! Token reuse, renewal and revocation.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use stratum_backend::{Backend, TypedCache};
use tracing::{debug, info, trace};

use crate::clock::{Clock, SystemClock};
use crate::error::TokenError;
use crate::principal::{Authenticator, Credentials, PrincipalDetails, PrincipalLookup};
use crate::record::TokenRecord;
use crate::signer::{TokenMinter, TokenVerifier};

/// Tuning of the token lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSettings {
    /// How long a minted token stays in the cache.
    pub cache_ttl: Duration,
    /// A cached token with this much lifetime left, or less, is replaced.
    pub renewal_threshold: Duration,
    /// Prefix of the cache key; the principal name is appended.
    pub key_prefix: String,
}

impl Default for TokenSettings {
    fn default() -> Self {
        TokenSettings {
            cache_ttl: Duration::from_secs(60 * 60),
            renewal_threshold: Duration::from_secs(5 * 60),
            key_prefix: "token:".to_owned(),
        }
    }
}

/// What the cache holds for a principal right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    /// No cached token.
    Absent,
    /// Remaining lifetime is strictly greater than the renewal threshold.
    Fresh(TokenRecord),
    /// Remaining lifetime is at or below the renewal threshold.
    Stale(TokenRecord),
}

/// Hands out one live token per principal and gates token acceptance on it.
///
/// `B` is the cache (usually a tiered local+remote backend), `S` signs and
/// verifies tokens and `L` resolves principals.
///
/// Renewal is not locked across callers: two callers that both see a stale
/// token each mint a replacement and the last write wins. The loser's token
/// still verifies cryptographically but carries a token id that no longer
/// matches the cache, so [`is_token_valid`](Self::is_token_valid) rejects it.
pub struct TokenService<B, S, L> {
    cache: TypedCache<TokenRecord, B>,
    signer: S,
    lookup: L,
    clock: Arc<dyn Clock>,
    settings: TokenSettings,
}

impl<B, S, L> TokenService<B, S, L>
where
    B: Backend,
    S: TokenMinter + TokenVerifier,
    L: PrincipalLookup,
{
    /// Creates a service with default settings and the system clock.
    pub fn new(backend: B, signer: S, lookup: L) -> Self {
        TokenService {
            cache: TypedCache::new(backend),
            signer,
            lookup,
            clock: Arc::new(SystemClock),
            settings: TokenSettings::default(),
        }
    }

    /// Replaces the settings.
    pub fn with_settings(mut self, settings: TokenSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the clock used for renewal decisions.
    ///
    /// Should be the same clock the signer checks expiry against.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the settings.
    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Returns the signer.
    pub fn signer(&self) -> &S {
        &self.signer
    }

    fn key(&self, principal: &str) -> String {
        format!("{}{}", self.settings.key_prefix, principal)
    }

    /// Classifies the cached token of `principal`.
    #[tracing::instrument(skip(self), level = "trace")]
    pub async fn token_state(&self, principal: &str) -> Result<TokenState, TokenError> {
        let state = match self.cache.get(&self.key(principal)).await? {
            None => TokenState::Absent,
            Some(record) => {
                if record.remaining(self.clock.now()) > self.settings.renewal_threshold {
                    TokenState::Fresh(record)
                } else {
                    TokenState::Stale(record)
                }
            }
        };
        Ok(state)
    }

    /// Returns the cached token of `principal`, minting one when absent or
    /// close to expiry.
    pub async fn get_or_create_token(&self, principal: &str) -> Result<String, TokenError> {
        self.get_or_create(principal, None).await
    }

    /// Like [`get_or_create_token`](Self::get_or_create_token), embedding
    /// `claims` when a new token is minted. A fresh cached token is returned
    /// as is, whatever claims it carries.
    pub async fn get_or_create_token_with_claims(
        &self,
        principal: &str,
        claims: &Map<String, Value>,
    ) -> Result<String, TokenError> {
        self.get_or_create(principal, Some(claims)).await
    }

    #[tracing::instrument(skip(self, claims), level = "trace")]
    async fn get_or_create(
        &self,
        principal: &str,
        claims: Option<&Map<String, Value>>,
    ) -> Result<String, TokenError> {
        match self.token_state(principal).await? {
            TokenState::Fresh(record) => {
                trace!("reusing cached token");
                Ok(record.token)
            }
            TokenState::Absent => {
                debug!("no cached token, minting");
                self.issue(principal, claims).await
            }
            TokenState::Stale(record) => {
                debug!(expires_at = %record.expires_at, "cached token close to expiry, renewing");
                self.cache.evict(&self.key(principal)).await?;
                self.issue(principal, claims).await
            }
        }
    }

    async fn issue(
        &self,
        principal: &str,
        claims: Option<&Map<String, Value>>,
    ) -> Result<String, TokenError> {
        let record = self
            .signer
            .mint(principal, claims)
            .map_err(TokenError::Mint)?;
        self.cache
            .put_with_ttl(&self.key(principal), &record, self.settings.cache_ttl)
            .await?;
        info!(principal, token_id = %record.token_id, "token issued");
        Ok(record.token)
    }

    /// Drops the cached token of `principal`. Idempotent.
    ///
    /// Every token issued for `principal` is rejected from then on, until a
    /// new one is issued.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn invalidate_token(&self, principal: &str) -> Result<(), TokenError> {
        self.cache.evict(&self.key(principal)).await?;
        Ok(())
    }

    /// Returns `true` if `token` is the live token of `principal`.
    ///
    /// `false` when nothing is cached for `principal` (revoked or expired),
    /// when verification fails, or when `token` is not the cached one.
    /// [`TokenError::PrincipalNotFound`] when `principal` does not exist.
    pub async fn is_token_valid(&self, token: &str, principal: &str) -> Result<bool, TokenError> {
        Ok(self.validate(token, principal).await?.is_some())
    }

    #[tracing::instrument(skip(self, token), level = "trace")]
    async fn validate(
        &self,
        token: &str,
        principal: &str,
    ) -> Result<Option<PrincipalDetails>, TokenError> {
        let Some(record) = self.cache.get(&self.key(principal)).await? else {
            trace!("no cached token, rejecting");
            return Ok(None);
        };

        let details = self.lookup.lookup(principal).await?;

        let claims = match self.signer.verify(token, &details) {
            Ok(claims) => claims,
            Err(error) => {
                debug!(%error, "token verification failed");
                return Ok(None);
            }
        };

        if claims.jti != record.token_id {
            debug!("token superseded by a newer one");
            return Ok(None);
        }
        Ok(Some(details))
    }

    /// Resolves an `Authorization` header value to the principal it carries.
    pub async fn authenticate(&self, authorization: &str) -> Result<PrincipalDetails, TokenError> {
        let token = authorization
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(TokenError::MissingBearer)?;

        let subject = match self.signer.decode(token) {
            Ok(claims) => claims.sub,
            Err(error) => {
                debug!(%error, "bearer token rejected");
                return Err(TokenError::InvalidToken);
            }
        };

        self.validate(token, &subject)
            .await?
            .ok_or(TokenError::InvalidToken)
    }

    /// Checks `credentials` and returns a token for the authenticated principal.
    #[tracing::instrument(skip(self, authenticator), level = "debug")]
    pub async fn login<A>(
        &self,
        authenticator: &A,
        credentials: &Credentials,
    ) -> Result<String, TokenError>
    where
        A: Authenticator + ?Sized,
    {
        let details = authenticator.authenticate(credentials).await?;
        if !details.enabled {
            return Err(TokenError::InvalidCredentials);
        }
        self.get_or_create_token(&details.username).await
    }
}
