//! Principal lookup and credential checking.
//!
//! Both are supplied by the embedding application; this crate only consumes
//! them. [`CachedPrincipalLookup`] memoizes any lookup through a typed cache.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stratum_backend::{Backend, TypedCache};
use tracing::{debug, warn};

/// What the token layer needs to know about a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalDetails {
    /// Unique username, used as the token subject.
    pub username: String,
    /// Disabled principals never get a token accepted.
    pub enabled: bool,
}

/// Username and password presented at login.
#[derive(Clone)]
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Plain-text password, checked by the [`Authenticator`].
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Errors reported by [`PrincipalLookup`] and [`Authenticator`].
#[derive(Debug, thiserror::Error)]
pub enum PrincipalError {
    /// No principal with this username exists.
    #[error("principal not found: {username}")]
    NotFound {
        /// The username that was looked up.
        username: String,
    },

    /// The credentials did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The principal store could not be queried.
    #[error("principal store unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PrincipalError {
    /// Creates a `NotFound` error.
    pub fn not_found(username: impl Into<String>) -> Self {
        PrincipalError::NotFound {
            username: username.into(),
        }
    }
}

/// Resolves a username to its details.
#[async_trait]
pub trait PrincipalLookup: Send + Sync {
    /// Returns the principal, or [`PrincipalError::NotFound`].
    async fn lookup(&self, username: &str) -> Result<PrincipalDetails, PrincipalError>;
}

#[async_trait]
impl<T> PrincipalLookup for Arc<T>
where
    T: PrincipalLookup + ?Sized,
{
    async fn lookup(&self, username: &str) -> Result<PrincipalDetails, PrincipalError> {
        (**self).lookup(username).await
    }
}

/// Checks credentials.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns the principal if the credentials are valid.
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<PrincipalDetails, PrincipalError>;
}

/// Default key prefix of memoized principals.
pub const DEFAULT_PRINCIPAL_PREFIX: &str = "principal:";

/// [`PrincipalLookup`] that memoizes successful lookups in a cache.
///
/// Not-found answers are never cached, so a principal created after a failed
/// lookup is visible immediately. A cache failure falls through to the inner
/// lookup.
pub struct CachedPrincipalLookup<L, B> {
    inner: L,
    cache: TypedCache<PrincipalDetails, B>,
    ttl: Duration,
    key_prefix: String,
}

impl<L, B> CachedPrincipalLookup<L, B>
where
    L: PrincipalLookup,
    B: Backend,
{
    /// Wraps `inner`, keeping results in `backend` for `ttl`.
    pub fn new(inner: L, backend: B, ttl: Duration) -> Self {
        CachedPrincipalLookup {
            inner,
            cache: TypedCache::new(backend),
            ttl,
            key_prefix: DEFAULT_PRINCIPAL_PREFIX.to_owned(),
        }
    }

    /// Sets the key prefix.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Drops the memoized entry for `username`.
    pub async fn forget(&self, username: &str) -> Result<(), stratum_backend::BackendError> {
        self.cache.evict(&self.key(username)).await.map(|_| ())
    }

    fn key(&self, username: &str) -> String {
        format!("{}{}", self.key_prefix, username)
    }
}

#[async_trait]
impl<L, B> PrincipalLookup for CachedPrincipalLookup<L, B>
where
    L: PrincipalLookup,
    B: Backend,
{
    async fn lookup(&self, username: &str) -> Result<PrincipalDetails, PrincipalError> {
        let key = self.key(username);
        match self.cache.get(&key).await {
            Ok(Some(details)) => {
                debug!(username, "principal served from cache");
                return Ok(details);
            }
            Ok(None) => {}
            Err(error) => warn!(username, %error, "principal cache read failed"),
        }

        let details = self.inner.lookup(username).await?;
        if let Err(error) = self.cache.put_with_ttl(&key, &details, self.ttl).await {
            warn!(username, %error, "failed to memoize principal");
        }
        Ok(details)
    }
}
