#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use stratum_backend::testing::InMemoryBackend;
use stratum_backend::{Compose, TieredBackend};
use stratum_moka::MokaBackend;
use stratum_token::{
    Authenticator, Credentials, JwtError, JwtSigner, ManualClock, PrincipalDetails,
    PrincipalError, PrincipalLookup, TokenClaims, TokenMinter, TokenRecord, TokenService,
    TokenVerifier,
};
use tracing_subscriber::EnvFilter;

pub const SECRET: &[u8] = b"test-secret-with-at-least-thirty-two-bytes";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// Fixed set of principals with a lookup counter.
#[derive(Default)]
pub struct StaticLookup {
    principals: HashMap<String, PrincipalDetails>,
    passwords: HashMap<String, String>,
    lookups: AtomicUsize,
}

impl StaticLookup {
    pub fn with(mut self, username: &str, password: &str, enabled: bool) -> Self {
        self.principals.insert(
            username.to_owned(),
            PrincipalDetails {
                username: username.to_owned(),
                enabled,
            },
        );
        self.passwords
            .insert(username.to_owned(), password.to_owned());
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrincipalLookup for StaticLookup {
    async fn lookup(&self, username: &str) -> Result<PrincipalDetails, PrincipalError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.principals
            .get(username)
            .cloned()
            .ok_or_else(|| PrincipalError::not_found(username))
    }
}

#[async_trait]
impl Authenticator for StaticLookup {
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<PrincipalDetails, PrincipalError> {
        match self.passwords.get(&credentials.username) {
            Some(password) if *password == credentials.password => {
                self.lookup(&credentials.username).await
            }
            _ => Err(PrincipalError::InvalidCredentials),
        }
    }
}

/// Signer wrapper counting mints, with a switch to make minting fail.
pub struct CountingSigner {
    inner: JwtSigner,
    mints: AtomicUsize,
    failing: AtomicBool,
}

impl CountingSigner {
    pub fn new(inner: JwtSigner) -> Self {
        Self {
            inner,
            mints: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn mints(&self) -> usize {
        self.mints.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl TokenMinter for CountingSigner {
    fn mint(
        &self,
        principal: &str,
        claims: Option<&Map<String, Value>>,
    ) -> Result<TokenRecord, JwtError> {
        self.mints.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(JwtError::InvalidKey {
                message: "signing key unavailable".to_owned(),
            });
        }
        self.inner.mint(principal, claims)
    }
}

impl TokenVerifier for CountingSigner {
    fn decode(&self, token: &str) -> Result<TokenClaims, JwtError> {
        self.inner.decode(token)
    }
}

pub type Cache = TieredBackend<MokaBackend, InMemoryBackend>;
pub type Service = TokenService<Cache, Arc<CountingSigner>, Arc<StaticLookup>>;

pub struct Fixture {
    pub service: Service,
    pub signer: Arc<CountingSigner>,
    pub lookup: Arc<StaticLookup>,
    pub local: MokaBackend,
    pub remote: InMemoryBackend,
    pub clock: ManualClock,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();

        let clock = ManualClock::new(start());
        let signer = Arc::new(CountingSigner::new(
            JwtSigner::new(SECRET, Duration::from_secs(60 * 60), Arc::new(clock.clone()))
                .unwrap(),
        ));
        let lookup = Arc::new(
            StaticLookup::default()
                .with("alice", "wonderland", true)
                .with("bob", "builder", true)
                .with("mallory", "evil", false),
        );
        let local = MokaBackend::builder().max_entries(1_000).build();
        let remote = InMemoryBackend::new();

        let service = TokenService::new(
            local.clone().compose(remote.clone()),
            signer.clone(),
            lookup.clone(),
        )
        .with_clock(Arc::new(clock.clone()));

        Fixture {
            service,
            signer,
            lookup,
            local,
            remote,
            clock,
        }
    }

    /// Builds a second service sharing the remote tier and clock, with its
    /// own local tier, as another process would.
    pub fn peer(&self) -> Service {
        TokenService::new(
            MokaBackend::builder()
                .max_entries(1_000)
                .build()
                .compose(self.remote.clone()),
            self.signer.clone(),
            self.lookup.clone(),
        )
        .with_clock(Arc::new(self.clock.clone()))
    }
}
