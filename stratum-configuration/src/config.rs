use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stratum_backend::{RefillPolicy, TieredBackend};
use stratum_moka::MokaBackend;
use stratum_redis::{RedisBackend, RedisBackendBuilder};
use stratum_token::{Clock, JwtSigner, TokenSettings};

use crate::{ConfigError, Secret};

/// Root configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Process-local tier.
    #[serde(default)]
    pub local: LocalConfig,
    /// Shared remote tier.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Whether remote hits are copied into the local tier.
    #[serde(default)]
    pub refill: Refill,
    /// Token lifecycle.
    pub token: TokenConfig,
}

/// Local tier settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LocalConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    #[serde(default = "default_max_age", with = "humantime_serde")]
    pub max_age: Duration,
    /// Optional label for this backend (used in metrics/tracing).
    #[serde(default)]
    pub label: Option<String>,
}

impl Default for LocalConfig {
    fn default() -> Self {
        LocalConfig {
            max_entries: default_max_entries(),
            max_age: default_max_age(),
            label: None,
        }
    }
}

fn default_max_entries() -> u64 {
    stratum_moka::DEFAULT_MAX_ENTRIES
}

fn default_max_age() -> Duration {
    stratum_moka::DEFAULT_MAX_AGE
}

/// Remote tier settings.
///
/// `url` takes precedence over the individual connection fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    #[serde(default)]
    pub url: Option<Secret>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub password: Option<Secret>,
    #[serde(default)]
    pub database: i64,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Optional label for this backend (used in metrics/tracing).
    #[serde(default)]
    pub label: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: None,
            host: default_host(),
            port: default_port(),
            password: None,
            database: 0,
            timeout: default_timeout(),
            label: None,
        }
    }
}

fn default_host() -> String {
    "localhost".to_owned()
}

fn default_port() -> u16 {
    6379
}

fn default_timeout() -> Option<Duration> {
    Some(stratum_redis::backend::DEFAULT_TIMEOUT)
}

impl RemoteConfig {
    /// Returns a builder carrying these settings.
    pub fn builder(&self) -> RedisBackendBuilder {
        let mut builder = RedisBackend::builder()
            .host(self.host.clone())
            .port(self.port)
            .database(self.database);
        if let Some(password) = &self.password {
            builder = builder.password(password.expose());
        }
        if let Some(url) = &self.url {
            builder = builder.server(url.expose());
        }
        builder = match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder.no_timeout(),
        };
        if let Some(label) = &self.label {
            builder = builder.label(label.as_str());
        }
        builder
    }
}

/// Refill policy of the tiered cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum Refill {
    #[default]
    Always,
    Never,
}

impl From<Refill> for RefillPolicy {
    fn from(refill: Refill) -> Self {
        match refill {
            Refill::Always => RefillPolicy::Always,
            Refill::Never => RefillPolicy::Never,
        }
    }
}

/// Token settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    /// HMAC secret, at least 32 bytes.
    pub secret: Secret,
    #[serde(default = "default_lifetime", with = "humantime_serde")]
    pub lifetime: Duration,
    #[serde(default = "default_lifetime", with = "humantime_serde")]
    pub cache_ttl: Duration,
    #[serde(default = "default_renewal_threshold", with = "humantime_serde")]
    pub renewal_threshold: Duration,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_lifetime() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_renewal_threshold() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_key_prefix() -> String {
    "token:".to_owned()
}

impl Config {
    /// Parses and validates a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_saphyr::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.local.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "local.max_entries must be positive".to_owned(),
            ));
        }
        if self.local.max_age.is_zero() {
            return Err(ConfigError::Invalid(
                "local.max_age must be positive".to_owned(),
            ));
        }
        if self.token.lifetime.is_zero() {
            return Err(ConfigError::Invalid(
                "token.lifetime must be positive".to_owned(),
            ));
        }
        if self.token.renewal_threshold >= self.token.lifetime {
            return Err(ConfigError::Invalid(
                "token.renewal_threshold must be shorter than token.lifetime".to_owned(),
            ));
        }
        Ok(())
    }

    /// Builds the local tier.
    pub fn local_backend(&self) -> MokaBackend {
        let mut builder = MokaBackend::builder();
        if let Some(label) = &self.local.label {
            builder = builder.label(label.as_str());
        }
        builder
            .max_entries(self.local.max_entries)
            .max_age(self.local.max_age)
            .build()
    }

    /// Builds the remote tier. No connection is made yet.
    pub fn remote_backend(&self) -> Result<RedisBackend, ConfigError> {
        Ok(self.remote.builder().build()?)
    }

    /// Builds the local tier in front of the remote tier.
    pub fn tiered_backend(&self) -> Result<TieredBackend<MokaBackend, RedisBackend>, ConfigError> {
        Ok(TieredBackend::new(self.local_backend(), self.remote_backend()?)
            .refill(self.refill.into()))
    }

    /// Builds the token signer.
    pub fn signer(&self, clock: Arc<dyn Clock>) -> Result<JwtSigner, ConfigError> {
        Ok(JwtSigner::new(
            self.token.secret.expose(),
            self.token.lifetime,
            clock,
        )?)
    }

    /// Returns the token service settings.
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            cache_ttl: self.token.cache_ttl,
            renewal_threshold: self.token.renewal_threshold,
            key_prefix: self.token.key_prefix.clone(),
        }
    }
}
