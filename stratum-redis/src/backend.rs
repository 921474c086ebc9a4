//! Redis backend implementation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use redis::{Client, aio::ConnectionManager};
use smol_str::SmolStr;
use stratum_backend::{Backend, BackendResult, DeleteStatus};
use stratum_core::{CacheKey, CacheValue, Raw};
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::error::Error;

/// Default timeout applied to every Redis operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Redis cache backend based on redis-rs crate.
///
/// It uses a [`ConnectionManager`] for asynchronous network interaction. The
/// connection is created on first use and shared by every clone of the
/// backend; a failed connection attempt is retried on the next operation.
///
/// [`ConnectionManager`]: redis::aio::ConnectionManager
#[derive(Clone)]
pub struct RedisBackend {
    client: Client,
    connection: Arc<OnceCell<ConnectionManager>>,
    timeout: Option<Duration>,
    label: SmolStr,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("label", &self.label)
            .field("timeout", &self.timeout)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl RedisBackend {
    /// Creates new RedisBackend builder with default settings.
    #[must_use]
    pub fn builder() -> RedisBackendBuilder {
        RedisBackendBuilder::default()
    }

    /// Returns the operation timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn with_timeout<T, F>(&self, operation: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, redis::RedisError>>,
    {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, operation)
                .await
                .map_err(|_| Error::Timeout(timeout))?
                .map_err(Error::from),
            None => operation.await.map_err(Error::from),
        }
    }

    /// Create lazy connection to redis via [`ConnectionManager`]
    pub async fn connection(&self) -> Result<ConnectionManager, Error> {
        let manager = self
            .with_timeout(self.connection.get_or_try_init(|| {
                trace!("Initialize new redis connection manager");
                self.client.get_connection_manager()
            }))
            .await?;
        Ok(manager.clone())
    }
}

/// Part of builder pattern implementation for RedisBackend.
///
/// The server is given either as a URL ([`server`](Self::server)) or as
/// separate parts ([`host`](Self::host), [`port`](Self::port),
/// [`password`](Self::password), [`database`](Self::database)). Setting any
/// part discards a previously given URL.
#[derive(Clone)]
pub struct RedisBackendBuilder {
    url: Option<String>,
    host: String,
    port: u16,
    password: Option<String>,
    database: i64,
    timeout: Option<Duration>,
    label: SmolStr,
}

impl Default for RedisBackendBuilder {
    fn default() -> Self {
        Self {
            url: None,
            host: "127.0.0.1".to_owned(),
            port: 6379,
            password: None,
            database: 0,
            timeout: Some(DEFAULT_TIMEOUT),
            label: SmolStr::new_static("redis"),
        }
    }
}

impl RedisBackendBuilder {
    /// Set connection URL, e.g. `redis://:password@host:6379/0`.
    pub fn server(mut self, connection_info: impl Into<String>) -> Self {
        self.url = Some(connection_info.into());
        self
    }

    /// Set server host. Default `127.0.0.1`.
    pub fn host(mut self, value: impl Into<String>) -> Self {
        self.url = None;
        self.host = value.into();
        self
    }

    /// Set server port. Default `6379`.
    pub fn port(mut self, value: u16) -> Self {
        self.url = None;
        self.port = value;
        self
    }

    /// Set the password used to authenticate.
    pub fn password(mut self, value: impl Into<String>) -> Self {
        self.url = None;
        self.password = Some(value.into());
        self
    }

    /// Set the logical database index. Default `0`.
    pub fn database(mut self, value: i64) -> Self {
        self.url = None;
        self.database = value;
        self
    }

    /// Set the timeout applied to every operation. Default 2 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the operation timeout.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set a custom label for this backend.
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns the connection URL this builder would connect to.
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let (host, port, database) = (&self.host, self.port, self.database);
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{host}:{port}/{database}",
                urlencoding::encode(password)
            ),
            None => format!("redis://{host}:{port}/{database}"),
        }
    }

    /// Create new instance of Redis backend with passed settings.
    ///
    /// No connection is made until the first operation.
    pub fn build(self) -> Result<RedisBackend, Error> {
        Ok(RedisBackend {
            client: Client::open(self.connection_url())?,
            connection: Arc::new(OnceCell::new()),
            timeout: self.timeout,
            label: self.label,
        })
    }
}

/// Builds an entry from a `GET` + `PTTL` reply.
///
/// PTTL is `-1` for a key without expiry and `-2` for a missing key. A value
/// paired with `-2` or `0` expired between the two commands and is a miss.
fn entry_from_reply(
    data: Option<Vec<u8>>,
    pttl: i64,
    now: DateTime<Utc>,
) -> Option<CacheValue<Raw>> {
    let data = Bytes::from(data?);
    match pttl {
        -1 => Some(CacheValue::new(data, None)),
        pttl if pttl > 0 => Some(CacheValue::new(
            data,
            Some(now + chrono::Duration::milliseconds(pttl)),
        )),
        _ => None,
    }
}

#[async_trait]
impl Backend for RedisBackend {
    #[tracing::instrument(skip(self), level = "trace", fields(backend = %self.label))]
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        let mut con = self.connection().await?;

        let (data, pttl): (Option<Vec<u8>>, i64) = self
            .with_timeout(
                redis::pipe()
                    .atomic()
                    .cmd("GET")
                    .arg(key.as_str())
                    .cmd("PTTL")
                    .arg(key.as_str())
                    .query_async(&mut con),
            )
            .await?;

        Ok(entry_from_reply(data, pttl, Utc::now()))
    }

    #[tracing::instrument(skip(self, value), level = "trace", fields(backend = %self.label))]
    async fn write(&self, key: &CacheKey, value: CacheValue<Raw>) -> BackendResult<()> {
        let mut con = self.connection().await?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(key.as_str()).arg(value.data().as_ref());
        match value.ttl_at(Utc::now()) {
            None => {}
            Some(ttl) if ttl.is_zero() => {
                debug!("expiration already passed, deleting instead of writing");
                self.with_timeout(
                    redis::cmd("DEL")
                        .arg(key.as_str())
                        .query_async::<i64>(&mut con),
                )
                .await?;
                return Ok(());
            }
            Some(ttl) => {
                let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                cmd.arg("PX").arg(millis);
            }
        }

        self.with_timeout(cmd.query_async::<()>(&mut con)).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), level = "trace", fields(backend = %self.label))]
    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let mut con = self.connection().await?;

        let deleted: i64 = self
            .with_timeout(
                redis::cmd("DEL")
                    .arg(key.as_str())
                    .query_async(&mut con),
            )
            .await?;

        if deleted > 0 {
            Ok(DeleteStatus::Deleted(deleted as u32))
        } else {
            Ok(DeleteStatus::Missing)
        }
    }

    #[tracing::instrument(skip(self), level = "debug", fields(backend = %self.label))]
    async fn clear(&self) -> BackendResult<()> {
        let mut con = self.connection().await?;
        self.with_timeout(redis::cmd("FLUSHDB").query_async::<()>(&mut con))
            .await?;
        Ok(())
    }

    fn label(&self) -> &str {
        &self.label
    }
}
