//! Redis store implementation.

use super::{KvConnector, KvStore};
use crate::error::{Error, Result};
use redis::aio::MultiplexedConnection;
use redis::{Client, Cmd, FromRedisValue};

/// Opens connections to a Redis server.
///
/// Every handle is a single [`MultiplexedConnection`] that never reconnects on its
/// own: once the server drops the socket, each later command fails until the caller
/// builds a new backend. The adapter issues `AUTH` and `SELECT` itself, right after
/// connecting, so a silent reconnect could never restore them. `persistent` is
/// recorded on the handle as a hint only.
///
/// # Example
///
/// ```no_run
/// # use redis_cache_adapter::store::{RedisConnector, KvConnector, KvStore};
/// # use redis_cache_adapter::error::Result;
/// # async fn example() -> Result<()> {
/// let mut conn = RedisConnector::new().connect("127.0.0.1", 6379, false).await?;
/// conn.set("key", b"value", 60).await?;
/// let value = conn.get("key").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct RedisConnector {
    tls: bool,
}

impl RedisConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect with `rediss://` instead of `redis://`.
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    fn url(&self, host: &str, port: u16) -> String {
        let scheme = if self.tls { "rediss" } else { "redis" };
        if host.contains(':') {
            format!("{}://[{}]:{}/", scheme, host, port)
        } else {
            format!("{}://{}:{}/", scheme, host, port)
        }
    }
}

impl KvConnector for RedisConnector {
    type Handle = RedisConnection;

    async fn connect(&self, host: &str, port: u16, persistent: bool) -> Result<RedisConnection> {
        let url = self.url(host, port);
        let client = Client::open(url.as_str())
            .map_err(|e| Error::ConnectionError(format!("Invalid Redis URL {}: {}", url, e)))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::ConnectionError(e.to_string()))?;

        info!(
            "✓ Redis connection established to {}:{} (persistent: {})",
            host, port, persistent
        );
        Ok(RedisConnection { conn, persistent })
    }
}

/// A live Redis connection. Not re-established after the server closes it.
#[derive(Clone)]
pub struct RedisConnection {
    conn: MultiplexedConnection,
    persistent: bool,
}

impl RedisConnection {
    /// Whether the caller asked for a long-lived connection.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    async fn query<T: FromRedisValue>(&mut self, cmd: &Cmd) -> Result<T> {
        cmd.query_async(&mut self.conn).await.map_err(Error::from)
    }
}

impl KvStore for RedisConnection {
    async fn auth(&mut self, secret: &str) -> Result<()> {
        self.query::<()>(redis::cmd("AUTH").arg(secret)).await?;
        debug!("✓ Redis AUTH");
        Ok(())
    }

    async fn select(&mut self, index: u32) -> Result<()> {
        self.query::<()>(redis::cmd("SELECT").arg(index)).await?;
        debug!("✓ Redis SELECT {}", index);
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        let value: Option<Vec<u8>> = self
            .query(redis::cmd("GET").arg(key))
            .await
            .map_err(|e| Error::BackendError(format!("Redis GET failed for key {}: {}", key, e)))?;

        match &value {
            Some(_) => debug!("✓ Redis GET {} -> HIT", key),
            None => debug!("✓ Redis GET {} -> MISS", key),
        }
        Ok(value)
    }

    async fn set(&mut self, key: &str, value: &[u8], ttl: u64) -> Result<bool> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if ttl > 0 {
            cmd.arg("EX").arg(ttl);
        }

        let reply: Option<String> = self.query(&cmd).await.map_err(|e| {
            Error::StorageError(format!("Redis SET failed for key {}: {}", key, e))
        })?;

        debug!("✓ Redis SET {} (TTL: {}s)", key, ttl);
        Ok(reply.as_deref() == Some("OK"))
    }

    async fn del(&mut self, key: &str) -> Result<u64> {
        let deleted: u64 = self
            .query(redis::cmd("DEL").arg(key))
            .await
            .map_err(|e| Error::BackendError(format!("Redis DEL failed for key {}: {}", key, e)))?;

        debug!("✓ Redis DEL {} ({} removed)", key, deleted);
        Ok(deleted)
    }

    async fn exists(&mut self, key: &str) -> Result<bool> {
        let count: u64 = self.query(redis::cmd("EXISTS").arg(key)).await.map_err(|e| {
            Error::BackendError(format!("Redis EXISTS check failed for key {}: {}", key, e))
        })?;
        Ok(count > 0)
    }

    async fn incr_by(&mut self, key: &str, delta: i64) -> Result<i64> {
        let value: i64 = self
            .query(redis::cmd("INCRBY").arg(key).arg(delta))
            .await?;
        debug!("✓ Redis INCRBY {} {} -> {}", key, delta, value);
        Ok(value)
    }

    async fn decr_by(&mut self, key: &str, delta: i64) -> Result<i64> {
        let value: i64 = self
            .query(redis::cmd("DECRBY").arg(key).arg(delta))
            .await?;
        debug!("✓ Redis DECRBY {} {} -> {}", key, delta, value);
        Ok(value)
    }

    async fn sadd(&mut self, set: &str, member: &str) -> Result<u64> {
        self.query(redis::cmd("SADD").arg(set).arg(member)).await
    }

    async fn srem(&mut self, set: &str, member: &str) -> Result<u64> {
        self.query(redis::cmd("SREM").arg(set).arg(member)).await
    }

    async fn smembers(&mut self, set: &str) -> Result<Vec<String>> {
        let members: Vec<String> = self.query(redis::cmd("SMEMBERS").arg(set)).await?;
        debug!("✓ Redis SMEMBERS {} ({} members)", set, members.len());
        Ok(members)
    }
}
