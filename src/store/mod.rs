//! Key-value store implementations.

use crate::error::Result;

#[cfg(feature = "inmemory")]
pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis;
#[cfg(all(test, feature = "inmemory"))]
pub(crate) mod testing;

#[cfg(feature = "inmemory")]
pub use inmemory::{InMemoryConnection, InMemoryServer};
#[cfg(feature = "redis")]
pub use redis::{RedisConnection, RedisConnector};

/// Opens connections to a key-value store.
///
/// Implementations: InMemory (default), Redis.
#[allow(async_fn_in_trait)]
pub trait KvConnector: Send + Sync {
    /// Connection handle produced by this connector.
    type Handle: KvStore;

    /// Open a transport connection to `host:port`.
    ///
    /// `persistent` asks for a long-lived connection where the store distinguishes one.
    ///
    /// # Errors
    /// Returns `Err` if the transport cannot be established
    async fn connect(&self, host: &str, port: u16, persistent: bool) -> Result<Self::Handle>;
}

/// A live connection to a key-value store.
///
/// Covers exactly the commands the adapter issues. Each call waits for the
/// store's reply; timeouts, if any, belong to the implementation.
///
/// **ASYNC:** All methods are async and must be awaited.
#[allow(async_fn_in_trait)]
pub trait KvStore: Send {
    /// `AUTH secret`.
    async fn auth(&mut self, secret: &str) -> Result<()>;

    /// `SELECT index`.
    async fn select(&mut self, index: u32) -> Result<()>;

    /// `GET key`. `Ok(None)` when the key does not exist.
    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>>;

    /// `SET key value [EX ttl]`. A `ttl` of `0` stores without expiry.
    ///
    /// Returns the store's success indicator.
    async fn set(&mut self, key: &str, value: &[u8], ttl: u64) -> Result<bool>;

    /// `DEL key`. Returns the number of keys removed.
    async fn del(&mut self, key: &str) -> Result<u64>;

    /// `EXISTS key`.
    async fn exists(&mut self, key: &str) -> Result<bool>;

    /// `INCRBY key delta`. A missing key counts as zero.
    async fn incr_by(&mut self, key: &str, delta: i64) -> Result<i64>;

    /// `DECRBY key delta`. A missing key counts as zero.
    async fn decr_by(&mut self, key: &str, delta: i64) -> Result<i64>;

    /// `SADD set member`. Returns the number of members added.
    async fn sadd(&mut self, set: &str, member: &str) -> Result<u64>;

    /// `SREM set member`. Returns the number of members removed.
    async fn srem(&mut self, set: &str, member: &str) -> Result<u64>;

    /// `SMEMBERS set`, in the order the store reports them.
    async fn smembers(&mut self, set: &str) -> Result<Vec<String>>;
}
