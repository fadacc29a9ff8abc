//! Cache backend - main entry point for cache operations.

use crate::builder::SaveOperation;
use crate::codec::ContentCodec;
use crate::config::AdapterConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::{Error, Result};
use crate::key::KeyNamespace;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::payload::{Numeric, Payload};
use crate::stats::{KeyIndex, StatsSet};
use crate::store::{KvConnector, KvStore};
use crate::ttl::resolve_lifetime;
use std::io::{self, Write};
use std::time::Instant;

/// Cache backend over a key-value store.
///
/// Every operation acquires the connection (connecting on first use), resolves the
/// namespaced key and issues one or a few store commands. Writes also maintain the
/// key index so that [`query_keys`](Self::query_keys) and [`flush`](Self::flush) work.
///
/// The backend remembers the last key it resolved and the last lifetime it was
/// given, so `save`, `exists`, `increment` and `decrement` may omit the key to
/// continue on the active entry.
///
/// Operations take `&mut self` and no lock is held across commands. Sharing one
/// store between several backends is last-write-wins: a `save` racing a `flush`
/// elsewhere may leave the entry untracked or tracked-but-deleted.
///
/// # Example
///
/// ```
/// use redis_cache_adapter::{AdapterConfig, CacheBackend, Payload};
/// use redis_cache_adapter::codec::JsonCodec;
/// use redis_cache_adapter::store::InMemoryServer;
/// use serde_json::json;
///
/// # async fn example() -> redis_cache_adapter::Result<()> {
/// let config = AdapterConfig::default().with_prefix("app:");
/// let mut cache = CacheBackend::new(InMemoryServer::new(), JsonCodec::new(), config);
///
/// cache.save().key("user:1").value(json!({"name": "ada"})).ttl(60).execute().await?;
/// assert_eq!(
///     cache.get("user:1").await?,
///     Some(Payload::Value(json!({"name": "ada"})))
/// );
/// assert_eq!(cache.query_keys(None).await?, vec!["app:user:1"]);
/// # Ok(())
/// # }
/// ```
pub struct CacheBackend<C: KvConnector, K: ContentCodec, I: KeyIndex = StatsSet> {
    connection: ConnectionManager<C>,
    codec: K,
    index: I,
    namespace: KeyNamespace,
    last_lifetime: Option<u64>,
    started: bool,
    fresh: bool,
    config: AdapterConfig,
    metrics: Box<dyn CacheMetrics>,
    output: Box<dyn Write + Send>,
}

impl<C: KvConnector, K: ContentCodec> CacheBackend<C, K, StatsSet> {
    /// Create a backend that connects through `connector` on first use.
    pub fn new(connector: C, codec: K, config: AdapterConfig) -> Self {
        let connection = ConnectionManager::new(connector, &config);
        Self::assemble(connection, codec, config)
    }

    /// Create a backend around an already-connected, authenticated and
    /// database-selected handle. No handshake is performed.
    pub fn with_client(handle: C::Handle, codec: K, config: AdapterConfig) -> Self {
        let connection = ConnectionManager::with_handle(handle, &config);
        Self::assemble(connection, codec, config)
    }

    fn assemble(connection: ConnectionManager<C>, codec: K, config: AdapterConfig) -> Self {
        CacheBackend {
            connection,
            codec,
            index: StatsSet::new(config.stats_key.clone()),
            namespace: KeyNamespace::new(config.key_prefix.clone()),
            last_lifetime: None,
            started: false,
            fresh: false,
            config,
            metrics: Box::new(NoOpMetrics),
            output: Box::new(io::stdout()),
        }
    }
}

impl<C: KvConnector, K: ContentCodec, I: KeyIndex> CacheBackend<C, K, I> {
    /// Replace the key index.
    pub fn with_index<J: KeyIndex>(self, index: J) -> CacheBackend<C, K, J> {
        CacheBackend {
            connection: self.connection,
            codec: self.codec,
            index,
            namespace: self.namespace,
            last_lifetime: self.last_lifetime,
            started: self.started,
            fresh: self.fresh,
            config: self.config,
            metrics: self.metrics,
            output: self.output,
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set where buffered content is echoed on save (stdout by default).
    ///
    /// The echo is the encoded content exactly as it was written to the store, so
    /// a buffering codec that transforms on `encode` emits the transformed bytes.
    pub fn with_output(mut self, output: Box<dyn Write + Send>) -> Self {
        self.output = output;
        self
    }

    /// Establish the connection now instead of on first use.
    ///
    /// # Errors
    /// Returns `Error::ConnectionError`, `Error::AuthError` or `Error::SelectDbError`
    /// for the failing handshake step
    pub async fn connect(&mut self) -> Result<()> {
        self.connection.acquire().await.map(|_| ())
    }

    /// Read `key`.
    ///
    /// Missing or empty content is `Ok(None)`. Store-native numbers come back as
    /// [`Payload::Number`] without touching the codec.
    ///
    /// # Errors
    /// Returns connection errors, `Error::BackendError` if the read fails, or
    /// `Error::DeserializationError` if the codec rejects the content
    pub async fn get(&mut self, key: &str) -> Result<Option<Payload<K::Value>>> {
        let timer = Instant::now();
        let full_key = self.namespace.resolve(Some(key))?;

        let raw = self.read(&full_key).await;
        let raw = self.observe(&full_key, raw)?;

        match raw.filter(|bytes| !bytes.is_empty()) {
            Some(bytes) => {
                let payload = self.restore(&bytes);
                let payload = self.observe(&full_key, payload)?;
                self.metrics.record_hit(&full_key, timer.elapsed());
                Ok(Some(payload))
            }
            None => {
                self.metrics.record_miss(&full_key, timer.elapsed());
                Ok(None)
            }
        }
    }

    /// Begin caching `key`: return its content if present, otherwise start codec
    /// buffering so a following parameterless save stores the captured output.
    ///
    /// `lifetime`, when given, becomes the lifetime for subsequent saves.
    pub async fn start(
        &mut self,
        key: &str,
        lifetime: Option<u64>,
    ) -> Result<Option<Payload<K::Value>>> {
        let existing = self.get(key).await?;

        self.fresh = existing.is_none();
        if self.fresh {
            self.codec.start_buffering();
        }
        self.started = true;
        if lifetime.is_some() {
            self.last_lifetime = lifetime;
        }

        debug!(
            "» Cache started for {} ({})",
            key,
            if self.fresh { "fresh" } else { "cached" }
        );
        Ok(existing)
    }

    /// Build a save operation.
    ///
    /// ```ignore
    /// cache.save().key("page:home").value(html).ttl(300).execute().await?;
    /// cache.save().execute().await?; // active key, buffered output
    /// ```
    pub fn save(&mut self) -> SaveOperation<'_, C, K, I> {
        SaveOperation::new(self)
    }

    /// Store content under a key.
    ///
    /// - `key`: `None` continues on the active key.
    /// - `content`: `None` stores the codec's buffered output.
    /// - `ttl`: `None` falls back to the last lifetime, then the codec's, then the
    ///   configured default. An explicit value is remembered for later saves.
    /// - `stop_buffering`: stop the codec's capture after storing.
    ///
    /// If the codec was buffering, the stored bytes (the codec's encoding of the
    /// resolved content) are also written to the output sink.
    ///
    /// # Errors
    /// - `Error::NoActiveKeyError`: no key given and none active
    /// - `Error::SerializationError`: nothing to store, or the codec failed
    /// - `Error::StorageError`: the store rejected the write
    /// - connection errors from the lazy handshake
    pub async fn save_with(
        &mut self,
        key: Option<&str>,
        content: Option<Payload<K::Value>>,
        ttl: Option<u64>,
        stop_buffering: bool,
    ) -> Result<bool> {
        let full_key = self.namespace.resolve(key)?;

        let content = match content {
            Some(content) => content,
            None => self.codec.buffered_content().map(Payload::Value).ok_or_else(|| {
                Error::SerializationError(
                    "no content given and the codec is not buffering".to_string(),
                )
            })?,
        };
        let prepared = self.prepare(&content)?;

        let lifetime = resolve_lifetime(
            ttl,
            self.last_lifetime,
            self.codec.lifetime(),
            self.config.default_lifetime,
        );

        let conn = self.connection.acquire().await?;
        let stored = conn
            .set(&full_key, &prepared, lifetime)
            .await
            .map_err(|e| match e {
                Error::StorageError(_) => e,
                other => Error::StorageError(other.to_string()),
            })?;
        if !stored {
            return Err(Error::StorageError(format!(
                "store rejected write for key {}",
                full_key
            )));
        }

        self.index.track(&mut *conn, &full_key).await?;

        if ttl.is_some() {
            self.last_lifetime = ttl;
        }

        let was_buffering = self.codec.is_buffering();
        if stop_buffering {
            self.codec.stop_buffering();
        }
        if was_buffering {
            if let Err(e) = self.output.write_all(&prepared).and_then(|_| self.output.flush()) {
                warn!("⚠ Failed to emit buffered content for {}: {}", full_key, e);
            }
        }

        self.started = false;
        debug!("✓ Saved {} (TTL: {}s)", full_key, lifetime);
        Ok(stored)
    }

    /// Delete `key` from the store and the key index.
    ///
    /// Returns whether the store removed anything.
    pub async fn delete(&mut self, key: &str) -> Result<bool> {
        let full_key = self.namespace.resolve(Some(key))?;
        let conn = self.connection.acquire().await?;

        self.index.untrack(&mut *conn, &full_key).await?;
        let removed = conn.del(&full_key).await?;

        debug!("✓ Deleted {} ({})", full_key, removed);
        Ok(removed > 0)
    }

    /// Whether `key` (or the active key) exists.
    ///
    /// Without a key and without an active key this is `Ok(false)`, not an error.
    pub async fn exists(&mut self, key: Option<&str>) -> Result<bool> {
        let Some(full_key) = self.namespace.try_resolve(key) else {
            return Ok(false);
        };
        self.connection.acquire().await?.exists(&full_key).await
    }

    /// Atomically add `delta` to the counter at `key` (or the active key).
    ///
    /// A missing counter starts from zero. Returns the new value.
    ///
    /// # Errors
    /// Returns `Error::NoActiveKeyError` if no key is given and none is active
    pub async fn increment(&mut self, key: Option<&str>, delta: i64) -> Result<i64> {
        let full_key = self.namespace.resolve(key)?;
        self.connection.acquire().await?.incr_by(&full_key, delta).await
    }

    /// Atomically subtract `delta` from the counter at `key` (or the active key).
    ///
    /// # Errors
    /// Returns `Error::NoActiveKeyError` if no key is given and none is active
    pub async fn decrement(&mut self, key: Option<&str>, delta: i64) -> Result<i64> {
        let full_key = self.namespace.resolve(key)?;
        self.connection.acquire().await?.decr_by(&full_key, delta).await
    }

    /// Tracked fully-qualified keys, optionally only those starting with `prefix`.
    ///
    /// Entries may refer to keys that already expired in the store.
    ///
    /// # Errors
    /// Returns `Error::TrackingDisabledError` if the stats key is empty
    pub async fn query_keys(&mut self, prefix: Option<&str>) -> Result<Vec<String>> {
        if !self.index.is_enabled() {
            return Err(Error::TrackingDisabledError);
        }
        let conn = self.connection.acquire().await?;
        self.index.list(conn, prefix).await
    }

    /// Delete every tracked key and empty the key index.
    ///
    /// Individual deletions that fail are logged and skipped; the sweep still
    /// reports success.
    ///
    /// # Errors
    /// Returns `Error::TrackingDisabledError` if the stats key is empty
    pub async fn flush(&mut self) -> Result<bool> {
        if !self.index.is_enabled() {
            return Err(Error::TrackingDisabledError);
        }
        let conn = self.connection.acquire().await?;
        self.index.clear_all(conn).await?;
        Ok(true)
    }

    /// Fully-qualified key the next parameterless call will use.
    pub fn last_key(&self) -> Option<&str> {
        self.namespace.last_key()
    }

    /// Lifetime the next save without a TTL will reuse, if any.
    pub fn last_lifetime(&self) -> Option<u64> {
        self.last_lifetime
    }

    /// Whether [`start`](Self::start) was called and no save has happened since.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the last [`start`](Self::start) found nothing cached.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn codec(&self) -> &K {
        &self.codec
    }

    pub fn codec_mut(&mut self) -> &mut K {
        &mut self.codec
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    async fn read(&mut self, full_key: &str) -> Result<Option<Vec<u8>>> {
        self.connection.acquire().await?.get(full_key).await
    }

    /// Bytes to store for `content`. Numbers are written verbatim.
    fn prepare(&self, content: &Payload<K::Value>) -> Result<Vec<u8>> {
        match content {
            Payload::Number(n) if !n.is_finite() => Err(Error::SerializationError(format!(
                "non-finite number {} cannot be stored",
                n
            ))),
            Payload::Number(n) => Ok(n.to_bytes()),
            Payload::Value(v) => self.codec.encode(v),
        }
    }

    /// Payload for stored bytes. Store-native numbers bypass the codec.
    fn restore(&self, raw: &[u8]) -> Result<Payload<K::Value>> {
        match Numeric::parse(raw) {
            Some(n) => Ok(Payload::Number(n)),
            None => self.codec.decode(raw).map(Payload::Value),
        }
    }

    fn observe<T>(&self, key: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.metrics.record_error(key, &e.to_string());
        }
        result
    }
}
