//! In-process key-value store.
//!
//! Behaves like a single Redis server for the commands the adapter uses:
//! numbered logical databases, an optional password, per-key expiry, string
//! and set values with `WRONGTYPE` checks. Expiry follows `tokio::time`, so
//! tests can pause and advance the clock.

use super::{KvConnector, KvStore};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Number of logical databases a fresh server exposes.
pub const DEFAULT_DATABASES: u32 = 16;

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

#[derive(Debug, Clone)]
enum Value {
    Bytes(Vec<u8>),
    Set(Vec<String>),
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

#[derive(Debug)]
struct ServerState {
    databases: HashMap<u32, HashMap<String, Slot>>,
    password: Option<String>,
    database_count: u32,
    accepting: bool,
    connections: usize,
}

impl ServerState {
    /// Slot for `key`, dropping it first if it has expired.
    fn live_slot(&mut self, db: u32, key: &str) -> Option<&mut Slot> {
        let now = Instant::now();
        let entries = self.databases.entry(db).or_default();
        if entries.get(key).is_some_and(|slot| !slot.is_live(now)) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }

    fn insert(&mut self, db: u32, key: &str, slot: Slot) {
        self.databases
            .entry(db)
            .or_default()
            .insert(key.to_string(), slot);
    }

    fn remove(&mut self, db: u32, key: &str) -> Option<Slot> {
        self.databases.get_mut(&db).and_then(|e| e.remove(key))
    }
}

/// Shared in-process server. Clones refer to the same data.
///
/// # Example
///
/// ```
/// use redis_cache_adapter::store::{InMemoryServer, KvConnector, KvStore};
///
/// # async fn example() -> redis_cache_adapter::Result<()> {
/// let server = InMemoryServer::new();
/// let mut conn = server.connect("127.0.0.1", 6379, false).await?;
/// conn.set("greeting", b"hello", 0).await?;
/// assert_eq!(conn.get("greeting").await?, Some(b"hello".to_vec()));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryServer {
    state: Arc<RwLock<ServerState>>,
}

impl Default for InMemoryServer {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryServer {
    pub fn new() -> Self {
        InMemoryServer {
            state: Arc::new(RwLock::new(ServerState {
                databases: HashMap::new(),
                password: None,
                database_count: DEFAULT_DATABASES,
                accepting: true,
                connections: 0,
            })),
        }
    }

    /// Require `AUTH password` before any data command.
    pub fn with_password(self, password: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.try_write() {
            state.password = Some(password.into());
        }
        self
    }

    /// Expose `count` logical databases (`SELECT` beyond that fails).
    pub fn with_databases(self, count: u32) -> Self {
        if let Ok(mut state) = self.state.try_write() {
            state.database_count = count;
        }
        self
    }

    /// Make subsequent connection attempts fail (or succeed again).
    pub async fn refuse_connections(&self, refuse: bool) {
        self.state.write().await.accepting = !refuse;
    }

    /// Number of connections opened so far.
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections
    }

    /// Remaining lifetime of `key` in `db`, Redis-style: `-2` missing, `-1` no expiry.
    pub async fn ttl(&self, db: u32, key: &str) -> i64 {
        let mut state = self.state.write().await;
        match state.live_slot(db, key) {
            None => -2,
            Some(Slot {
                expires_at: None, ..
            }) => -1,
            Some(Slot {
                expires_at: Some(at),
                ..
            }) => {
                let remaining = at.saturating_duration_since(Instant::now());
                remaining.as_millis().div_ceil(1000) as i64
            }
        }
    }

    /// Raw string content of `key` in `db`, bypassing authentication.
    pub async fn raw(&self, db: u32, key: &str) -> Option<Vec<u8>> {
        let mut state = self.state.write().await;
        match state.live_slot(db, key) {
            Some(Slot {
                value: Value::Bytes(bytes),
                ..
            }) => Some(bytes.clone()),
            _ => None,
        }
    }

    /// Number of live keys in `db`.
    pub async fn len(&self, db: u32) -> usize {
        let now = Instant::now();
        let state = self.state.read().await;
        state
            .databases
            .get(&db)
            .map(|entries| entries.values().filter(|s| s.is_live(now)).count())
            .unwrap_or(0)
    }

    pub async fn is_empty(&self, db: u32) -> bool {
        self.len(db).await == 0
    }
}

impl KvConnector for InMemoryServer {
    type Handle = InMemoryConnection;

    async fn connect(&self, host: &str, port: u16, persistent: bool) -> Result<InMemoryConnection> {
        let mut state = self.state.write().await;
        if !state.accepting {
            return Err(Error::BackendError(format!(
                "Connection refused ({}:{})",
                host, port
            )));
        }
        state.connections += 1;

        debug!(
            "✓ InMemory CONNECT {}:{} (persistent: {})",
            host, port, persistent
        );

        Ok(InMemoryConnection {
            state: Arc::clone(&self.state),
            db: 0,
            authenticated: false,
            persistent,
        })
    }
}

/// Connection to an [`InMemoryServer`].
#[derive(Debug)]
pub struct InMemoryConnection {
    state: Arc<RwLock<ServerState>>,
    db: u32,
    authenticated: bool,
    persistent: bool,
}

impl InMemoryConnection {
    /// Currently selected logical database.
    pub fn database(&self) -> u32 {
        self.db
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    fn check_auth(&self, state: &ServerState) -> Result<()> {
        if state.password.is_some() && !self.authenticated {
            return Err(Error::BackendError(
                "NOAUTH Authentication required.".to_string(),
            ));
        }
        Ok(())
    }

    async fn adjust(&mut self, key: &str, delta: i64) -> Result<i64> {
        let mut state = self.state.write().await;
        self.check_auth(&state)?;

        let current = match state.live_slot(self.db, key) {
            None => None,
            Some(Slot {
                value: Value::Bytes(bytes),
                expires_at,
            }) => {
                let n = std::str::from_utf8(bytes)
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .ok_or_else(|| {
                        Error::BackendError(
                            "ERR value is not an integer or out of range".to_string(),
                        )
                    })?;
                Some((n, *expires_at))
            }
            Some(_) => return Err(Error::BackendError(WRONGTYPE.to_string())),
        };

        let (base, expires_at) = current.unwrap_or((0, None));
        let next = base.checked_add(delta).ok_or_else(|| {
            Error::BackendError("ERR increment or decrement would overflow".to_string())
        })?;

        state.insert(
            self.db,
            key,
            Slot {
                value: Value::Bytes(next.to_string().into_bytes()),
                expires_at,
            },
        );
        Ok(next)
    }
}

impl KvStore for InMemoryConnection {
    async fn auth(&mut self, secret: &str) -> Result<()> {
        let state = self.state.read().await;
        match &state.password {
            None => Err(Error::BackendError(
                "ERR AUTH called without any password configured".to_string(),
            )),
            Some(password) if password == secret => {
                self.authenticated = true;
                debug!("✓ InMemory AUTH");
                Ok(())
            }
            Some(_) => Err(Error::BackendError(
                "WRONGPASS invalid username-password pair".to_string(),
            )),
        }
    }

    async fn select(&mut self, index: u32) -> Result<()> {
        let state = self.state.read().await;
        self.check_auth(&state)?;
        if index >= state.database_count {
            return Err(Error::BackendError("ERR DB index is out of range".to_string()));
        }
        self.db = index;
        debug!("✓ InMemory SELECT {}", index);
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut state = self.state.write().await;
        self.check_auth(&state)?;
        match state.live_slot(self.db, key) {
            Some(Slot {
                value: Value::Bytes(bytes),
                ..
            }) => {
                debug!("✓ InMemory GET {} -> HIT", key);
                Ok(Some(bytes.clone()))
            }
            Some(_) => Err(Error::BackendError(WRONGTYPE.to_string())),
            None => {
                debug!("✓ InMemory GET {} -> MISS", key);
                Ok(None)
            }
        }
    }

    async fn set(&mut self, key: &str, value: &[u8], ttl: u64) -> Result<bool> {
        let mut state = self.state.write().await;
        self.check_auth(&state)?;
        let expires_at = if ttl > 0 {
            let at = Instant::now()
                .checked_add(Duration::from_secs(ttl))
                .ok_or_else(|| {
                    Error::BackendError("ERR invalid expire time in 'set' command".to_string())
                })?;
            Some(at)
        } else {
            None
        };
        state.insert(
            self.db,
            key,
            Slot {
                value: Value::Bytes(value.to_vec()),
                expires_at,
            },
        );
        debug!("✓ InMemory SET {} (TTL: {}s)", key, ttl);
        Ok(true)
    }

    async fn del(&mut self, key: &str) -> Result<u64> {
        let mut state = self.state.write().await;
        self.check_auth(&state)?;
        let live = state.live_slot(self.db, key).is_some();
        state.remove(self.db, key);
        debug!("✓ InMemory DEL {}", key);
        Ok(u64::from(live))
    }

    async fn exists(&mut self, key: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        self.check_auth(&state)?;
        Ok(state.live_slot(self.db, key).is_some())
    }

    async fn incr_by(&mut self, key: &str, delta: i64) -> Result<i64> {
        self.adjust(key, delta).await
    }

    async fn decr_by(&mut self, key: &str, delta: i64) -> Result<i64> {
        let delta = delta.checked_neg().ok_or_else(|| {
            Error::BackendError("ERR decrement would overflow".to_string())
        })?;
        self.adjust(key, delta).await
    }

    async fn sadd(&mut self, set: &str, member: &str) -> Result<u64> {
        let mut state = self.state.write().await;
        self.check_auth(&state)?;
        match state.live_slot(self.db, set) {
            None => {
                state.insert(
                    self.db,
                    set,
                    Slot {
                        value: Value::Set(vec![member.to_string()]),
                        expires_at: None,
                    },
                );
                Ok(1)
            }
            Some(Slot {
                value: Value::Set(members),
                ..
            }) => {
                if members.iter().any(|m| m == member) {
                    Ok(0)
                } else {
                    members.push(member.to_string());
                    Ok(1)
                }
            }
            Some(_) => Err(Error::BackendError(WRONGTYPE.to_string())),
        }
    }

    async fn srem(&mut self, set: &str, member: &str) -> Result<u64> {
        let mut state = self.state.write().await;
        self.check_auth(&state)?;
        let (removed, now_empty) = match state.live_slot(self.db, set) {
            None => return Ok(0),
            Some(Slot {
                value: Value::Set(members),
                ..
            }) => {
                let before = members.len();
                members.retain(|m| m != member);
                ((before - members.len()) as u64, members.is_empty())
            }
            Some(_) => return Err(Error::BackendError(WRONGTYPE.to_string())),
        };
        if now_empty {
            state.remove(self.db, set);
        }
        Ok(removed)
    }

    async fn smembers(&mut self, set: &str) -> Result<Vec<String>> {
        let mut state = self.state.write().await;
        self.check_auth(&state)?;
        match state.live_slot(self.db, set) {
            None => Ok(Vec::new()),
            Some(Slot {
                value: Value::Set(members),
                ..
            }) => Ok(members.clone()),
            Some(_) => Err(Error::BackendError(WRONGTYPE.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open(server: &InMemoryServer) -> InMemoryConnection {
        server
            .connect("127.0.0.1", 6379, false)
            .await
            .expect("Failed to connect")
    }

    #[tokio::test]
    async fn test_set_rejects_unrepresentable_ttl() {
        let server = InMemoryServer::new();
        let mut conn = open(&server).await;

        match conn.set("k", b"v", u64::MAX).await {
            Err(Error::BackendError(msg)) => assert!(msg.contains("invalid expire time")),
            other => panic!("Expected BackendError, got {:?}", other),
        }
        assert_eq!(server.ttl(0, "k").await, -2);
    }

    #[tokio::test]
    async fn test_set_get_del() {
        let server = InMemoryServer::new();
        let mut conn = open(&server).await;

        assert!(conn.set("k", b"v", 0).await.expect("Failed to set"));
        assert_eq!(conn.get("k").await.expect("Failed to get"), Some(b"v".to_vec()));
        assert!(conn.exists("k").await.expect("Failed to check exists"));
        assert_eq!(conn.del("k").await.expect("Failed to delete"), 1);
        assert_eq!(conn.del("k").await.expect("Failed to delete"), 0);
        assert_eq!(conn.get("k").await.expect("Failed to get"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let server = InMemoryServer::new();
        let mut conn = open(&server).await;

        conn.set("short", b"v", 5).await.expect("Failed to set");
        conn.set("forever", b"v", 0).await.expect("Failed to set");
        assert_eq!(server.ttl(0, "short").await, 5);
        assert_eq!(server.ttl(0, "forever").await, -1);
        assert_eq!(server.ttl(0, "missing").await, -2);

        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(conn.get("short").await.expect("Failed to get"), None);
        assert!(conn.exists("forever").await.expect("Failed to check exists"));
    }

    #[tokio::test]
    async fn test_databases_are_isolated() {
        let server = InMemoryServer::new();
        let mut a = open(&server).await;
        let mut b = open(&server).await;
        b.select(3).await.expect("Failed to select");

        a.set("k", b"zero", 0).await.expect("Failed to set");
        assert_eq!(b.get("k").await.expect("Failed to get"), None);
        assert_eq!(server.raw(0, "k").await, Some(b"zero".to_vec()));
        assert_eq!(b.database(), 3);
    }

    #[tokio::test]
    async fn test_select_out_of_range() {
        let server = InMemoryServer::new().with_databases(2);
        let mut conn = open(&server).await;
        assert!(conn.select(1).await.is_ok());
        assert!(conn.select(2).await.is_err());
    }

    #[tokio::test]
    async fn test_password_required() {
        let server = InMemoryServer::new().with_password("hunter2");
        let mut conn = open(&server).await;

        assert!(conn.get("k").await.is_err());
        assert!(conn.auth("wrong").await.is_err());
        conn.auth("hunter2").await.expect("Failed to auth");
        assert_eq!(conn.get("k").await.expect("Failed to get"), None);
    }

    #[tokio::test]
    async fn test_counters() {
        let server = InMemoryServer::new();
        let mut conn = open(&server).await;

        assert_eq!(conn.incr_by("c", 3).await.expect("Failed to incr"), 3);
        assert_eq!(conn.decr_by("c", 1).await.expect("Failed to decr"), 2);
        assert_eq!(server.raw(0, "c").await, Some(b"2".to_vec()));

        conn.set("text", b"abc", 0).await.expect("Failed to set");
        assert!(conn.incr_by("text", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_set_membership_order_and_wrongtype() {
        let server = InMemoryServer::new();
        let mut conn = open(&server).await;

        assert_eq!(conn.sadd("s", "b").await.expect("Failed to sadd"), 1);
        assert_eq!(conn.sadd("s", "a").await.expect("Failed to sadd"), 1);
        assert_eq!(conn.sadd("s", "b").await.expect("Failed to sadd"), 0);
        assert_eq!(
            conn.smembers("s").await.expect("Failed to smembers"),
            vec!["b".to_string(), "a".to_string()]
        );

        assert!(conn.get("s").await.is_err());
        conn.set("str", b"x", 0).await.expect("Failed to set");
        assert!(conn.sadd("str", "m").await.is_err());

        assert_eq!(conn.srem("s", "b").await.expect("Failed to srem"), 1);
        assert_eq!(conn.srem("s", "a").await.expect("Failed to srem"), 1);
        assert!(!conn.exists("s").await.expect("Failed to check exists"));
    }

    #[tokio::test]
    async fn test_refused_connections() {
        let server = InMemoryServer::new();
        server.refuse_connections(true).await;
        assert!(server.connect("127.0.0.1", 6379, true).await.is_err());
        server.refuse_connections(false).await;
        assert!(server.connect("127.0.0.1", 6379, true).await.is_ok());
        assert_eq!(server.connection_count().await, 1);
    }
}
