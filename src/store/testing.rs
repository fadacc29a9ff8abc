//! Store wrappers that inject command failures, for sweep and error-path tests.

use super::{InMemoryConnection, InMemoryServer, KvConnector, KvStore};
use crate::error::{Error, Result};

/// Connects to an [`InMemoryServer`] but fails every `DEL` of one key.
#[derive(Clone, Debug)]
pub(crate) struct FailingDelConnector {
    server: InMemoryServer,
    poisoned: String,
}

impl FailingDelConnector {
    pub(crate) fn new(server: InMemoryServer, poisoned: impl Into<String>) -> Self {
        FailingDelConnector {
            server,
            poisoned: poisoned.into(),
        }
    }
}

impl KvConnector for FailingDelConnector {
    type Handle = FailingDelConnection;

    async fn connect(&self, host: &str, port: u16, persistent: bool) -> Result<FailingDelConnection> {
        let inner = self.server.connect(host, port, persistent).await?;
        Ok(FailingDelConnection::new(inner, self.poisoned.clone()))
    }
}

#[derive(Debug)]
pub(crate) struct FailingDelConnection {
    inner: InMemoryConnection,
    poisoned: String,
}

impl FailingDelConnection {
    pub(crate) fn new(inner: InMemoryConnection, poisoned: impl Into<String>) -> Self {
        FailingDelConnection {
            inner,
            poisoned: poisoned.into(),
        }
    }
}

impl KvStore for FailingDelConnection {
    async fn auth(&mut self, secret: &str) -> Result<()> {
        self.inner.auth(secret).await
    }

    async fn select(&mut self, index: u32) -> Result<()> {
        self.inner.select(index).await
    }

    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn set(&mut self, key: &str, value: &[u8], ttl: u64) -> Result<bool> {
        self.inner.set(key, value, ttl).await
    }

    async fn del(&mut self, key: &str) -> Result<u64> {
        if key == self.poisoned {
            return Err(Error::BackendError(format!("DEL refused for {}", key)));
        }
        self.inner.del(key).await
    }

    async fn exists(&mut self, key: &str) -> Result<bool> {
        self.inner.exists(key).await
    }

    async fn incr_by(&mut self, key: &str, delta: i64) -> Result<i64> {
        self.inner.incr_by(key, delta).await
    }

    async fn decr_by(&mut self, key: &str, delta: i64) -> Result<i64> {
        self.inner.decr_by(key, delta).await
    }

    async fn sadd(&mut self, set: &str, member: &str) -> Result<u64> {
        self.inner.sadd(set, member).await
    }

    async fn srem(&mut self, set: &str, member: &str) -> Result<u64> {
        self.inner.srem(set, member).await
    }

    async fn smembers(&mut self, set: &str) -> Result<Vec<String>> {
        self.inner.smembers(set).await
    }
}
