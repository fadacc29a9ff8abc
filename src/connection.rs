//! Lazy connection establishment.
//!
//! The handshake is connect, then `AUTH` (only if a secret is configured), then
//! `SELECT`. A handle is kept only once all steps succeed; a failed step drops the
//! half-open handle and returns the error. Nothing here reconnects or retries: a
//! severed connection surfaces on the next command and the caller decides.

use crate::config::AdapterConfig;
use crate::error::{Error, Result};
use crate::store::{KvConnector, KvStore};
use std::fmt;

/// Handshake progress of the managed connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Authenticated,
    DbSelected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Authenticated => write!(f, "authenticated"),
            ConnectionState::DbSelected => write!(f, "db-selected"),
        }
    }
}

/// Owns the adapter's single store connection.
pub struct ConnectionManager<C: KvConnector> {
    connector: Option<C>,
    handle: Option<C::Handle>,
    state: ConnectionState,
    host: String,
    port: u16,
    index: u32,
    persistent: bool,
    auth: Option<String>,
}

impl<C: KvConnector> ConnectionManager<C> {
    /// Manager that connects lazily through `connector` on first use.
    pub fn new(connector: C, config: &AdapterConfig) -> Self {
        ConnectionManager {
            connector: Some(connector),
            handle: None,
            state: ConnectionState::Disconnected,
            host: config.host.clone(),
            port: config.port,
            index: config.logical_db_index,
            persistent: config.persistent_connection,
            auth: config.auth_secret.clone(),
        }
    }

    /// Manager around an already-connected handle. No handshake is performed.
    pub fn with_handle(handle: C::Handle, config: &AdapterConfig) -> Self {
        ConnectionManager {
            connector: None,
            handle: Some(handle),
            state: ConnectionState::DbSelected,
            host: config.host.clone(),
            port: config.port,
            index: config.logical_db_index,
            persistent: config.persistent_connection,
            auth: config.auth_secret.clone(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Return the live handle, establishing it first if needed.
    ///
    /// # Errors
    /// - `Error::ConnectionError`: transport connect failed
    /// - `Error::AuthError`: the store rejected the credential
    /// - `Error::SelectDbError`: the store rejected the database index
    pub async fn acquire(&mut self) -> Result<&mut C::Handle> {
        if self.handle.is_none() {
            let handle = self.establish().await?;
            self.handle = Some(handle);
        }

        self.handle.as_mut().ok_or_else(|| {
            Error::ConfigInconsistencyError("connection handle missing after connect".to_string())
        })
    }

    async fn establish(&mut self) -> Result<C::Handle> {
        let connector = self.connector.as_ref().ok_or_else(|| {
            Error::ConfigInconsistencyError(
                "no connector configured and no client supplied".to_string(),
            )
        })?;

        self.state = ConnectionState::Disconnected;

        let mut handle = connector
            .connect(&self.host, self.port, self.persistent)
            .await
            .map_err(|e| match e {
                Error::ConnectionError(msg) => Error::ConnectionError(msg),
                other => Error::ConnectionError(other.to_string()),
            })?;
        self.state = ConnectionState::Connected;
        debug!("» Connected to {}:{}", self.host, self.port);

        if let Some(secret) = self.auth.as_deref() {
            if let Err(e) = handle.auth(secret).await {
                self.state = ConnectionState::Disconnected;
                return Err(Error::AuthError(e.to_string()));
            }
            self.state = ConnectionState::Authenticated;
        }

        if let Err(e) = handle.select(self.index).await {
            self.state = ConnectionState::Disconnected;
            return Err(Error::SelectDbError {
                index: self.index,
                reason: e.to_string(),
            });
        }
        self.state = ConnectionState::DbSelected;

        info!(
            "✓ Cache store ready at {}:{} (db {}, persistent: {})",
            self.host, self.port, self.index, self.persistent
        );
        Ok(handle)
    }
}
