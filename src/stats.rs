//! Shadow index of written keys.
//!
//! The store offers no cheap way to enumerate "keys this adapter wrote", so every
//! successful save also records the fully-qualified key in a tracking set. The set
//! is best-effort: entries that expire in the store stay in the set until a
//! delete or flush removes them, and readers must tolerate such dangling entries.

use crate::error::{Error, Result};
use crate::store::KvStore;

/// Index over the keys the adapter has written.
///
/// [`StatsSet`] is the shipped implementation; a store with a native key-scan
/// primitive can provide another one.
#[allow(async_fn_in_trait)]
pub trait KeyIndex {
    /// Whether the index is maintained at all.
    fn is_enabled(&self) -> bool;

    /// Record `key` as written.
    async fn track<S: KvStore>(&self, store: &mut S, key: &str) -> Result<()>;

    /// Forget `key`.
    async fn untrack<S: KvStore>(&self, store: &mut S, key: &str) -> Result<()>;

    /// Tracked keys, optionally only those starting with `prefix`, in store order.
    ///
    /// # Errors
    /// Returns `Error::TrackingDisabledError` when the index is disabled
    async fn list<S: KvStore>(&self, store: &mut S, prefix: Option<&str>) -> Result<Vec<String>>;

    /// Remove every tracked key from both the index and the store.
    ///
    /// Per-key failures are logged and skipped.
    ///
    /// # Errors
    /// Returns `Error::TrackingDisabledError` when the index is disabled, or the
    /// store error if the membership snapshot cannot be read
    async fn clear_all<S: KvStore>(&self, store: &mut S) -> Result<()>;
}

/// Tracking set kept in the store under a configured key (`SADD`/`SREM`/`SMEMBERS`).
///
/// An empty key disables tracking.
#[derive(Clone, Debug)]
pub struct StatsSet {
    key: String,
}

impl StatsSet {
    pub fn new(key: impl Into<String>) -> Self {
        StatsSet { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn ensure_enabled(&self) -> Result<()> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(Error::TrackingDisabledError)
        }
    }
}

impl KeyIndex for StatsSet {
    fn is_enabled(&self) -> bool {
        !self.key.is_empty()
    }

    async fn track<S: KvStore>(&self, store: &mut S, key: &str) -> Result<()> {
        if self.is_enabled() {
            store.sadd(&self.key, key).await?;
        }
        Ok(())
    }

    async fn untrack<S: KvStore>(&self, store: &mut S, key: &str) -> Result<()> {
        if self.is_enabled() {
            store.srem(&self.key, key).await?;
        }
        Ok(())
    }

    async fn list<S: KvStore>(&self, store: &mut S, prefix: Option<&str>) -> Result<Vec<String>> {
        self.ensure_enabled()?;
        let mut keys = store.smembers(&self.key).await?;
        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            keys.retain(|k| k.starts_with(prefix));
        }
        Ok(keys)
    }

    async fn clear_all<S: KvStore>(&self, store: &mut S) -> Result<()> {
        self.ensure_enabled()?;
        let snapshot = store.smembers(&self.key).await?;

        for key in &snapshot {
            if let Err(e) = store.srem(&self.key, key).await {
                warn!("⚠ Failed to untrack {} during flush: {}", key, e);
            }
            if let Err(e) = store.del(key).await {
                warn!("⚠ Failed to delete {} during flush: {}", key, e);
            }
        }

        debug!("✓ Flushed {} tracked keys from {}", snapshot.len(), self.key);
        Ok(())
    }
}
