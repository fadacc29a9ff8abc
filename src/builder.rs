//! Builder for save operations.

use crate::adapter::CacheBackend;
use crate::codec::ContentCodec;
use crate::error::Result;
use crate::payload::{Numeric, Payload};
use crate::stats::KeyIndex;
use crate::store::KvConnector;

/// Fluent builder for [`CacheBackend::save_with`].
///
/// Every setting is optional: without a key the active key is used, without
/// content the codec's buffered output is stored, and without a TTL the lifetime
/// resolution of the backend applies.
///
/// # Example
///
/// ```ignore
/// // store a value for five minutes
/// cache.save().key("page:home").value(html).ttl(300).execute().await?;
///
/// // after `start`: store buffered output under the active key
/// cache.save().execute().await?;
/// ```
pub struct SaveOperation<'a, C: KvConnector, K: ContentCodec, I: KeyIndex> {
    backend: &'a mut CacheBackend<C, K, I>,
    key: Option<String>,
    content: Option<Payload<K::Value>>,
    ttl: Option<u64>,
    stop_buffering: bool,
}

impl<'a, C: KvConnector, K: ContentCodec, I: KeyIndex> SaveOperation<'a, C, K, I> {
    pub(crate) fn new(backend: &'a mut CacheBackend<C, K, I>) -> Self {
        Self {
            backend,
            key: None,
            content: None,
            ttl: None,
            stop_buffering: true,
        }
    }

    /// Key name, before prefixing.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Content encoded through the codec.
    pub fn value(mut self, value: K::Value) -> Self {
        self.content = Some(Payload::Value(value));
        self
    }

    /// Number stored verbatim, usable by `increment`/`decrement` afterwards.
    pub fn number(mut self, number: impl Into<Numeric>) -> Self {
        self.content = Some(Payload::Number(number.into()));
        self
    }

    pub fn content(mut self, content: Payload<K::Value>) -> Self {
        self.content = Some(content);
        self
    }

    /// Lifetime in seconds; 0 stores without expiry.
    pub fn ttl(mut self, seconds: u64) -> Self {
        self.ttl = Some(seconds);
        self
    }

    /// Leave codec buffering running after the save.
    pub fn keep_buffering(mut self) -> Self {
        self.stop_buffering = false;
        self
    }

    pub fn stop_buffering(mut self, stop: bool) -> Self {
        self.stop_buffering = stop;
        self
    }

    /// Run the save.
    ///
    /// # Errors
    /// See [`CacheBackend::save_with`]
    pub async fn execute(self) -> Result<bool> {
        let SaveOperation {
            backend,
            key,
            content,
            ttl,
            stop_buffering,
        } = self;

        backend
            .save_with(key.as_deref(), content, ttl, stop_buffering)
            .await
    }
}
