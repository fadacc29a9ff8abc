//! Content codecs: convert application values to and from stored bytes.

use crate::error::Result;

pub mod binary;
pub mod json;
pub mod output;
pub mod raw;

pub use binary::BinaryCodec;
pub use json::JsonCodec;
pub use output::OutputCodec;
pub use raw::RawCodec;

/// Trait for the serialization collaborator of the adapter.
///
/// Numbers never reach a codec; see [`Numeric`](crate::payload::Numeric).
///
/// Buffering codecs capture output between [`start_buffering`](Self::start_buffering)
/// and [`stop_buffering`](Self::stop_buffering); a `save` without explicit content
/// stores whatever [`buffered_content`](Self::buffered_content) yields.
///
/// # Example
///
/// ```
/// use redis_cache_adapter::codec::{ContentCodec, JsonCodec};
/// use serde_json::json;
///
/// let codec = JsonCodec::new();
/// let bytes = codec.encode(&json!({"name": "ada"})).unwrap();
/// assert_eq!(codec.decode(&bytes).unwrap(), json!({"name": "ada"}));
/// ```
pub trait ContentCodec: Send {
    /// Application value type handled by this codec.
    type Value;

    /// Encode a value for storage.
    ///
    /// # Errors
    /// Returns `Error::SerializationError` if the value cannot be encoded
    fn encode(&self, value: &Self::Value) -> Result<Vec<u8>>;

    /// Decode stored bytes.
    ///
    /// # Errors
    /// Returns `Error::DeserializationError` if the bytes are not a valid encoding
    fn decode(&self, raw: &[u8]) -> Result<Self::Value>;

    /// Lifetime in seconds this codec declares for entries, if any.
    fn lifetime(&self) -> Option<u64> {
        None
    }

    /// Whether output is currently being captured.
    fn is_buffering(&self) -> bool {
        false
    }

    /// Begin capturing output.
    fn start_buffering(&mut self) {}

    /// Output captured so far, if buffering.
    fn buffered_content(&self) -> Option<Self::Value> {
        None
    }

    /// Stop capturing output and discard the capture.
    fn stop_buffering(&mut self) {}
}
