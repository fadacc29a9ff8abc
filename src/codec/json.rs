//! JSON codec backed by serde_json.

use super::ContentCodec;
use crate::error::{Error, Result};
use serde_json::Value;

/// Encodes [`serde_json::Value`]s as compact JSON text.
#[derive(Clone, Debug, Default)]
pub struct JsonCodec {
    lifetime: Option<u64>,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lifetime(mut self, seconds: u64) -> Self {
        self.lifetime = Some(seconds);
        self
    }
}

impl ContentCodec for JsonCodec {
    type Value = Value;

    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| Error::SerializationError(e.to_string()))
    }

    fn decode(&self, raw: &[u8]) -> Result<Value> {
        serde_json::from_slice(raw).map_err(|e| Error::DeserializationError(e.to_string()))
    }

    fn lifetime(&self) -> Option<u64> {
        self.lifetime
    }
}
