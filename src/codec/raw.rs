//! Pass-through codec.

use super::ContentCodec;
use crate::error::Result;

/// Stores bytes exactly as given.
#[derive(Clone, Debug, Default)]
pub struct RawCodec {
    lifetime: Option<u64>,
}

impl RawCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lifetime(mut self, seconds: u64) -> Self {
        self.lifetime = Some(seconds);
        self
    }
}

impl ContentCodec for RawCodec {
    type Value = Vec<u8>;

    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn decode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn lifetime(&self) -> Option<u64> {
        self.lifetime
    }
}
