//! Compact binary codec for serde types, backed by postcard.
//!
//! # Format
//!
//! ```text
//! [MAGIC: 4 bytes] [VERSION: 4 bytes LE] [POSTCARD PAYLOAD]
//! ```
//!
//! The envelope keeps encoded values from ever parsing as store-native numbers
//! and lets readers reject entries written by an incompatible schema.

use super::ContentCodec;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// Envelope magic.
pub const MAGIC: [u8; 4] = *b"RCAD";

/// Current envelope version.
pub const VERSION: u32 = 1;

const HEADER_LEN: usize = 8;

/// Encodes any serde type `T` with postcard inside a versioned envelope.
#[derive(Debug)]
pub struct BinaryCodec<T> {
    lifetime: Option<u64>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BinaryCodec<T> {
    pub fn new() -> Self {
        BinaryCodec {
            lifetime: None,
            _marker: PhantomData,
        }
    }

    pub fn with_lifetime(mut self, seconds: u64) -> Self {
        self.lifetime = Some(seconds);
        self
    }
}

impl<T> Default for BinaryCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BinaryCodec<T> {
    fn clone(&self) -> Self {
        BinaryCodec {
            lifetime: self.lifetime,
            _marker: PhantomData,
        }
    }
}

impl<T> ContentCodec for BinaryCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Value = T;

    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        let payload =
            postcard::to_allocvec(value).map_err(|e| Error::SerializationError(e.to_string()))?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&VERSION.to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    fn decode(&self, raw: &[u8]) -> Result<T> {
        if raw.len() < HEADER_LEN || raw[..4] != MAGIC {
            return Err(Error::DeserializationError(
                "invalid envelope: magic header mismatch".to_string(),
            ));
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&raw[4..HEADER_LEN]);
        let version = u32::from_le_bytes(version);
        if version != VERSION {
            return Err(Error::DeserializationError(format!(
                "envelope version mismatch: expected {}, found {}",
                VERSION, version
            )));
        }

        postcard::from_bytes(&raw[HEADER_LEN..])
            .map_err(|e| Error::DeserializationError(e.to_string()))
    }

    fn lifetime(&self) -> Option<u64> {
        self.lifetime
    }
}
