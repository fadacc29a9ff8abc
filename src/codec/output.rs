//! Output-buffering codec.
//!
//! Captures text written through [`std::io::Write`] while buffering, so a page
//! fragment can be rendered once, cached with a parameterless `save`, and echoed
//! to the real output in the same step.

use super::ContentCodec;
use crate::error::{Error, Result};
use std::io;

/// Buffers written output and stores it as UTF-8 text.
#[derive(Clone, Debug, Default)]
pub struct OutputCodec {
    buffer: Vec<u8>,
    buffering: bool,
    lifetime: Option<u64>,
}

impl OutputCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lifetime(mut self, seconds: u64) -> Self {
        self.lifetime = Some(seconds);
        self
    }
}

impl io::Write for OutputCodec {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.buffering {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "output codec is not buffering",
            ));
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ContentCodec for OutputCodec {
    type Value = String;

    fn encode(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(&self, raw: &[u8]) -> Result<String> {
        String::from_utf8(raw.to_vec()).map_err(|e| Error::DeserializationError(e.to_string()))
    }

    fn lifetime(&self) -> Option<u64> {
        self.lifetime
    }

    fn is_buffering(&self) -> bool {
        self.buffering
    }

    fn start_buffering(&mut self) {
        self.buffer.clear();
        self.buffering = true;
    }

    fn buffered_content(&self) -> Option<String> {
        self.buffering
            .then(|| String::from_utf8_lossy(&self.buffer).into_owned())
    }

    fn stop_buffering(&mut self) {
        self.buffering = false;
        self.buffer.clear();
    }
}
