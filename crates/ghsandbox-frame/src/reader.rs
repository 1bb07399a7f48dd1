use std::io::Read;

use bytes::Bytes;

use crate::codec::{read_frame_length, read_frame_payload, FrameConfig};
use crate::error::Result;

/// Reads complete frames from any `Read` stream.
///
/// Reads exactly one length prefix and exactly one body per call, so nothing
/// past the current frame is consumed from the source.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with inbound limits.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::inbound())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete frame payload (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached on a
    /// frame boundary.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        let length = read_frame_length(&mut self.inner)?;
        let payload = read_frame_payload(&mut self.inner, length, self.config.max_payload_size)?;
        tracing::trace!(length, "frame read");
        Ok(payload)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
