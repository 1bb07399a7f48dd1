use std::io::{ErrorKind, Read};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: little-endian payload length = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest message a browser will hand to a native host: 64 MiB.
pub const DEFAULT_MAX_INBOUND: usize = 64 * 1024 * 1024;

/// Largest message a native host may send back to the browser: 1 MiB.
pub const DEFAULT_MAX_OUTBOUND: usize = 1024 * 1024;

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────┐
/// │ Length       │ Payload          │
/// │ (4B LE, u32) │ (Length bytes)   │
/// └──────────────┴──────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::FrameTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32_le(len);
    dst.put_slice(payload);
    Ok(())
}

/// Read the 4-byte length prefix of the next frame (blocking).
///
/// Returns `Err(FrameError::ConnectionClosed)` when the source is exhausted
/// before the first byte, and `Err(FrameError::ShortRead)` when it ends
/// inside the prefix.
pub fn read_frame_length<R: Read>(src: &mut R) -> Result<u32> {
    let mut header = [0u8; HEADER_SIZE];
    let read = read_full(src, &mut header)?;
    match read {
        0 => Err(FrameError::ConnectionClosed),
        HEADER_SIZE => Ok(u32::from_le_bytes(header)),
        _ => Err(FrameError::ShortRead {
            expected: HEADER_SIZE,
            read,
        }),
    }
}

/// Read exactly `length` payload bytes (blocking).
///
/// The announced length is checked against `max_payload` before anything is
/// allocated.
pub fn read_frame_payload<R: Read>(src: &mut R, length: u32, max_payload: usize) -> Result<Bytes> {
    let expected = length as usize;
    if expected > max_payload {
        return Err(FrameError::FrameTooLarge {
            size: expected,
            max: max_payload,
        });
    }

    let mut body = BytesMut::zeroed(expected);
    let read = read_full(src, &mut body)?;
    if read < expected {
        return Err(FrameError::ShortRead { expected, read });
    }
    Ok(body.freeze())
}

/// Fill `buf` from `src`, stopping early only at end of input.
fn read_full<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(filled)
}

/// Configuration for the frame codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum payload size in bytes.
    pub max_payload_size: usize,
}

impl FrameConfig {
    /// Limits for frames read from the browser.
    pub fn inbound() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_INBOUND,
        }
    }

    /// Limits for frames written back to the browser.
    pub fn outbound() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_OUTBOUND,
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self::inbound()
    }
}
