use std::io::Read;

use bytes::{Bytes, BytesMut};
use ghsandbox_frame::{encode_frame, FrameConfig, FrameReader};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{MessageError, Result};

/// A typed message exchanged with the browser extension.
///
/// `payload` is held as already-serialized JSON and is only interpreted by
/// whoever handles `msg_type`, through [`Envelope::payload_as`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub payload: Option<Box<RawValue>>,
}

impl Envelope {
    /// Build an envelope, serializing `payload` immediately.
    pub fn new<T>(msg_type: impl Into<String>, payload: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        let raw = serde_json::value::to_raw_value(payload)?;
        Ok(Self::from_raw(msg_type, raw))
    }

    /// Build an envelope around a payload that is already JSON.
    pub fn from_raw(msg_type: impl Into<String>, payload: Box<RawValue>) -> Self {
        Self {
            msg_type: msg_type.into(),
            payload: Some(payload),
        }
    }

    /// The raw payload JSON, if one was sent.
    pub fn raw_payload(&self) -> Option<&RawValue> {
        self.payload.as_deref()
    }

    /// Deserialize the payload into `T`.
    ///
    /// An absent payload is treated as JSON `null`. A payload that is a JSON
    /// string holding encoded JSON is accepted as well: if `T` does not match
    /// the string itself, its contents are decoded instead.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        let raw = self.raw_payload().map_or("null", RawValue::get);
        match serde_json::from_str::<T>(raw) {
            Ok(value) => Ok(value),
            Err(err) => match serde_json::from_str::<String>(raw) {
                Ok(encoded) => Ok(serde_json::from_str(&encoded)?),
                Err(_) => Err(err.into()),
            },
        }
    }

    /// Serialize the envelope body (without the length prefix).
    pub fn to_json(&self) -> Result<Vec<u8>> {
        if self.msg_type.is_empty() {
            return Err(MessageError::EmptyType);
        }
        Ok(serde_json::to_vec(self)?)
    }
}

/// Encode `{type, payload}` as a complete frame, length prefix included.
pub fn encode_envelope<T>(msg_type: &str, payload: &T) -> Result<Bytes>
where
    T: Serialize + ?Sized,
{
    let body = Envelope::new(msg_type, payload)?.to_json()?;
    let mut buf = BytesMut::new();
    encode_frame(&body, &mut buf)?;
    Ok(buf.freeze())
}

/// Parse one frame body into an envelope.
///
/// A missing `type` field is a serialization error; an empty one is
/// [`MessageError::EmptyType`]. A missing `payload` decodes as `None`.
pub fn decode_envelope(body: &[u8]) -> Result<Envelope> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    if envelope.msg_type.is_empty() {
        return Err(MessageError::EmptyType);
    }
    Ok(envelope)
}

/// Reads complete envelopes from any `Read` stream.
pub struct EnvelopeReader<T> {
    frames: FrameReader<T>,
}

impl<T: Read> EnvelopeReader<T> {
    /// Create a reader with inbound frame limits.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::inbound())
    }

    /// Create a reader with explicit frame configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            frames: FrameReader::with_config(inner, config),
        }
    }

    /// Read and decode the next envelope (blocking).
    ///
    /// Frame errors are returned as [`MessageError::Frame`] unchanged. A
    /// decode error consumes the offending frame, so the next call starts at
    /// the following frame.
    pub fn read_envelope(&mut self) -> Result<Envelope> {
        let body = self.frames.read_frame()?;
        let envelope = decode_envelope(&body)?;
        tracing::debug!(msg_type = %envelope.msg_type, size = body.len(), "envelope received");
        Ok(envelope)
    }
}
