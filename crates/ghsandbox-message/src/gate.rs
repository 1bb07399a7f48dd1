use std::io::{Stdout, Write};
use std::sync::{Arc, Mutex};

use ghsandbox_frame::{FrameConfig, FrameError, FrameWriter};
use serde::Serialize;

use crate::envelope::Envelope;
use crate::error::{MessageError, Result};

/// Serializes envelope writes onto one shared output channel.
///
/// Every clone shares the same lock and writer. A frame is written and
/// flushed entirely while the lock is held, so concurrent senders never
/// interleave bytes. Separate calls to [`WriterGate::new`] produce
/// independent gates.
pub struct WriterGate<W> {
    inner: Arc<Mutex<FrameWriter<W>>>,
}

impl<W> Clone for WriterGate<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write> WriterGate<W> {
    /// Wrap `writer` with outbound frame limits.
    pub fn new(writer: W) -> Self {
        Self::with_config(writer, FrameConfig::outbound())
    }

    /// Wrap `writer` with explicit frame configuration.
    pub fn with_config(writer: W, config: FrameConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FrameWriter::with_config(writer, config))),
        }
    }

    /// Serialize `payload` into a `{type, payload}` envelope and send it.
    pub fn send<T>(&self, msg_type: &str, payload: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let envelope = Envelope::new(msg_type, payload)?;
        self.send_envelope(&envelope)
    }

    /// Send an already-built envelope as one contiguous frame.
    ///
    /// Errors are always returned to the caller. After a
    /// [`MessageError::Write`] the output may hold a partial frame; the peer
    /// has no way to resynchronize, so the channel should be abandoned.
    pub fn send_envelope(&self, envelope: &Envelope) -> Result<()> {
        let body = envelope.to_json()?;

        let mut writer = self.inner.lock().map_err(|_| MessageError::GatePoisoned)?;
        writer.send(&body).map_err(|err| match err {
            FrameError::Io(io) => MessageError::Write(io),
            other => MessageError::Frame(other),
        })?;
        drop(writer);

        tracing::debug!(msg_type = %envelope.msg_type, size = body.len(), "envelope sent");
        Ok(())
    }
}

impl WriterGate<Stdout> {
    /// The gate for this process's standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}
