//! Cancellable, ordered stream of envelopes read from a blocking source.
//!
//! A dedicated reader thread decodes one frame at a time and hands each
//! envelope to the consumer through a channel with a single slot. The thread
//! therefore runs at most one envelope ahead of the consumer, and envelopes
//! arrive in exactly the order their frames did.
//!
//! Cancellation is checked between reads. A read that is already blocked
//! on the source is not interrupted; the consumer side closes immediately
//! and the reader thread exits once that read returns.

use std::future::Future;
use std::io::Read;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use ghsandbox_frame::{FrameConfig, FrameError};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::{debug, warn};

use crate::envelope::{Envelope, EnvelopeReader};
use crate::error::{MessageError, Result};

const READER_THREAD_NAME: &str = "message-stream";

/// Envelopes read continuously from one input source.
///
/// Once closed (by cancellation, end of input, or a fatal read error) the
/// stream yields `None` forever.
pub struct MessageStream {
    rx: mpsc::Receiver<Envelope>,
    cancel: CancellationToken,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    closed: bool,
}

impl MessageStream {
    /// Start reading envelopes from `source` on a background thread.
    ///
    /// The stream listens on a child of `cancel`: cancelling `cancel` closes
    /// the stream, while [`MessageStream::close`] leaves `cancel` untouched.
    pub fn open<R>(source: R, config: FrameConfig, cancel: &CancellationToken) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let token = cancel.child_token();
        let (tx, rx) = mpsc::channel(1);
        let reader = EnvelopeReader::with_config(source, config);

        let producer_token = token.clone();
        std::thread::Builder::new()
            .name(READER_THREAD_NAME.to_string())
            .spawn(move || produce(reader, tx, producer_token))
            .map_err(MessageError::Spawn)?;

        debug!(max_payload = config.max_payload_size, "message stream opened");
        Ok(Self {
            rx,
            cancelled: Box::pin(token.clone().cancelled_owned()),
            cancel: token,
            closed: false,
        })
    }

    /// Start reading envelopes from this process's standard input.
    pub fn stdin(config: FrameConfig, cancel: &CancellationToken) -> Result<Self> {
        Self::open(std::io::stdin(), config, cancel)
    }

    /// Wait for the next envelope, or `None` once the stream is closed.
    pub async fn recv(&mut self) -> Option<Envelope> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    /// Stop the stream. No further envelopes are delivered.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.shut();
    }

    /// Whether the stream has reached its terminal state.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn shut(&mut self) {
        if !self.closed {
            self.closed = true;
            // Wakes a reader thread blocked on delivery.
            self.rx.close();
            debug!("message stream closed");
        }
    }
}

impl Stream for MessageStream {
    type Item = Envelope;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Envelope>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(None);
        }

        if this.cancelled.as_mut().poll(cx).is_ready() {
            this.shut();
            return Poll::Ready(None);
        }

        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(envelope)) => Poll::Ready(Some(envelope)),
            Poll::Ready(None) => {
                this.shut();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStream")
            .field("closed", &self.closed)
            .finish()
    }
}

fn produce<R: Read>(
    mut reader: EnvelopeReader<R>,
    tx: mpsc::Sender<Envelope>,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            debug!("message stream cancelled, reader stopping");
            return;
        }

        match reader.read_envelope() {
            Ok(envelope) => {
                if cancel.is_cancelled() {
                    debug!(msg_type = %envelope.msg_type, "message stream cancelled, dropping envelope");
                    return;
                }
                if tx.blocking_send(envelope).is_err() {
                    debug!("message stream consumer gone, reader stopping");
                    return;
                }
            }
            Err(MessageError::Frame(FrameError::ConnectionClosed)) => {
                debug!("message stream reached end of input");
                return;
            }
            Err(err) if err.is_terminal() => {
                warn!(error = %err, "message stream read failed, closing");
                return;
            }
            Err(err) => {
                warn!(error = %err, "skipping malformed message");
            }
        }
    }
}
