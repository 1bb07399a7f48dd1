use std::io::Write;

use ghsandbox_frame::FrameConfig;
use ghsandbox_message::{Envelope, MessageStream, WriterGate};
use ghsandbox_sandbox::{Sandbox, SandboxConfig, SandboxError, SandboxRequest};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::exit::{message_error, CliResult, SUCCESS};

/// Inbound message type: open a repository sandbox.
pub const SANDBOX: &str = "sandbox";
/// Outbound message type: progress of a request.
pub const STATUS: &str = "status";

/// Payload of a `status` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Status {
    /// The request was received and is being handled.
    Accepted,
    /// The sandbox terminal was closed normally.
    Closed,
    /// The request could not be completed.
    Failed { error: String },
}

/// Whatever turns a decoded sandbox request into side effects.
pub(crate) trait Launcher {
    async fn launch(&self, request: SandboxRequest) -> Result<(), SandboxError>;
}

impl Launcher for Sandbox {
    async fn launch(&self, request: SandboxRequest) -> Result<(), SandboxError> {
        let path = self.open(&request).await?;
        info!(url = %request.url, path = %path.display(), "sandbox closed");
        Ok(())
    }
}

enum Disposition {
    Continue,
    Stop,
}

/// Routes envelopes from the stream to the launcher and reports status.
pub(crate) struct Dispatcher<L, W> {
    launcher: L,
    gate: WriterGate<W>,
}

impl<L: Launcher, W: Write> Dispatcher<L, W> {
    pub fn new(launcher: L, gate: WriterGate<W>) -> Self {
        Self { launcher, gate }
    }

    /// Handle envelopes until the stream closes. Returns how many were handled.
    pub async fn run(&self, mut stream: MessageStream) -> usize {
        let mut handled = 0usize;
        while let Some(envelope) = stream.recv().await {
            handled += 1;
            if let Disposition::Stop = self.handle(&envelope).await {
                stream.close();
            }
        }
        handled
    }

    async fn handle(&self, envelope: &Envelope) -> Disposition {
        match envelope.msg_type.as_str() {
            SANDBOX => {
                self.report(&Status::Accepted);
                let request = match envelope.payload_as::<SandboxRequest>() {
                    Ok(request) => request,
                    Err(err) => {
                        warn!(error = %err, "malformed sandbox request");
                        self.report(&Status::Failed {
                            error: err.to_string(),
                        });
                        return Disposition::Continue;
                    }
                };

                info!(url = %request.url, "sandbox requested");
                match self.launcher.launch(request).await {
                    Ok(()) => self.report(&Status::Closed),
                    Err(err) => {
                        warn!(error = %err, "sandbox failed");
                        self.report(&Status::Failed {
                            error: err.to_string(),
                        });
                    }
                }
                Disposition::Continue
            }
            other => {
                warn!(msg_type = other, "no action matches message type, closing stream");
                Disposition::Stop
            }
        }
    }

    fn report(&self, status: &Status) {
        if let Err(err) = self.gate.send(STATUS, status) {
            warn!(error = %err, ?status, "failed to send status");
        }
    }
}

/// Serve stdin/stdout until the browser disconnects or the process is
/// signalled.
pub async fn serve(sandbox: SandboxConfig, frames: FrameConfig) -> CliResult<i32> {
    let root = CancellationToken::new();
    tokio::spawn(cancel_on_signal(root.clone()));

    let stream =
        MessageStream::stdin(frames, &root).map_err(|err| message_error("cannot read stdin", err))?;
    let dispatcher = Dispatcher::new(Sandbox::new(sandbox), WriterGate::stdout());

    let handled = dispatcher.run(stream).await;
    root.cancel();
    info!(handled, "message stream closed, exiting");
    Ok(SUCCESS)
}

async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        () = token.cancelled() => return,
        () = shutdown_signal() => {}
    }
    debug!("shutdown signal received");
    token.cancel();
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(err) => {
            warn!(error = %err, "cannot watch SIGTERM");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use ghsandbox_frame::FrameError;
    use ghsandbox_message::{encode_envelope, EnvelopeReader, MessageError};
    use serde_json::{json, Value};

    use super::*;

    #[derive(Default)]
    struct RecordingLauncher {
        urls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Launcher for &RecordingLauncher {
        async fn launch(&self, request: SandboxRequest) -> Result<(), SandboxError> {
            self.urls.lock().unwrap().push(request.url);
            if self.fail {
                return Err(SandboxError::UnsupportedPlatform("test"));
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ClosedSink;

    impl Write for ClosedSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn wire(messages: &[(&str, Value)]) -> Vec<u8> {
        messages
            .iter()
            .flat_map(|(msg_type, payload)| encode_envelope(msg_type, payload).unwrap().to_vec())
            .collect()
    }

    fn stream(bytes: Vec<u8>) -> MessageStream {
        MessageStream::open(
            Cursor::new(bytes),
            FrameConfig::inbound(),
            &CancellationToken::new(),
        )
        .unwrap()
    }

    fn statuses(sink: &SharedSink) -> Vec<Value> {
        let bytes = sink.0.lock().unwrap().clone();
        let mut reader = EnvelopeReader::new(Cursor::new(bytes));
        let mut out = Vec::new();
        loop {
            match reader.read_envelope() {
                Ok(envelope) => {
                    assert_eq!(envelope.msg_type, STATUS);
                    out.push(envelope.payload_as().unwrap());
                }
                Err(MessageError::Frame(FrameError::ConnectionClosed)) => return out,
                Err(err) => panic!("bad status frame: {err}"),
            }
        }
    }

    #[test]
    fn status_wire_shape() {
        assert_eq!(
            serde_json::to_value(Status::Accepted).unwrap(),
            json!({"state": "accepted"})
        );
        assert_eq!(
            serde_json::to_value(Status::Failed {
                error: "boom".to_string()
            })
            .unwrap(),
            json!({"state": "failed", "error": "boom"})
        );
    }

    #[tokio::test]
    async fn sandbox_request_is_launched_and_acknowledged() {
        let launcher = RecordingLauncher::default();
        let sink = SharedSink::default();
        let dispatcher = Dispatcher::new(&launcher, WriterGate::new(sink.clone()));

        let handled = dispatcher
            .run(stream(wire(&[(
                SANDBOX,
                json!({"url": "https://github.com/owner/repo"}),
            )])))
            .await;

        assert_eq!(handled, 1);
        assert_eq!(
            *launcher.urls.lock().unwrap(),
            vec!["https://github.com/owner/repo".to_string()]
        );
        assert_eq!(
            statuses(&sink),
            vec![json!({"state": "accepted"}), json!({"state": "closed"})]
        );
    }

    #[tokio::test]
    async fn malformed_request_reports_failure_and_continues() {
        let launcher = RecordingLauncher::default();
        let sink = SharedSink::default();
        let dispatcher = Dispatcher::new(&launcher, WriterGate::new(sink.clone()));

        let handled = dispatcher
            .run(stream(wire(&[
                (SANDBOX, json!({"link": 1})),
                (SANDBOX, json!({"url": "https://github.com/a/b"})),
            ])))
            .await;

        assert_eq!(handled, 2);
        assert_eq!(launcher.urls.lock().unwrap().len(), 1);

        let statuses = statuses(&sink);
        assert_eq!(statuses.len(), 4);
        assert_eq!(statuses[1]["state"], "failed");
        assert!(statuses[1]["error"].as_str().unwrap().contains("url"));
        assert_eq!(statuses[3], json!({"state": "closed"}));
    }

    #[tokio::test]
    async fn launcher_failure_is_reported() {
        let launcher = RecordingLauncher {
            fail: true,
            ..RecordingLauncher::default()
        };
        let sink = SharedSink::default();
        let dispatcher = Dispatcher::new(&launcher, WriterGate::new(sink.clone()));

        dispatcher
            .run(stream(wire(&[(SANDBOX, json!({"url": "https://x.y/a/b"}))])))
            .await;

        let statuses = statuses(&sink);
        assert_eq!(statuses[0], json!({"state": "accepted"}));
        assert_eq!(statuses[1]["state"], "failed");
        assert_eq!(
            statuses[1]["error"],
            "opening a terminal is not supported on test"
        );
    }

    #[tokio::test]
    async fn unknown_type_closes_stream() {
        let launcher = RecordingLauncher::default();
        let sink = SharedSink::default();
        let dispatcher = Dispatcher::new(&launcher, WriterGate::new(sink.clone()));

        let handled = dispatcher
            .run(stream(wire(&[
                ("ping", json!({})),
                (SANDBOX, json!({"url": "https://github.com/a/b"})),
            ])))
            .await;

        assert_eq!(handled, 1);
        assert!(launcher.urls.lock().unwrap().is_empty());
        assert!(statuses(&sink).is_empty());
    }

    #[tokio::test]
    async fn status_write_failure_does_not_stop_dispatch() {
        let launcher = RecordingLauncher::default();
        let dispatcher = Dispatcher::new(&launcher, WriterGate::new(ClosedSink));

        let handled = dispatcher
            .run(stream(wire(&[
                (SANDBOX, json!({"url": "https://github.com/a/b"})),
                (SANDBOX, json!({"url": "https://github.com/c/d"})),
            ])))
            .await;

        assert_eq!(handled, 2);
        assert_eq!(launcher.urls.lock().unwrap().len(), 2);
    }
}
