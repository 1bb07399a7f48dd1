use ghsandbox_frame::FrameError;

/// Errors that can occur while encoding, decoding or sending envelopes.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Frame-level error (short read, oversized frame, closed source).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The envelope `type` tag is empty.
    #[error("envelope type must not be empty")]
    EmptyType,

    /// Writing an encoded frame to the output channel failed.
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    /// A previous sender panicked while holding the writer gate.
    #[error("writer gate poisoned")]
    GatePoisoned,

    /// The background reader could not be started.
    #[error("failed to start message stream: {0}")]
    Spawn(#[source] std::io::Error),
}

impl MessageError {
    /// Whether a read loop that hit this error can keep going.
    ///
    /// Frame errors mean the input is closed or misaligned. JSON and empty
    /// type errors only affect the one complete frame that carried them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Serialization(_) | Self::EmptyType)
    }
}

pub type Result<T> = std::result::Result<T, MessageError>;
