use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors that can occur while preparing or running a sandbox.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// The requested URL does not name a repository.
    #[error("invalid repository url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The sandbox directory could not be created or removed.
    #[error("sandbox directory {path}: {source}")]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An external program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// `git clone` exited unsuccessfully.
    #[error("git clone failed ({status}): {stderr}")]
    CloneFailed { status: ExitStatus, stderr: String },

    /// The terminal exited unsuccessfully.
    #[error("terminal exited with {0}")]
    TerminalFailed(ExitStatus),

    /// No default terminal is known for this platform.
    #[error("opening a terminal is not supported on {0}")]
    UnsupportedPlatform(&'static str),
}

pub type Result<T> = std::result::Result<T, SandboxError>;
