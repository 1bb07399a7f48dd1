//! Browser native messaging host that opens repositories in throwaway sandboxes.
//!
//! The extension sends `{"type":"sandbox","payload":{"url":…}}`; the host
//! clones the repository into a fresh directory, opens a terminal there and
//! reports progress with `status` messages.
//!
//! # Crate Structure
//!
//! - [`frame`]: 4-byte little-endian length-prefixed framing
//! - [`message`]: typed envelopes, the input stream and the output gate
//! - [`sandbox`]: clone, terminal and cleanup

/// Re-export frame types.
pub mod frame {
    pub use ghsandbox_frame::*;
}

/// Re-export message types.
pub mod message {
    pub use ghsandbox_message::*;
}

/// Re-export sandbox types.
pub mod sandbox {
    pub use ghsandbox_sandbox::*;
}
