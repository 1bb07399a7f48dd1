//! Length-prefixed frame codec for browser native messaging.
//!
//! Every message on the wire is a 4-byte little-endian unsigned length
//! followed by exactly that many payload bytes. There is no magic number and
//! no resynchronization marker: once a reader loses its place, the stream is
//! unusable.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    encode_frame, read_frame_length, read_frame_payload, FrameConfig, DEFAULT_MAX_INBOUND,
    DEFAULT_MAX_OUTBOUND, HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
