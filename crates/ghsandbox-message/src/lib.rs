//! Typed envelopes over native messaging frames.
//!
//! - [`envelope`]: `{type, payload}` JSON envelopes and their frame encoding
//! - [`stream`]: a cancellable, ordered [`MessageStream`] fed by a blocking reader
//! - [`gate`]: a [`WriterGate`] that keeps concurrent sends from interleaving
//!
//! The input channel belongs to exactly one [`MessageStream`]; the output
//! channel is written only through a [`WriterGate`].

pub mod envelope;
pub mod error;
pub mod gate;
pub mod stream;

pub use envelope::{decode_envelope, encode_envelope, Envelope, EnvelopeReader};
pub use error::{MessageError, Result};
pub use gate::WriterGate;
pub use stream::MessageStream;
