use serde::{Deserialize, Serialize};

pub mod transport;
pub use transport::{Transport, TransportError};

/// One delimited message body, with start/stop/escape bytes already removed.
///
/// The first byte is the command tag; the rest are `(length, data)` pairs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Frame {
    /// The unescaped bytes between the start and stop markers.
    pub bytes: Vec<u8>,
}

impl Frame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Command tag byte, if the body is not empty.
    pub fn tag(&self) -> Option<u8> {
        self.bytes.first().copied()
    }
}
