use core_types::Frame;
use thiserror::Error;

pub mod delimited_impl;
pub mod encoder;

pub use delimited_impl::DelimitedFramer;
pub use encoder::{encode, encode_frame};

/// Marks the beginning of a frame. Never escaped.
pub const START_BYTE: u8 = 0xF0;
/// Marks the end of a frame.
pub const STOP_BYTE: u8 = 0xF1;
/// The byte following this one is literal data.
pub const ESCAPE_BYTE: u8 = 0xF2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Parameter {index} is {len} bytes long; a parameter holds at most 255 bytes")]
    ParameterTooLong { index: usize, len: usize },
}

/// Trait for converting a stream of bytes into discrete Frames.
pub trait Framer: Send {
    /// Ingest new bytes and return every complete frame found so far.
    ///
    /// # Arguments
    /// * `bytes` - The new chunk of data read from transport.
    fn push(&mut self, bytes: &[u8]) -> Vec<Frame>;

    /// Reset internal state (e.g., clear buffers).
    fn reset(&mut self);

    /// Get the name of the framer.
    fn name(&self) -> &'static str;
}
