use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Not connected")]
    NotConnected,
    #[error("Other: {0}")]
    Other(String),
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e.to_string())
    }
}

/// Byte-oriented link to the microcontroller (USB serial, Bluetooth, loopback).
///
/// Implementations only move bytes. Framing, dispatch and connection status
/// live above this trait, so every variant is interchangeable at construction.
///
/// The trait uses native async fn, so it is used through generics
/// (`LinkActor<T: Transport>`) rather than `Box<dyn Transport>`.
#[allow(async_fn_in_trait)]
pub trait Transport: Send + Sync {
    /// Open the underlying device. Calling this on an open transport is a no-op.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Read whatever bytes are currently available. An empty chunk means no data yet.
    async fn read_chunk(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Write an already framed message.
    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Close the connection.
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Short human-readable name ("serial", "memory", ...).
    fn name(&self) -> &'static str;
}
