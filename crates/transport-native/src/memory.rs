use core_types::{Transport, TransportError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Shared {
    connected: bool,
    /// Bytes "sent by the device", waiting to be read
    incoming: Vec<u8>,
    /// One entry per `write` call
    written: Vec<Vec<u8>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Loopback transport. The paired [`MemoryHandle`] plays the device side.
#[derive(Debug)]
pub struct MemoryTransport {
    shared: Arc<Mutex<Shared>>,
    /// Upper bound on bytes returned by one `read_chunk`
    chunk_size: usize,
}

/// Device side of a [`MemoryTransport`]
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryTransport {
    pub fn new() -> (Self, MemoryHandle) {
        Self::with_chunk_size(usize::MAX)
    }

    /// Deliver incoming data in pieces of at most `chunk_size` bytes, to
    /// exercise frames split across reads.
    pub fn with_chunk_size(chunk_size: usize) -> (Self, MemoryHandle) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                shared: shared.clone(),
                chunk_size: chunk_size.max(1),
            },
            MemoryHandle { shared },
        )
    }
}

impl MemoryHandle {
    /// Queue bytes for the host to read
    pub fn inject(&self, bytes: &[u8]) {
        lock(&self.shared).incoming.extend_from_slice(bytes);
    }

    /// Everything the host wrote so far, one entry per write
    pub fn written(&self) -> Vec<Vec<u8>> {
        lock(&self.shared).written.clone()
    }

    pub fn take_written(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut lock(&self.shared).written)
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.shared).connected
    }

    /// Simulate the device going away
    pub fn disconnect(&self) {
        lock(&self.shared).connected = false;
    }
}

impl Transport for MemoryTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        lock(&self.shared).connected = true;
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut shared = lock(&self.shared);
        if !shared.connected {
            return Err(TransportError::NotConnected);
        }
        let take = shared.incoming.len().min(self.chunk_size);
        Ok(shared.incoming.drain(..take).collect())
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut shared = lock(&self.shared);
        if !shared.connected {
            return Err(TransportError::NotConnected);
        }
        shared.written.push(data.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        lock(&self.shared).connected = false;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
