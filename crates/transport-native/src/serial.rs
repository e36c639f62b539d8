use core_types::{Transport, TransportError};
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::sync::Mutex;
use std::time::Duration;

const READ_TIMEOUT: Duration = Duration::from_millis(50);
const READ_BUFFER: usize = 256;

/// USB serial link to the microcontroller.
///
/// I/O is blocking with a short read timeout; a read that times out yields an
/// empty chunk rather than an error. Drive it from a thread or a runtime
/// that tolerates short blocking calls.
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    // `SerialPort` is Send but not Sync
    port: Option<Mutex<Box<dyn SerialPort>>>,
}

impl SerialTransport {
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            port: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Serial ports visible to the OS
    pub fn available_ports() -> Result<Vec<String>, TransportError> {
        serialport::available_ports()
            .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
            .map_err(|e| TransportError::Other(e.to_string()))
    }

    fn with_port<R>(
        &self,
        f: impl FnOnce(&mut Box<dyn SerialPort>) -> Result<R, TransportError>,
    ) -> Result<R, TransportError> {
        let port = self.port.as_ref().ok_or(TransportError::NotConnected)?;
        let mut guard = port
            .lock()
            .map_err(|_| TransportError::Other("serial port lock poisoned".into()))?;
        f(&mut guard)
    }
}

impl Transport for SerialTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Ok(());
        }
        let port = serialport::new(&self.path, self.baud_rate)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| TransportError::ConnectionFailed(format!("{}: {}", self.path, e)))?;
        log::info!("Opened {} at {} baud", self.path, self.baud_rate);
        self.port = Some(Mutex::new(port));
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Vec<u8>, TransportError> {
        self.with_port(|port| {
            let mut buf = [0u8; READ_BUFFER];
            match port.read(&mut buf) {
                Ok(n) => Ok(buf.get(..n).map(<[u8]>::to_vec).unwrap_or_default()),
                Err(e) if e.kind() == ErrorKind::TimedOut => Ok(Vec::new()),
                Err(e) => Err(e.into()),
            }
        })
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.with_port(|port| {
            port.write_all(data)?;
            port.flush()?;
            Ok(())
        })
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.port.take().is_some() {
            log::info!("Closed {}", self.path);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "serial"
    }
}
