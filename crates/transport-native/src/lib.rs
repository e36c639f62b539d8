//! # Native Transports
//!
//! [`Transport`](core_types::Transport) variants for hosts with an OS:
//!
//! - [`MemoryTransport`]: in-process loopback, used by tests and demos
//! - `SerialTransport` (feature `serial`): USB serial through `serialport`

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod memory;
#[cfg(feature = "serial")]
pub mod serial;

pub use memory::{MemoryHandle, MemoryTransport};
#[cfg(feature = "serial")]
pub use serial::SerialTransport;
