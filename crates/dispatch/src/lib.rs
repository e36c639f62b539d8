//! Turns decoded frame bodies into typed device events.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod device_log;
pub mod dispatcher;

pub use device_log::log_device_message;
pub use dispatcher::{CommandDispatcher, DispatchError};
