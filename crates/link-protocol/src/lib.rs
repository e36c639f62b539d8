//! # Link Protocol
//!
//! Type definitions shared by every layer of the fluidics controller:
//! the wire command set, component addressing, inbound control intents,
//! outbound events and the connection/run state enums.
//!
//! This crate does no I/O and spawns nothing, so it is testable in
//! isolation and usable from both the link actor and the routine worker.
//!
//! ## Message Flow
//!
//! ```text
//! Host/Routine → ControlIntent → LinkActor → framed bytes → Transport
//! Transport → bytes → Framer → Message → Dispatcher → DeviceEvent
//!                                                        ↓
//!                                                  SystemEvent → Host
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod command;
pub mod component;
pub mod errors;
pub mod messages;
pub mod state;

pub use command::{Command, LogLevel, Message, PRESSURE_MAX_VALUE};
pub use component::{
    ComponentBounds, ComponentRegistry, ControllerId, PressureRange, PumpId, ValveId, ValveTarget,
};
pub use errors::{ActorError, ProtocolError};
pub use messages::{ControlIntent, DeviceEvent, SystemEvent};
pub use state::{ConnectionStatus, RunStatus};
