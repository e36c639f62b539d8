//! # Routine Interpreter
//!
//! Runs line-oriented fluidics routines:
//!
//! ```text
//! # prime the chip
//! valve all close
//! pressure 1 5.5
//! wait 30 s
//! multiplexer 4
//! valve 12 open   # inlet
//! wait 2 min
//! ```
//!
//! [`RoutineController`] loads and validates a routine, then executes it on
//! its own worker thread. Device commands are never written directly; they
//! are sent as [`ControlIntent`](link_protocol::ControlIntent)s to the link
//! actor, which owns the transport.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod controller;
pub mod errors;
pub mod grammar;
pub mod report;

pub use controller::RoutineController;
pub use errors::{LineError, RoutineError};
pub use grammar::{parse_line, ParsedLine, RoutineStep};
pub use report::RoutineReport;
