//! # Connection Actors
//!
//! Actors that own the link to the microcontroller.
//!
//! ## Actors
//!
//! - **LinkActor**: Sole owner of the transport. Encodes control intents into
//!   frames, decodes incoming bytes and publishes device events
//! - **StatusMachine**: Disconnected / Connecting / Connected tracking with
//!   change-only notifications

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod link_actor;
pub mod status_machine;

pub use link_actor::LinkActor;
pub use status_machine::StatusMachine;
