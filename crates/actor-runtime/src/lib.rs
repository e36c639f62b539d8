//! # Actor Runtime
//!
//! Runtime infrastructure shared by the link actor and the routine worker.
//!
//! This crate defines:
//! - **Actor trait**: Base trait for message-driven components with lifecycle methods
//! - **Channel management**: Typed channels between host, link actor and routine worker
//! - **Run control**: Interruptible pause/stop/wake primitive for worker threads
//! - **Logging macros**: Thin wrappers over the `log` facade
//!
//! ## Architecture
//!
//! - **One writer**: only the link actor touches the transport; everyone
//!   else sends it a [`LinkMessage`]
//! - **Message passing**: Actors communicate via typed messages
//! - **Sequential processing**: Messages are handled one at a time
//! - **Failure isolation**: Actor errors are reported as events, never panics
//!
//! ## Example
//!
//! ```ignore
//! use actor_runtime::{Actor, ChannelManager};
//!
//! let (manager, handles) = ChannelManager::new();
//! let link = LinkActor::new(transport, handles.event_tx.clone());
//! tokio::spawn(link.run(handles.link_rx, handles.event_tx));
//!
//! manager.send_intent(ControlIntent::RequestStatus)?;
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod actor;
pub mod cancellation;
pub mod channels;
pub mod logging;

pub use actor::Actor;
pub use cancellation::{RunControl, WakeReason};
pub use channels::{ActorHandles, ChannelManager, LinkMessage};

#[doc(hidden)]
pub use log as __log;
