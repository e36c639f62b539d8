//! Error Handling Guidelines
//!
//! All error messages should follow this format:
//!
//! 1. **What failed**: Describe the operation that failed
//! 2. **Why it failed**: Provide the root cause if known
//! 3. **What to do**: Suggest user action when possible
//!
//! None of these errors is fatal. Each one is reported where it is detected
//! and the offending message, intent or line is dropped.

use thiserror::Error;

/// Malformed protocol data or out-of-range control input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Frame body had no command byte at all
    #[error("Empty message: frame contained no command byte")]
    EmptyMessage,

    /// Tag outside the known command range
    #[error("Unknown command tag {0:#04x}")]
    UnknownCommand(u8),

    /// Declared parameter length runs past the end of the message
    #[error("Parameter {index} declares {declared} bytes but only {available} remain; ignoring message")]
    TruncatedParameter {
        index: usize,
        declared: usize,
        available: usize,
    },

    /// Component number is 0 or above the hardware limit
    #[error("Invalid {kind} number {id}: must be between 1 and {max}")]
    InvalidComponent {
        kind: &'static str,
        id: u8,
        max: u8,
    },

    /// Pressure setpoints are fractions of the controller range
    #[error("Pressure setpoint {0} invalid: must be between 0 and 1")]
    PressureOutOfRange(f64),

    /// Component configuration rejected
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Unified error type for actor operations
#[derive(Error, Debug, Clone)]
pub enum ActorError {
    /// Communication channel closed
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol-level rejection
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for ActorError {
    fn from(s: String) -> Self {
        ActorError::Other(s)
    }
}

impl From<&str> for ActorError {
    fn from(s: &str) -> Self {
        ActorError::Other(s.to_string())
    }
}
