use std::path::PathBuf;
use thiserror::Error;

/// Why a routine line was rejected. Displayed after a `Line <n>: ` prefix.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LineError {
    #[error("line starting with \"{keyword}\" should contain {expected} arguments. For example, \"{example}\"")]
    ArgumentCount {
        keyword: &'static str,
        expected: &'static str,
        example: &'static str,
    },

    #[error("invalid valve ID: {id}. Must be 'all' or an integer between 1 and {max}")]
    InvalidValve { id: String, max: u8 },

    #[error("valve status not recognized: {0}")]
    ValveState(String),

    #[error("invalid pressure controller ID: {id}. Must be an integer between 1 and {max}")]
    InvalidController { id: String, max: u8 },

    #[error("Pressure value invalid: {0}")]
    InvalidPressure(String),

    #[error("Pressure value out of bounds for this controller: {0}")]
    PressureOutOfBounds(String),

    #[error("could not parse wait time argument: {0}")]
    WaitTime(String),

    #[error("unknown command \"{0}\"")]
    UnknownCommand(String),
}

/// Controller-level failures. Per-line problems are never errors here; they
/// are collected in the report.
#[derive(Error, Debug)]
pub enum RoutineError {
    #[error("Could not load file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No routine loaded")]
    NotReady,

    #[error("A routine is already running; stop it first")]
    AlreadyRunning,

    #[error("Could not start routine worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Routine worker panicked")]
    WorkerPanicked,
}
