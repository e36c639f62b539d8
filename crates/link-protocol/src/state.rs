use serde::{Deserialize, Serialize};

/// # Connection Status
///
/// Host-driven: the transport collaborator decides when to move between
/// states, nothing here is derived from decoder activity.
///
/// ```text
///  Disconnected ──► Connecting ──► Connected
///       ▲               │              │
///       └───────────────┴──────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    /// User-facing status text
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// # Routine Run Status
///
/// ```text
///  NotReady ──load──► Ready ──begin──► Running ◄──► Paused
///                       ▲                 │           │
///                       │               done         stop
///                       │                 ▼           ▼
///                       └─────begin── Finished     Stopped
/// ```
///
/// `reset` returns to `NotReady` from anywhere. `Finished` and `Stopped`
/// are terminal for a run; a new run starts with `begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RunStatus {
    #[default]
    NotReady,
    Ready,
    Running,
    Paused,
    Finished,
    Stopped,
}

impl RunStatus {
    /// A worker thread is executing steps (or parked on pause).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// A routine is loaded and nothing is executing it.
    pub fn can_begin(&self) -> bool {
        matches!(self, Self::Ready | Self::Finished | Self::Stopped)
    }

    pub fn status_text(&self) -> &'static str {
        match self {
            Self::NotReady => "No routine loaded",
            Self::Ready => "Ready",
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::Finished => "Finished",
            Self::Stopped => "Stopped",
        }
    }
}
