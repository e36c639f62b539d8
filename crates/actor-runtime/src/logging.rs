/// Centralized logging macros for the actor system
///
/// These forward to the `log` facade so the host decides where output goes
/// (`env_logger` in the CLI, nothing in library tests). Keeping them behind
/// one name per level lets every actor log the same way.
///
/// Log debug-level message
///
/// # Example
/// ```
/// use actor_runtime::actor_debug;
/// actor_debug!("LinkActor: {:?} → {:?}", "Disconnected", "Connected");
/// ```
#[macro_export]
macro_rules! actor_debug {
    ($($arg:tt)*) => {
        $crate::__log::debug!($($arg)*)
    };
}

/// Log info-level message
///
/// Use for important state changes and user-facing events
#[macro_export]
macro_rules! actor_info {
    ($($arg:tt)*) => {
        $crate::__log::info!($($arg)*)
    };
}

/// Log warning-level message
///
/// Use for recoverable errors and unexpected conditions
#[macro_export]
macro_rules! actor_warn {
    ($($arg:tt)*) => {
        $crate::__log::warn!($($arg)*)
    };
}

/// Log error-level message
///
/// Use for critical errors that should always be visible
#[macro_export]
macro_rules! actor_error {
    ($($arg:tt)*) => {
        $crate::__log::error!($($arg)*)
    };
}
