use link_protocol::LogLevel;

const TARGET: &str = "microcontroller";

/// Forward a firmware log line to the `log` facade at the matching level.
pub fn log_device_message(level: LogLevel, message: &str) {
    match level {
        LogLevel::Fatal | LogLevel::Error => log::error!(target: TARGET, "Microcontroller: {}", message),
        LogLevel::Warning => log::warn!(target: TARGET, "Microcontroller: {}", message),
        LogLevel::Info => log::info!(target: TARGET, "Microcontroller: {}", message),
        LogLevel::Debug => log::debug!(target: TARGET, "Microcontroller: {}", message),
        LogLevel::Unknown(raw) => log::debug!(
            target: TARGET,
            "Message from microcontroller with unknown level {}: {}",
            raw,
            message
        ),
    }
}
