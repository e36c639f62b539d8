use crate::command::{LogLevel, Message};
use crate::component::{ControllerId, PumpId, ValveId};
use crate::errors::ProtocolError;
use crate::state::{ConnectionStatus, RunStatus};
use serde::{Deserialize, Serialize};

/// Control requests from the host UI or the routine worker.
///
/// Both sources produce the same intents; only the link actor turns them
/// into bytes on the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlIntent {
    SetValve { valve: ValveId, open: bool },
    SetPump { pump: PumpId, on: bool },
    /// `setpoint` is a fraction of the controller range, `[0, 1]`.
    SetPressure { controller: ControllerId, setpoint: f64 },
    /// Ask the device to report every component
    RequestStatus,
    /// Output multiplexer channel; opaque, handled by the host
    SetMultiplexer { channel: String },
    /// Input multiplexer channel; opaque, handled by the host
    SetInputMultiplexer { channel: String },
}

impl ControlIntent {
    /// Wire message for this intent, or `None` for intents with no wire form.
    pub fn to_message(&self) -> Result<Option<Message>, ProtocolError> {
        match self {
            Self::SetValve { valve, open } => Ok(Some(Message::set_valve(*valve, *open))),
            Self::SetPump { pump, on } => Ok(Some(Message::set_pump(*pump, *on))),
            Self::SetPressure {
                controller,
                setpoint,
            } => Message::set_pressure(*controller, *setpoint).map(Some),
            Self::RequestStatus => Ok(Some(Message::request_status())),
            Self::SetMultiplexer { .. } | Self::SetInputMultiplexer { .. } => Ok(None),
        }
    }
}

/// Status and telemetry reported by the microcontroller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeviceEvent {
    ValveStateChanged { valve: ValveId, open: bool },
    PumpStateChanged { pump: PumpId, on: bool },
    /// Commanded setpoint, scaled to `[0, 1]`
    PressureSetpointChanged { controller: ControllerId, value: f64 },
    /// Measured value, scaled to `[0, 1]`
    PressureChanged { controller: ControllerId, value: f64 },
    /// Seconds since the microcontroller booted
    UptimeChanged { seconds: u32 },
    /// Free-form log line from the firmware
    Log { level: LogLevel, message: String },
}

/// Events from the core to the host UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SystemEvent {
    /// Connection status has changed
    ConnectionStatusChanged { status: ConnectionStatus },

    /// Decoded device status
    Device(DeviceEvent),

    /// A routine selected an output multiplexer channel
    MultiplexerRequested { channel: String },

    /// A routine selected an input multiplexer channel
    InputMultiplexerRequested { channel: String },

    /// Routine run status has changed
    RunStatusChanged { status: RunStatus },

    /// Zero-based index of the step now executing
    CurrentStepChanged { step: usize },

    /// Cumulative time spent in wait steps during this run
    ElapsedTimeChanged { seconds: f64 },

    /// Sum of all wait steps, computed during validation
    TotalWaitTimeChanged { seconds: f64 },

    /// Validated step list was rebuilt
    StepsChanged { count: usize },

    /// A routine line failed validation
    RoutineError { message: String },

    RoutinePaused,
    RoutineResumed,
    RoutineFinished,
    RoutineStopped,

    /// Error occurred
    Error { message: String },
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::command::Command;

    #[test]
    fn test_intent_to_message() {
        let intent = ControlIntent::SetValve {
            valve: ValveId::new(3).unwrap(),
            open: false,
        };
        let msg = intent.to_message().unwrap().unwrap();
        assert_eq!(msg.command, Command::Valve);
        assert_eq!(msg.parameters, vec![vec![3], vec![0]]);

        let status = ControlIntent::RequestStatus.to_message().unwrap().unwrap();
        assert!(status.parameters.is_empty());
    }

    #[test]
    fn test_multiplexer_has_no_wire_form() {
        let intent = ControlIntent::SetMultiplexer {
            channel: "4".into(),
        };
        assert_eq!(intent.to_message().unwrap(), None);
    }

    #[test]
    fn test_invalid_pressure_intent() {
        let intent = ControlIntent::SetPressure {
            controller: ControllerId::new(1).unwrap(),
            setpoint: 1.2,
        };
        assert!(intent.to_message().is_err());
    }

    #[test]
    fn test_system_event_serialization() {
        let event = SystemEvent::Device(DeviceEvent::PressureChanged {
            controller: ControllerId::new(2).unwrap(),
            value: 0.25,
        });
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: SystemEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_control_intent_serialization() {
        let intent = ControlIntent::SetPump {
            pump: PumpId::new(1).unwrap(),
            on: true,
        };
        let json = serde_json::to_string(&intent).unwrap();
        let deserialized: ControlIntent = serde_json::from_str(&json).unwrap();
        match deserialized {
            ControlIntent::SetPump { pump, on } => {
                assert_eq!(pump.get(), 1);
                assert!(on);
            }
            _ => panic!("Wrong variant"),
        }
    }
}
