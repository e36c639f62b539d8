use crate::component::{ControllerId, PumpId, ValveId};
use crate::errors::ProtocolError;
use serde::{Deserialize, Serialize};

/// Full-scale value of a one-byte pressure reading or setpoint.
pub const PRESSURE_MAX_VALUE: u8 = u8::MAX;

/// Protocol command tags.
///
/// The set is closed and contiguous from zero; the same tags are used in
/// both directions. Any tag `>= Command::COUNT` marks a frame invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    Valve = 0,
    Pump = 1,
    Pressure = 2,
    /// Request-only (host → device).
    Status = 3,
    Uptime = 4,
    Error = 5,
    Log = 6,
}

impl Command {
    pub const COUNT: u8 = 7;

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Valve),
            1 => Some(Self::Pump),
            2 => Some(Self::Pressure),
            3 => Some(Self::Status),
            4 => Some(Self::Uptime),
            5 => Some(Self::Error),
            6 => Some(Self::Log),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Valve => "VALVE",
            Self::Pump => "PUMP",
            Self::Pressure => "PRESSURE",
            Self::Status => "STATUS",
            Self::Uptime => "UPTIME",
            Self::Error => "ERROR",
            Self::Log => "LOG",
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, ProtocolError> {
        Self::from_byte(byte).ok_or(ProtocolError::UnknownCommand(byte))
    }
}

/// Severity attached to a log message sent by the microcontroller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Fatal,
    Error,
    Warning,
    Info,
    Debug,
    Unknown(u8),
}

impl From<u8> for LogLevel {
    fn from(byte: u8) -> Self {
        match byte {
            0 => Self::Fatal,
            1 => Self::Error,
            2 => Self::Warning,
            3 => Self::Info,
            4 => Self::Debug,
            other => Self::Unknown(other),
        }
    }
}

/// A decoded protocol message: one command plus its length-prefixed parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub command: Command,
    pub parameters: Vec<Vec<u8>>,
}

impl Message {
    pub fn new(command: Command, parameters: Vec<Vec<u8>>) -> Self {
        Self {
            command,
            parameters,
        }
    }

    /// Parse an unescaped frame body: `command | (len | data)*`.
    ///
    /// Lengths must account for every byte exactly; a parameter whose
    /// declared length runs past the end rejects the whole message.
    pub fn parse(body: &[u8]) -> Result<Self, ProtocolError> {
        let (&tag, mut rest) = body.split_first().ok_or(ProtocolError::EmptyMessage)?;
        let command = Command::try_from(tag)?;

        let mut parameters = Vec::new();
        while let Some((&len, after_len)) = rest.split_first() {
            let len = usize::from(len);
            let (data, remaining) = match (after_len.get(..len), after_len.get(len..)) {
                (Some(data), Some(remaining)) => (data, remaining),
                _ => {
                    return Err(ProtocolError::TruncatedParameter {
                        index: parameters.len(),
                        declared: len,
                        available: after_len.len(),
                    })
                }
            };
            parameters.push(data.to_vec());
            rest = remaining;
        }

        Ok(Self {
            command,
            parameters,
        })
    }

    /// Parameters as slices, ready for the frame encoder.
    pub fn parameter_slices(&self) -> Vec<&[u8]> {
        self.parameters.iter().map(Vec::as_slice).collect()
    }

    pub fn set_valve(valve: ValveId, open: bool) -> Self {
        Self::new(Command::Valve, vec![vec![valve.get()], vec![u8::from(open)]])
    }

    pub fn set_pump(pump: PumpId, on: bool) -> Self {
        Self::new(Command::Pump, vec![vec![pump.get()], vec![u8::from(on)]])
    }

    /// `setpoint` is a fraction of the controller's range and must lie in `[0, 1]`.
    pub fn set_pressure(controller: ControllerId, setpoint: f64) -> Result<Self, ProtocolError> {
        if !(0.0..=1.0).contains(&setpoint) {
            return Err(ProtocolError::PressureOutOfRange(setpoint));
        }
        // Truncates toward zero, as the firmware expects.
        let sp = (setpoint * f64::from(PRESSURE_MAX_VALUE)) as u8;
        Ok(Self::new(
            Command::Pressure,
            vec![vec![controller.get()], vec![sp]],
        ))
    }

    pub fn request_status() -> Self {
        Self::new(Command::Status, Vec::new())
    }
}
