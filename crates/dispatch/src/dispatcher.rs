use core_types::Frame;
use link_protocol::{
    Command, ControllerId, DeviceEvent, LogLevel, Message, ProtocolError, PumpId, ValveId,
    PRESSURE_MAX_VALUE,
};
use thiserror::Error;

/// Why a message was discarded. Never fatal; the next message is unaffected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Invalid number of parameters for {} command: expected {expected}, got {got}", .command.name())]
    WrongArity {
        command: Command,
        expected: usize,
        got: usize,
    },

    #[error("Invalid parameter sizes for {} command: {sizes:?}", .command.name())]
    WrongSizes { command: Command, sizes: Vec<usize> },

    #[error("{} is a request-only command and cannot come from the device", .0.name())]
    RequestOnly(Command),
}

/// Stateless: every call validates one message on its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandDispatcher;

impl CommandDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Parse a frame body and turn it into zero or more events.
    ///
    /// Either every event of the message is returned or none is.
    pub fn dispatch(&self, frame: &Frame) -> Result<Vec<DeviceEvent>, DispatchError> {
        let message = Message::parse(&frame.bytes)?;
        self.dispatch_message(&message)
    }

    pub fn dispatch_message(&self, message: &Message) -> Result<Vec<DeviceEvent>, DispatchError> {
        let command = message.command;
        let params = message.parameters.as_slice();

        match command {
            Command::Valve => {
                let (id, state) = two_bytes(command, params)?;
                Ok(vec![DeviceEvent::ValveStateChanged {
                    valve: ValveId::try_from(id)?,
                    open: state != 0,
                }])
            }
            Command::Pump => {
                let (id, state) = two_bytes(command, params)?;
                Ok(vec![DeviceEvent::PumpStateChanged {
                    pump: PumpId::try_from(id)?,
                    on: state != 0,
                }])
            }
            Command::Pressure => {
                check_arity(command, params, 3)?;
                let (id, setpoint, measured) = match params {
                    [a, b, c] => match (a.as_slice(), b.as_slice(), c.as_slice()) {
                        ([id], [sp], [pv]) => (*id, *sp, *pv),
                        _ => return Err(wrong_sizes(command, params)),
                    },
                    _ => return Err(wrong_sizes(command, params)),
                };
                let controller = ControllerId::try_from(id)?;
                Ok(vec![
                    DeviceEvent::PressureSetpointChanged {
                        controller,
                        value: scale(setpoint),
                    },
                    DeviceEvent::PressureChanged {
                        controller,
                        value: scale(measured),
                    },
                ])
            }
            Command::Uptime => {
                check_arity(command, params, 1)?;
                let bytes: [u8; 4] = params
                    .first()
                    .and_then(|p| p.as_slice().try_into().ok())
                    .ok_or_else(|| wrong_sizes(command, params))?;
                Ok(vec![DeviceEvent::UptimeChanged {
                    seconds: u32::from_be_bytes(bytes),
                }])
            }
            Command::Log => {
                check_arity(command, params, 2)?;
                match params {
                    [level, text] => match level.as_slice() {
                        [level] => Ok(vec![DeviceEvent::Log {
                            level: LogLevel::from(*level),
                            message: String::from_utf8_lossy(text).into_owned(),
                        }]),
                        _ => Err(wrong_sizes(command, params)),
                    },
                    _ => Err(wrong_sizes(command, params)),
                }
            }
            Command::Error => {
                log::debug!("Error received from microcontroller");
                Ok(Vec::new())
            }
            Command::Status => Err(DispatchError::RequestOnly(command)),
        }
    }
}

fn check_arity(command: Command, params: &[Vec<u8>], expected: usize) -> Result<(), DispatchError> {
    if params.len() == expected {
        Ok(())
    } else {
        Err(DispatchError::WrongArity {
            command,
            expected,
            got: params.len(),
        })
    }
}

fn wrong_sizes(command: Command, params: &[Vec<u8>]) -> DispatchError {
    DispatchError::WrongSizes {
        command,
        sizes: params.iter().map(Vec::len).collect(),
    }
}

/// Two single-byte parameters, as used by VALVE and PUMP.
fn two_bytes(command: Command, params: &[Vec<u8>]) -> Result<(u8, u8), DispatchError> {
    check_arity(command, params, 2)?;
    match params {
        [a, b] => match (a.as_slice(), b.as_slice()) {
            ([a], [b]) => Ok((*a, *b)),
            _ => Err(wrong_sizes(command, params)),
        },
        _ => Err(wrong_sizes(command, params)),
    }
}

fn scale(byte: u8) -> f64 {
    f64::from(byte) / f64::from(PRESSURE_MAX_VALUE)
}
