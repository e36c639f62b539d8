//! Line grammar
//!
//! ```text
//! valve <id|all> <open|close>
//! pressure <id> <value>
//! wait <amount> [unit]
//! multiplexer <channel>
//! input <channel>
//! ```
//!
//! `#` starts a comment. Tokens are separated by any amount of whitespace.

use crate::errors::LineError;
use link_protocol::{ComponentBounds, ControlIntent, ControllerId, ValveId, ValveTarget};

/// One validated, executable instruction
#[derive(Debug, Clone, PartialEq)]
pub enum RoutineStep {
    Valve {
        target: ValveTarget,
        open: bool,
    },
    /// `value` is in controller units; `setpoint` is what goes on the wire.
    Pressure {
        controller: ControllerId,
        value: f64,
        setpoint: f64,
    },
    Wait {
        seconds: f64,
    },
    Multiplexer {
        channel: String,
    },
    InputMultiplexer {
        channel: String,
    },
}

impl RoutineStep {
    /// Intents this step sends to the link actor. `valve all` expands to
    /// one intent per configured valve.
    pub fn intents(&self, bounds: &dyn ComponentBounds) -> Vec<ControlIntent> {
        match self {
            Self::Valve {
                target: ValveTarget::One(valve),
                open,
            } => vec![ControlIntent::SetValve {
                valve: *valve,
                open: *open,
            }],
            Self::Valve {
                target: ValveTarget::All,
                open,
            } => ValveId::range(bounds.n_valves())
                .map(|valve| ControlIntent::SetValve { valve, open: *open })
                .collect(),
            Self::Pressure {
                controller,
                setpoint,
                ..
            } => vec![ControlIntent::SetPressure {
                controller: *controller,
                setpoint: *setpoint,
            }],
            Self::Multiplexer { channel } => vec![ControlIntent::SetMultiplexer {
                channel: channel.clone(),
            }],
            Self::InputMultiplexer { channel } => vec![ControlIntent::SetInputMultiplexer {
                channel: channel.clone(),
            }],
            Self::Wait { .. } => Vec::new(),
        }
    }
}

/// A step plus the normalized text it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub step: RoutineStep,
    /// Comment stripped, whitespace collapsed
    pub text: String,
}

/// Parse one source line.
///
/// Returns `Ok(None)` for blank and comment-only lines.
pub fn parse_line(line: &str, bounds: &dyn ComponentBounds) -> Result<Option<ParsedLine>, LineError> {
    let code = line.split('#').next().unwrap_or_default();
    let tokens: Vec<&str> = code.split_whitespace().collect();

    let step = match tokens.as_slice() {
        [] => return Ok(None),
        ["valve", rest @ ..] => parse_valve(rest, bounds)?,
        ["pressure", rest @ ..] => parse_pressure(rest, bounds)?,
        ["wait", rest @ ..] => parse_wait(rest)?,
        ["multiplexer", rest @ ..] => match rest {
            [channel] => RoutineStep::Multiplexer {
                channel: (*channel).to_string(),
            },
            _ => {
                return Err(LineError::ArgumentCount {
                    keyword: "multiplexer",
                    expected: "2",
                    example: "multiplexer 4",
                })
            }
        },
        ["input", rest @ ..] => match rest {
            [channel] => RoutineStep::InputMultiplexer {
                channel: (*channel).to_string(),
            },
            _ => {
                return Err(LineError::ArgumentCount {
                    keyword: "input",
                    expected: "2",
                    example: "input 4",
                })
            }
        },
        [keyword, ..] => return Err(LineError::UnknownCommand((*keyword).to_string())),
    };

    Ok(Some(ParsedLine {
        step,
        text: tokens.join(" "),
    }))
}

fn parse_valve(args: &[&str], bounds: &dyn ComponentBounds) -> Result<RoutineStep, LineError> {
    let [id, state] = args else {
        return Err(LineError::ArgumentCount {
            keyword: "valve",
            expected: "3",
            example: "valve 12 open",
        });
    };

    let n_valves = bounds.n_valves();
    let target = if *id == "all" {
        ValveTarget::All
    } else {
        id.parse::<u8>()
            .ok()
            .filter(|n| (1..=n_valves).contains(n))
            .and_then(ValveId::new)
            .map(ValveTarget::One)
            .ok_or_else(|| LineError::InvalidValve {
                id: (*id).to_string(),
                max: n_valves,
            })?
    };

    let open = match *state {
        "open" => true,
        "close" => false,
        other => return Err(LineError::ValveState(other.to_string())),
    };

    Ok(RoutineStep::Valve { target, open })
}

fn parse_pressure(args: &[&str], bounds: &dyn ComponentBounds) -> Result<RoutineStep, LineError> {
    let [id, value] = args else {
        return Err(LineError::ArgumentCount {
            keyword: "pressure",
            expected: "3",
            example: "pressure 2 6.3",
        });
    };

    let n_controllers = bounds.n_pressure_controllers();
    let controller = id
        .parse::<u8>()
        .ok()
        .filter(|n| (1..=n_controllers).contains(n))
        .and_then(ControllerId::new)
        .ok_or_else(|| LineError::InvalidController {
            id: (*id).to_string(),
            max: n_controllers,
        })?;

    let pressure = value
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
        .ok_or_else(|| LineError::InvalidPressure((*value).to_string()))?;

    let min = bounds.min_pressure(controller);
    let max = bounds.max_pressure(controller);
    if pressure < min || pressure > max {
        return Err(LineError::PressureOutOfBounds((*value).to_string()));
    }

    // Known limitation: this is only a true normalization when `min` is 0.
    // Controllers with a negative (vacuum) range get a skewed setpoint.
    let setpoint = min + pressure / max;

    Ok(RoutineStep::Pressure {
        controller,
        value: pressure,
        setpoint,
    })
}

fn parse_wait(args: &[&str]) -> Result<RoutineStep, LineError> {
    let (amount, unit) = match args {
        [amount] => (*amount, None),
        [amount, unit] => (*amount, Some(*unit)),
        _ => {
            return Err(LineError::ArgumentCount {
                keyword: "wait",
                expected: "2 or 3",
                example: "wait 2 min",
            })
        }
    };

    let time = amount
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .ok_or_else(|| LineError::WaitTime(amount.to_string()))?;

    Ok(RoutineStep::Wait {
        seconds: time * unit.map_or(1.0, unit_multiplier),
    })
}

/// Seconds per unit. Anything unrecognized counts as seconds.
pub fn unit_multiplier(unit: &str) -> f64 {
    match unit {
        "ms" | "millisecond" | "milliseconds" | "msec" => 0.001,
        "min" | "mins" | "minute" | "minutes" => 60.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600.0,
        _ => 1.0,
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use link_protocol::ComponentRegistry;

    fn registry() -> ComponentRegistry {
        ComponentRegistry::default().with_pressure_range(ControllerId::new(1).unwrap(), 0.0, 10.0)
    }

    fn step(line: &str) -> RoutineStep {
        parse_line(line, &registry()).unwrap().unwrap().step
    }

    fn error(line: &str) -> LineError {
        parse_line(line, &registry()).unwrap_err()
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(parse_line("", &registry()).unwrap(), None);
        assert_eq!(parse_line("   \t ", &registry()).unwrap(), None);
        assert_eq!(parse_line("# valve 1 open", &registry()).unwrap(), None);
    }

    #[test]
    fn test_valve_lines() {
        assert_eq!(
            step("valve 12 open"),
            RoutineStep::Valve {
                target: ValveTarget::One(ValveId::new(12).unwrap()),
                open: true
            }
        );
        assert_eq!(
            step("valve all close"),
            RoutineStep::Valve {
                target: ValveTarget::All,
                open: false
            }
        );
    }

    #[test]
    fn test_text_is_normalized() {
        let parsed = parse_line("  valve   3\topen  # inlet", &registry())
            .unwrap()
            .unwrap();
        assert_eq!(parsed.text, "valve 3 open");
    }

    #[test]
    fn test_valve_errors() {
        assert!(matches!(error("valve 1"), LineError::ArgumentCount { .. }));
        assert_eq!(
            error("valve 0 open"),
            LineError::InvalidValve {
                id: "0".into(),
                max: 32
            }
        );
        assert!(matches!(error("valve 33 open"), LineError::InvalidValve { .. }));
        assert!(matches!(error("valve x open"), LineError::InvalidValve { .. }));
        assert_eq!(error("valve 3 ajar"), LineError::ValveState("ajar".into()));
    }

    #[test]
    fn test_valve_limit_follows_bounds() {
        let small = ComponentRegistry {
            valves: 8,
            ..ComponentRegistry::default()
        };
        assert!(parse_line("valve 9 open", &small).is_err());
        assert!(parse_line("valve 8 open", &small).unwrap().is_some());
    }

    #[test]
    fn test_pressure_rescale() {
        match step("pressure 1 5") {
            RoutineStep::Pressure {
                controller,
                value,
                setpoint,
            } => {
                assert_eq!(controller.get(), 1);
                assert_eq!(value, 5.0);
                assert_eq!(setpoint, 0.5);
            }
            other => panic!("Unexpected step: {:?}", other),
        }
    }

    #[test]
    fn test_pressure_rescale_keeps_min_offset() {
        let registry = ComponentRegistry::default().with_pressure_range(
            ControllerId::new(2).unwrap(),
            1.0,
            4.0,
        );
        let parsed = parse_line("pressure 2 2", &registry).unwrap().unwrap();
        assert!(matches!(
            parsed.step,
            RoutineStep::Pressure { setpoint, .. } if setpoint == 1.5
        ));
    }

    #[test]
    fn test_pressure_errors() {
        assert!(matches!(error("pressure 1"), LineError::ArgumentCount { .. }));
        assert!(matches!(error("pressure 4 1"), LineError::InvalidController { .. }));
        assert_eq!(error("pressure 1 -2"), LineError::InvalidPressure("-2".into()));
        assert_eq!(error("pressure 1 abc"), LineError::InvalidPressure("abc".into()));
        assert_eq!(error("pressure 1 NaN"), LineError::InvalidPressure("NaN".into()));
        assert_eq!(
            error("pressure 1 11"),
            LineError::PressureOutOfBounds("11".into())
        );
    }

    #[test]
    fn test_wait_units() {
        let seconds = |line: &str| match step(line) {
            RoutineStep::Wait { seconds } => seconds,
            other => panic!("Unexpected step: {:?}", other),
        };
        assert_eq!(seconds("wait 2"), 2.0);
        assert_eq!(seconds("wait 500 ms"), 0.5);
        assert_eq!(seconds("wait 250 milliseconds"), 0.25);
        assert_eq!(seconds("wait 2 min"), 120.0);
        assert_eq!(seconds("wait 1 minutes"), 60.0);
        assert_eq!(seconds("wait 1.5 h"), 5400.0);
        assert_eq!(seconds("wait 3 fortnights"), 3.0);
    }

    #[test]
    fn test_wait_errors() {
        assert!(matches!(error("wait"), LineError::ArgumentCount { .. }));
        assert!(matches!(error("wait 1 2 3"), LineError::ArgumentCount { .. }));
        assert_eq!(error("wait soon"), LineError::WaitTime("soon".into()));
        assert_eq!(error("wait -1"), LineError::WaitTime("-1".into()));
    }

    #[test]
    fn test_multiplexer_channels_are_opaque() {
        assert_eq!(
            step("multiplexer all"),
            RoutineStep::Multiplexer {
                channel: "all".into()
            }
        );
        assert_eq!(
            step("input B2"),
            RoutineStep::InputMultiplexer {
                channel: "B2".into()
            }
        );
        assert!(matches!(error("input"), LineError::ArgumentCount { .. }));
        assert!(matches!(error("multiplexer 1 2"), LineError::ArgumentCount { .. }));
    }

    #[test]
    fn test_unknown_keyword() {
        assert_eq!(
            error("garbage line"),
            LineError::UnknownCommand("garbage".into())
        );
        // Keywords are case sensitive
        assert!(matches!(error("Valve 1 open"), LineError::UnknownCommand(_)));
    }

    #[test]
    fn test_valve_all_expands_to_every_valve() {
        let registry = ComponentRegistry {
            valves: 4,
            ..ComponentRegistry::default()
        };
        let intents = RoutineStep::Valve {
            target: ValveTarget::All,
            open: true,
        }
        .intents(&registry);
        assert_eq!(intents.len(), 4);
        assert_eq!(
            intents[3],
            ControlIntent::SetValve {
                valve: ValveId::new(4).unwrap(),
                open: true
            }
        );
        assert!(RoutineStep::Wait { seconds: 1.0 }.intents(&registry).is_empty());
    }
}
