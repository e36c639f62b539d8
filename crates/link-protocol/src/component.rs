//! Addressable hardware components and their configured bounds.
//!
//! Valves, pumps and pressure controllers each get their own 1-indexed id
//! type, so a pump number can never be passed where a valve is expected.

use crate::errors::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! component_id {
    ($(#[$meta:meta])* $name:ident, $max:expr, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "u8", into = "u8")]
        pub struct $name(u8);

        impl $name {
            /// Highest id the hardware protocol can address.
            pub const MAX: u8 = $max;

            /// Returns `None` for 0 and anything above `MAX`.
            pub fn new(number: u8) -> Option<Self> {
                (1..=Self::MAX).contains(&number).then_some(Self(number))
            }

            pub fn get(self) -> u8 {
                self.0
            }

            /// Ids `1..=count`, with `count` clamped to `MAX`.
            pub fn range(count: u8) -> impl Iterator<Item = Self> {
                (1..=count.min(Self::MAX)).map(Self)
            }
        }

        impl TryFrom<u8> for $name {
            type Error = ProtocolError;

            fn try_from(number: u8) -> Result<Self, ProtocolError> {
                Self::new(number).ok_or(ProtocolError::InvalidComponent {
                    kind: $label,
                    id: number,
                    max: Self::MAX,
                })
            }
        }

        impl From<$name> for u8 {
            fn from(id: $name) -> u8 {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", $label, self.0)
            }
        }
    };
}

component_id!(
    /// Valve number, 1 to 32.
    ValveId,
    32,
    "valve"
);
component_id!(
    /// Pump number, 1 to 2.
    PumpId,
    2,
    "pump"
);
component_id!(
    /// Pressure controller number, 1 to 3.
    ControllerId,
    3,
    "pressure controller"
);

/// Target of a valve instruction: a single valve or every configured valve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValveTarget {
    One(ValveId),
    All,
}

/// Pressure range of one controller, in the controller's own units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureRange {
    pub min: f64,
    pub max: f64,
}

impl Default for PressureRange {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

/// Queryable hardware bounds.
///
/// The routine interpreter only ever sees this trait; where the numbers come
/// from (config file, device query, test fixture) is up to the host.
pub trait ComponentBounds: Send + Sync {
    fn n_valves(&self) -> u8;
    fn n_pumps(&self) -> u8;
    fn n_pressure_controllers(&self) -> u8;
    fn min_pressure(&self, controller: ControllerId) -> f64;
    fn max_pressure(&self, controller: ControllerId) -> f64;
}

/// Persisted component configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentRegistry {
    pub valves: u8,
    pub pumps: u8,
    pub pressure_controllers: u8,
    /// One entry per controller, in controller order. Missing entries use `[0, 1]`.
    pub pressure_ranges: Vec<PressureRange>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self {
            valves: ValveId::MAX,
            pumps: PumpId::MAX,
            pressure_controllers: ControllerId::MAX,
            pressure_ranges: vec![PressureRange::default(); usize::from(ControllerId::MAX)],
        }
    }
}

impl ComponentRegistry {
    /// Load from JSON and check it against the protocol limits.
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        let registry: Self = serde_json::from_str(json)
            .map_err(|e| ProtocolError::Config(format!("Failed to parse component config: {}", e)))?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        let limits = [
            ("valves", self.valves, ValveId::MAX),
            ("pumps", self.pumps, PumpId::MAX),
            (
                "pressure_controllers",
                self.pressure_controllers,
                ControllerId::MAX,
            ),
        ];
        for (field, value, max) in limits {
            if value > max {
                return Err(ProtocolError::Config(format!(
                    "{} = {} exceeds the protocol limit of {}",
                    field, value, max
                )));
            }
        }
        for (i, range) in self.pressure_ranges.iter().enumerate() {
            if range.min.is_nan() || range.max.is_nan() || range.min > range.max {
                return Err(ProtocolError::Config(format!(
                    "pressure_ranges[{}]: min {} must not exceed max {}",
                    i, range.min, range.max
                )));
            }
        }
        Ok(())
    }

    /// Replace the range of one controller, growing the table if needed.
    pub fn with_pressure_range(mut self, controller: ControllerId, min: f64, max: f64) -> Self {
        let index = usize::from(controller.get() - 1);
        if self.pressure_ranges.len() <= index {
            self.pressure_ranges
                .resize(index + 1, PressureRange::default());
        }
        if let Some(range) = self.pressure_ranges.get_mut(index) {
            *range = PressureRange { min, max };
        }
        self
    }

    fn range(&self, controller: ControllerId) -> PressureRange {
        self.pressure_ranges
            .get(usize::from(controller.get() - 1))
            .copied()
            .unwrap_or_default()
    }
}

impl ComponentBounds for ComponentRegistry {
    fn n_valves(&self) -> u8 {
        self.valves
    }

    fn n_pumps(&self) -> u8 {
        self.pumps
    }

    fn n_pressure_controllers(&self) -> u8 {
        self.pressure_controllers
    }

    fn min_pressure(&self, controller: ControllerId) -> f64 {
        self.range(controller).min
    }

    fn max_pressure(&self, controller: ControllerId) -> f64 {
        self.range(controller).max
    }
}
