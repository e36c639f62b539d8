use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Fluidics controller host", long_about = None)]
pub struct Cli {
    /// Component configuration (JSON). Defaults to 32 valves, 2 pumps,
    /// 3 controllers with range [0, 1].
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// More log output (repeat for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a routine file and print its steps and errors
    Check {
        #[arg(value_name = "ROUTINE")]
        routine: PathBuf,
    },
    /// Print the frame for one control command
    Encode {
        #[command(subcommand)]
        command: EncodeCommand,
    },
    /// Decode frames received from the device (hex bytes)
    Decode {
        #[arg(value_name = "HEX", required = true)]
        bytes: Vec<String>,
    },
    /// Run a routine against an in-memory device and print the frames sent
    Simulate {
        #[arg(value_name = "ROUTINE")]
        routine: PathBuf,
    },
    /// Run a routine on a device attached to a serial port
    #[cfg(feature = "serial")]
    Run {
        #[arg(value_name = "ROUTINE")]
        routine: PathBuf,
        #[arg(long, value_name = "PATH")]
        port: String,
        #[arg(long, default_value_t = 115_200)]
        baud: u32,
    },
    /// List serial ports
    #[cfg(feature = "serial")]
    Ports,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnOff {
    Open,
    Close,
    On,
    Off,
}

impl OnOff {
    pub fn is_on(self) -> bool {
        matches!(self, Self::Open | Self::On)
    }
}

#[derive(Debug, Subcommand)]
pub enum EncodeCommand {
    Valve { id: u8, state: OnOff },
    Pump { id: u8, state: OnOff },
    /// Setpoint as a fraction of the controller range, 0 to 1
    Pressure { id: u8, setpoint: f64 },
    Status,
}
