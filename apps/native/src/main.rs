mod cli;
mod hex;
mod session;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands, EncodeCommand};
use core_types::Frame;
use dispatch::{log_device_message, CommandDispatcher};
use env_logger::Env;
use framing::{DelimitedFramer, Framer};
use futures::channel::mpsc;
use link_protocol::{
    Command, ComponentBounds, ComponentRegistry, ControllerId, DeviceEvent, Message, PumpId,
    RunStatus, ValveId,
};
use routine::RoutineController;
use std::path::Path;
use std::sync::Arc;
use transport_native::MemoryTransport;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let registry = load_registry(cli.config.as_deref())?;

    match cli.command {
        Commands::Check { routine } => check(Arc::new(registry), &routine),
        Commands::Encode { command } => encode(command),
        Commands::Decode { bytes } => decode(&bytes),
        Commands::Simulate { routine } => simulate(Arc::new(registry), &routine),
        #[cfg(feature = "serial")]
        Commands::Run {
            routine,
            port,
            baud,
        } => {
            let transport = transport_native::SerialTransport::new(port, baud);
            finish(session::run_routine(transport, Arc::new(registry), &routine)?.status)
        }
        #[cfg(feature = "serial")]
        Commands::Ports => {
            for port in transport_native::SerialTransport::available_ports()? {
                println!("{}", port);
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();
}

fn load_registry(path: Option<&Path>) -> Result<ComponentRegistry> {
    let Some(path) = path else {
        return Ok(ComponentRegistry::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading component configuration {}", path.display()))?;
    let registry = ComponentRegistry::from_json(&json)
        .with_context(|| format!("parsing component configuration {}", path.display()))?;
    registry.validate()?;
    log::debug!("Loaded component configuration from {}", path.display());
    Ok(registry)
}

fn check(bounds: Arc<dyn ComponentBounds>, path: &Path) -> Result<()> {
    // Validation never sends intents, so nothing needs the receiving ends
    let (intent_tx, _intent_rx) = mpsc::channel(1);
    let (event_tx, _event_rx) = mpsc::channel(64);
    let mut controller = RoutineController::new(bounds, intent_tx, event_tx);
    controller.load_file(path)?;
    let errors = controller.validate()?;

    println!("{}", controller.name());
    for (index, step) in controller.steps().iter().enumerate() {
        println!("  {:>3}  {}", index + 1, step);
    }
    println!(
        "{} steps, {:.3} s of waits",
        controller.number_of_steps(),
        controller.total_wait_time()
    );
    for error in controller.errors() {
        eprintln!("{}", error);
    }

    if errors > 0 {
        bail!("{} line(s) with errors", errors);
    }
    Ok(())
}

fn encode(command: EncodeCommand) -> Result<()> {
    let message = match command {
        EncodeCommand::Valve { id, state } => Message::set_valve(ValveId::try_from(id)?, state.is_on()),
        EncodeCommand::Pump { id, state } => Message::set_pump(PumpId::try_from(id)?, state.is_on()),
        EncodeCommand::Pressure { id, setpoint } => {
            Message::set_pressure(ControllerId::try_from(id)?, setpoint)?
        }
        EncodeCommand::Status => Message::request_status(),
    };
    let bytes = framing::encode(message.command.as_byte(), &message.parameter_slices())?;
    println!("{}", hex::format(&bytes));
    Ok(())
}

fn decode(tokens: &[String]) -> Result<()> {
    let bytes = hex::parse(tokens)?;
    for event in decode_events(&bytes) {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

/// Device events in arrival order. Bad frames are logged and skipped.
fn decode_events(bytes: &[u8]) -> Vec<DeviceEvent> {
    let mut framer = DelimitedFramer::new(Command::COUNT);
    let dispatcher = CommandDispatcher::new();
    let mut events = Vec::new();
    for frame in framer.push(bytes) {
        match dispatcher.dispatch(&frame) {
            Ok(decoded) => {
                for event in decoded {
                    if let DeviceEvent::Log { level, message } = &event {
                        log_device_message(*level, message);
                    }
                    events.push(event);
                }
            }
            Err(e) => log::warn!("Discarded frame {}: {}", describe(&frame), e),
        }
    }
    if framer.is_recording() {
        log::warn!("Input ends inside a frame (no STOP byte)");
    }
    events
}

/// Command name plus the raw body, e.g. `VALVE [00 01 05]`.
fn describe(frame: &Frame) -> String {
    let command = frame
        .tag()
        .and_then(Command::from_byte)
        .map_or("Empty", Command::name);
    format!("{} [{}]", command, hex::format(&frame.bytes))
}

fn simulate(bounds: Arc<dyn ComponentBounds>, path: &Path) -> Result<()> {
    let (transport, device) = MemoryTransport::new();
    let outcome = session::run_routine(transport, bounds, path)?;
    for frame in device.written() {
        println!("{}", hex::format(&frame));
    }
    finish(outcome.status)
}

fn finish(status: RunStatus) -> Result<()> {
    match status {
        RunStatus::Finished => Ok(()),
        other => Err(anyhow!("routine ended as {}", other.status_text())),
    }
}
