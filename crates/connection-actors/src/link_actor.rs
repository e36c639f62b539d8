use actor_runtime::{actor_debug, actor_error, actor_info, actor_warn, Actor, LinkMessage};
use core_types::Transport;
use dispatch::{log_device_message, CommandDispatcher};
use framing::{DelimitedFramer, Framer};
use futures_channel::mpsc;
use link_protocol::{
    ActorError, Command, ConnectionStatus, ControlIntent, DeviceEvent, SystemEvent,
};

use crate::status_machine::StatusMachine;

/// LinkActor owns the connection to the microcontroller
///
/// Responsibilities:
/// - Encode control intents (from the host or a routine) into frames and
///   write them; nothing else in the system touches the transport
/// - Decode incoming bytes, dispatch them and publish device events
/// - Track connection status
///
/// Bytes arrive either by polling the transport (`LinkMessage::Poll`) or by
/// an external reader pushing them (`LinkMessage::InjectData`).
pub struct LinkActor<T: Transport> {
    transport: T,
    framer: DelimitedFramer,
    dispatcher: CommandDispatcher,
    status: StatusMachine,
    event_tx: mpsc::Sender<SystemEvent>,
}

impl<T: Transport> LinkActor<T> {
    pub fn new(transport: T, event_tx: mpsc::Sender<SystemEvent>) -> Self {
        Self {
            transport,
            framer: DelimitedFramer::new(Command::COUNT),
            dispatcher: CommandDispatcher::new(),
            status: StatusMachine::new(event_tx.clone()),
            event_tx,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.status()
    }

    /// Send an event to observers
    ///
    /// Failures are logged but don't propagate; a slow UI must not stall
    /// the link.
    fn publish(&self, event: SystemEvent) {
        if let Err(e) = self.event_tx.clone().try_send(event) {
            actor_warn!("Event dropped: {:?}", e);
        }
    }

    async fn handle_connect(&mut self) -> Result<(), ActorError> {
        if self.status.status().is_connected() {
            return Ok(());
        }
        self.status.set_status(ConnectionStatus::Connecting);
        match self.transport.connect().await {
            Ok(()) => {
                actor_info!(
                    "Connected over {} ({} framing)",
                    self.transport.name(),
                    self.framer.name()
                );
                // A partial frame from an earlier session is never completed
                self.framer.reset();
                self.status.set_status(ConnectionStatus::Connected);
                Ok(())
            }
            Err(e) => {
                self.status.set_status(ConnectionStatus::Disconnected);
                Err(ActorError::Transport(e.to_string()))
            }
        }
    }

    async fn handle_disconnect(&mut self) -> Result<(), ActorError> {
        let result = self.transport.close().await;
        self.status.set_status(ConnectionStatus::Disconnected);
        result.map_err(|e| ActorError::Transport(e.to_string()))
    }

    /// Turn one intent into bytes on the wire
    ///
    /// Invalid intents (e.g. a pressure setpoint outside `[0, 1]`) are
    /// rejected before anything is written.
    pub async fn send_intent(&mut self, intent: ControlIntent) -> Result<(), ActorError> {
        let message = match intent.to_message()? {
            Some(message) => message,
            None => {
                match intent {
                    ControlIntent::SetMultiplexer { channel } => {
                        self.publish(SystemEvent::MultiplexerRequested { channel })
                    }
                    ControlIntent::SetInputMultiplexer { channel } => {
                        self.publish(SystemEvent::InputMultiplexerRequested { channel })
                    }
                    other => actor_debug!("No wire form for {:?}", other),
                }
                return Ok(());
            }
        };

        let bytes = framing::encode(message.command.as_byte(), &message.parameter_slices())
            .map_err(|e| ActorError::Other(e.to_string()))?;

        actor_debug!("Sending {} ({} bytes)", message.command.name(), bytes.len());
        self.transport
            .write(&bytes)
            .await
            .map_err(|e| ActorError::Transport(e.to_string()))
    }

    /// Feed received bytes through the framer and dispatcher
    ///
    /// Returns the number of device events published. Malformed messages are
    /// logged and skipped; they never affect the next message.
    pub fn ingest(&mut self, bytes: &[u8]) -> usize {
        let mut published = 0;
        for frame in self.framer.push(bytes) {
            match self.dispatcher.dispatch(&frame) {
                Ok(events) => {
                    for event in events {
                        if let DeviceEvent::Log { level, message } = &event {
                            log_device_message(*level, message);
                        }
                        self.publish(SystemEvent::Device(event));
                        published += 1;
                    }
                }
                Err(e) => actor_warn!("Dropping message from microcontroller: {}", e),
            }
        }
        published
    }

    async fn handle_poll(&mut self) -> Result<(), ActorError> {
        if !self.status.status().is_connected() {
            return Ok(());
        }
        match self.transport.read_chunk().await {
            Ok(chunk) => {
                if !chunk.is_empty() {
                    self.ingest(&chunk);
                }
                Ok(())
            }
            Err(e) => {
                actor_error!("Read from {} failed: {}", self.transport.name(), e);
                self.status.set_status(ConnectionStatus::Disconnected);
                Err(ActorError::Transport(e.to_string()))
            }
        }
    }
}

impl<T: Transport + 'static> Actor for LinkActor<T> {
    type Message = LinkMessage;

    fn name(&self) -> &'static str {
        "LinkActor"
    }

    async fn handle(&mut self, msg: Self::Message) -> Result<(), ActorError> {
        match msg {
            LinkMessage::Control(intent) => self.send_intent(intent).await,
            LinkMessage::InjectData { data } => {
                self.ingest(&data);
                Ok(())
            }
            LinkMessage::Poll => self.handle_poll().await,
            LinkMessage::Connect => self.handle_connect().await,
            LinkMessage::Disconnect => self.handle_disconnect().await,
            LinkMessage::StatusReport(status) => {
                self.status.set_status(status);
                Ok(())
            }
        }
    }

    async fn shutdown(&mut self) {
        if self.status.status() != ConnectionStatus::Disconnected {
            if let Err(e) = self.transport.close().await {
                actor_warn!("Close on shutdown failed: {}", e);
            }
            self.status.set_status(ConnectionStatus::Disconnected);
        }
    }
}
