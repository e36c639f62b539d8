use futures_channel::mpsc;
use link_protocol::{ActorError, ConnectionStatus, ControlIntent, SystemEvent};

/// Messages accepted by the link actor
///
/// The host UI and the routine worker both talk to the transport through
/// this one queue, so the link actor stays its only writer.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkMessage {
    /// A device control request
    Control(ControlIntent),
    /// Raw bytes received by an external reader (transport collaborator
    /// that pushes instead of being polled)
    InjectData { data: Vec<u8> },
    /// Read one chunk from the transport and dispatch it
    Poll,
    /// Open the transport
    Connect,
    /// Close the transport
    Disconnect,
    /// Connection status decided by the host (e.g. a Bluetooth stack)
    StatusReport(ConnectionStatus),
}

/// Handles for spawning actors
pub struct ActorHandles {
    pub link_rx: mpsc::Receiver<LinkMessage>,
    pub event_tx: mpsc::Sender<SystemEvent>,
}

/// Channel manager for actor communication
///
/// Owns the host side of every channel: a sender into the link actor and
/// the receiver of all [`SystemEvent`]s.
pub struct ChannelManager {
    // Bounded to prevent memory exhaustion under high load
    link_tx: mpsc::Sender<LinkMessage>,

    // Event receiver (NOT cloned, replaced with dummy in Clone impl)
    // Note: Clone creates a disconnected receiver - use take_event_receiver() before cloning
    event_rx: mpsc::Receiver<SystemEvent>,
}

impl Clone for ChannelManager {
    fn clone(&self) -> Self {
        // The real event_rx should be taken with take_event_receiver() before cloning
        let (_dummy_tx, dummy_rx) = mpsc::channel(1);
        Self {
            link_tx: self.link_tx.clone(),
            event_rx: dummy_rx,
        }
    }
}

impl ChannelManager {
    /// Create a new channel manager and actor handles
    ///
    /// Returns (ChannelManager for the host, ActorHandles for spawning actors)
    ///
    /// Channel capacities:
    /// - link_tx: 512 - control intents and read polls (moderate frequency)
    /// - event_tx: 8192 - device and routine events (high frequency telemetry)
    pub fn new() -> (Self, ActorHandles) {
        let (link_tx, link_rx) = mpsc::channel(512);
        let (event_tx, event_rx) = mpsc::channel(8192);

        let handles = ActorHandles { link_rx, event_tx };
        let manager = Self { link_tx, event_rx };

        (manager, handles)
    }

    /// Queue a control intent for the link actor
    pub fn send_intent(&self, intent: ControlIntent) -> Result<(), ActorError> {
        self.send(LinkMessage::Control(intent))
    }

    /// Queue any message for the link actor without blocking
    pub fn send(&self, msg: LinkMessage) -> Result<(), ActorError> {
        self.link_tx.clone().try_send(msg).map_err(|e| {
            if e.is_full() {
                ActorError::Other("System overloaded: link queue full".into())
            } else {
                ActorError::ChannelClosed("LinkActor has shut down".into())
            }
        })
    }

    /// Get mutable reference to event receiver
    pub fn event_receiver(&mut self) -> &mut mpsc::Receiver<SystemEvent> {
        &mut self.event_rx
    }

    /// Take ownership of event receiver
    ///
    /// The receiver should only be taken once; later calls return a closed one.
    pub fn take_event_receiver(&mut self) -> mpsc::Receiver<SystemEvent> {
        let (_new_tx, new_rx) = mpsc::channel(1);
        std::mem::replace(&mut self.event_rx, new_rx)
    }

    /// Clone of the link sender, handed to the routine controller
    pub fn link_sender(&self) -> mpsc::Sender<LinkMessage> {
        self.link_tx.clone()
    }
}

impl Default for ChannelManager {
    fn default() -> Self {
        Self::new().0
    }
}
