use actor_runtime::{actor_debug, actor_warn};
use futures_channel::mpsc;
use link_protocol::{ConnectionStatus, SystemEvent};

/// Connection State Machine
///
/// Only the host moves it (`set_status`); there are no timers and no
/// transitions derived from decoder activity. Observers hear about a status
/// exactly once per change.
///
/// See `link-protocol/src/state.rs` for the state diagram.
pub struct StatusMachine {
    status: ConnectionStatus,
    event_tx: mpsc::Sender<SystemEvent>,
}

impl StatusMachine {
    pub fn new(event_tx: mpsc::Sender<SystemEvent>) -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            event_tx,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn status_text(&self) -> &'static str {
        self.status.status_text()
    }

    /// Move to `new`. Returns `false` and stays silent if nothing changed.
    pub fn set_status(&mut self, new: ConnectionStatus) -> bool {
        if new == self.status {
            return false;
        }

        actor_debug!("Connection: {:?} → {:?}", self.status, new);
        self.status = new;

        if let Err(e) = self
            .event_tx
            .clone()
            .try_send(SystemEvent::ConnectionStatusChanged { status: new })
        {
            actor_warn!("Connection status event dropped: {:?}", e);
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use futures::stream::StreamExt;

    #[tokio::test]
    async fn test_notifies_on_change_only() {
        let (event_tx, event_rx) = mpsc::channel(16);
        let mut machine = StatusMachine::new(event_tx);

        assert!(!machine.set_status(ConnectionStatus::Disconnected));
        assert!(machine.set_status(ConnectionStatus::Connecting));
        assert!(!machine.set_status(ConnectionStatus::Connecting));
        assert!(machine.set_status(ConnectionStatus::Connected));
        assert!(machine.set_status(ConnectionStatus::Disconnected));
        drop(machine);

        let events: Vec<_> = event_rx.collect().await;
        assert_eq!(
            events,
            vec![
                SystemEvent::ConnectionStatusChanged {
                    status: ConnectionStatus::Connecting
                },
                SystemEvent::ConnectionStatusChanged {
                    status: ConnectionStatus::Connected
                },
                SystemEvent::ConnectionStatusChanged {
                    status: ConnectionStatus::Disconnected
                },
            ]
        );
    }

    #[test]
    fn test_status_text() {
        let (event_tx, _event_rx) = mpsc::channel(4);
        let mut machine = StatusMachine::new(event_tx);
        assert_eq!(machine.status_text(), "Disconnected");
        machine.set_status(ConnectionStatus::Connected);
        assert_eq!(machine.status(), ConnectionStatus::Connected);
        assert_eq!(machine.status_text(), "Connected");
    }

    #[test]
    fn test_closed_observer_does_not_block_transition() {
        let (event_tx, event_rx) = mpsc::channel(4);
        drop(event_rx);
        let mut machine = StatusMachine::new(event_tx);
        assert!(machine.set_status(ConnectionStatus::Connecting));
        assert_eq!(machine.status(), ConnectionStatus::Connecting);
    }
}
