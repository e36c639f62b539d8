use crate::{actor_debug, actor_error, actor_warn};
use futures::stream::StreamExt;
use futures_channel::mpsc;
use link_protocol::{ActorError, SystemEvent};

/// Actor trait for implementing message-driven components
///
/// Actors are independent, stateful components that communicate through
/// message passing. Each actor has its own message queue and processes
/// messages sequentially.
///
/// # Lifecycle
///
/// 1. **init()** - Called once before message processing starts
/// 2. **handle()** - Called for each received message
/// 3. **shutdown()** - Called when the actor is stopping
///
/// # Example
///
/// ```ignore
/// struct MyActor {
///     state: u32,
///     event_tx: mpsc::Sender<SystemEvent>,
/// }
///
/// impl Actor for MyActor {
///     type Message = MyMessage;
///
///     fn name(&self) -> &'static str {
///         "MyActor"
///     }
///
///     async fn handle(&mut self, msg: Self::Message) -> Result<(), ActorError> {
///         // Process message
///         Ok(())
///     }
/// }
/// ```
#[allow(async_fn_in_trait)]
pub trait Actor: Send + 'static {
    /// Message type this actor processes
    type Message: Send + 'static;

    /// Actor name (used for logging and debugging)
    fn name(&self) -> &'static str;

    /// Initialize the actor before processing messages
    async fn init(&mut self) -> Result<(), ActorError> {
        Ok(())
    }

    /// Handle a single message
    ///
    /// Messages are processed sequentially in the order received.
    async fn handle(&mut self, msg: Self::Message) -> Result<(), ActorError>;

    /// Clean up before shutdown
    async fn shutdown(&mut self) {}

    /// Main actor run loop (provided by runtime)
    ///
    /// Consumes the actor and runs it until every sender of `rx` is dropped.
    /// Errors from `init` or `handle` are published on `event_tx` and never
    /// end the loop early, except a failed `init`.
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<Self::Message>,
        event_tx: mpsc::Sender<SystemEvent>,
    ) where
        Self: Sized,
    {
        if let Err(e) = self.init().await {
            actor_error!("{} init failed: {}", self.name(), e);
            let _ = event_tx.clone().try_send(SystemEvent::Error {
                message: format!("{} init failed: {}", self.name(), e),
            });
            return;
        }

        actor_debug!("{} started", self.name());

        while let Some(msg) = rx.next().await {
            if let Err(e) = self.handle(msg).await {
                actor_warn!("{} error: {}", self.name(), e);
                let _ = event_tx.clone().try_send(SystemEvent::Error {
                    message: format!("{} error: {}", self.name(), e),
                });
            }
        }

        self.shutdown().await;

        actor_debug!("{} stopped", self.name());
    }
}
