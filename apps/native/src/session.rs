//! Runs one routine against a transport until it finishes.
//!
//! Threads:
//! - main: the link actor (sole owner of the transport)
//! - routine worker, spawned by `RoutineController::begin`
//! - poller: asks the link actor to read the transport every `POLL_INTERVAL`
//! - printer: writes every event to stdout as JSON

use actor_runtime::{Actor, ChannelManager, LinkMessage};
use anyhow::{anyhow, Result};
use connection_actors::LinkActor;
use core_types::Transport;
use futures::executor::{block_on, block_on_stream};
use link_protocol::{ComponentBounds, RunStatus};
use routine::{RoutineController, RoutineReport};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How a run ended
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub report: RoutineReport,
}

pub fn run_routine<T: Transport + 'static>(
    transport: T,
    bounds: Arc<dyn ComponentBounds>,
    path: &Path,
) -> Result<RunOutcome> {
    let (mut manager, handles) = ChannelManager::new();
    let link = LinkActor::new(transport, handles.event_tx.clone());
    manager.send(LinkMessage::Connect)?;

    let mut controller =
        RoutineController::new(bounds, manager.link_sender(), handles.event_tx.clone());
    controller.load_file(path)?;
    let errors = controller.validate()?;
    if errors > 0 {
        log::warn!("{} line(s) with errors will be skipped", errors);
    }
    controller.begin()?;
    log::info!(
        "Running {} ({} steps, {:.1} s of waits)",
        controller.name(),
        controller.number_of_steps(),
        controller.total_wait_time()
    );

    let done = Arc::new(AtomicBool::new(false));

    let poller = {
        let done = done.clone();
        let mut link_tx = manager.link_sender();
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                // A full queue just skips a poll
                if let Err(e) = link_tx.try_send(LinkMessage::Poll) {
                    if e.is_disconnected() {
                        break;
                    }
                }
                thread::sleep(POLL_INTERVAL);
            }
        })
    };

    let worker = {
        let done = done.clone();
        thread::spawn(move || {
            let result = controller.join().map(|()| RunOutcome {
                status: controller.status(),
                report: controller.report(),
            });
            done.store(true, Ordering::Release);
            result
        })
    };

    let events = manager.take_event_receiver();
    let printer = thread::spawn(move || {
        for event in block_on_stream(events) {
            match serde_json::to_string(&event) {
                Ok(json) => println!("{}", json),
                Err(e) => log::warn!("Could not print event {:?}: {}", event, e),
            }
        }
    });

    // Link sender held by the manager; the actor stops once the worker and
    // poller drop theirs
    drop(manager);
    block_on(link.run(handles.link_rx, handles.event_tx));

    let outcome = worker
        .join()
        .map_err(|_| anyhow!("routine thread panicked"))??;
    poller
        .join()
        .map_err(|_| anyhow!("poll thread panicked"))?;
    printer
        .join()
        .map_err(|_| anyhow!("event printer panicked"))?;

    log::info!(
        "{} after {:.0}% of the wait time, {} line error(s)",
        outcome.status.status_text(),
        outcome.report.wait_progress() * 100.0,
        outcome.report.error_count()
    );
    Ok(outcome)
}
