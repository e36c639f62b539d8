//! Threaded runs: pause, resume, stop and wake against a live worker.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use actor_runtime::LinkMessage;
use futures_channel::mpsc;
use link_protocol::{
    ComponentRegistry, ControlIntent, ControllerId, RunStatus, SystemEvent, ValveId,
};
use routine::{RoutineController, RoutineError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

struct Fixture {
    controller: RoutineController,
    events: mpsc::Receiver<SystemEvent>,
    intents: mpsc::Receiver<LinkMessage>,
}

fn fixture(lines: &[&str]) -> Fixture {
    let registry = ComponentRegistry {
        valves: 4,
        ..ComponentRegistry::default()
    }
    .with_pressure_range(ControllerId::new(1).unwrap(), 0.0, 10.0);
    let (intent_tx, intents) = mpsc::channel(128);
    let (event_tx, events) = mpsc::channel(512);
    let mut controller = RoutineController::new(Arc::new(registry), intent_tx, event_tx);
    controller.load("test", lines.iter().copied()).unwrap();
    Fixture {
        controller,
        events,
        intents,
    }
}

fn drain<T>(rx: &mut mpsc::Receiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Ok(Some(item)) = rx.try_next() {
        items.push(item);
    }
    items
}

fn wait_for_status(controller: &RoutineController, status: RunStatus) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while controller.status() != status {
        assert!(
            Instant::now() < deadline,
            "timed out waiting for {:?}, still {:?}",
            status,
            controller.status()
        );
        thread::sleep(Duration::from_millis(5));
    }
}

fn statuses(events: &[SystemEvent]) -> Vec<RunStatus> {
    events
        .iter()
        .filter_map(|e| match e {
            SystemEvent::RunStatusChanged { status } => Some(*status),
            _ => None,
        })
        .collect()
}

fn controls(messages: Vec<LinkMessage>) -> Vec<ControlIntent> {
    messages
        .into_iter()
        .map(|m| match m {
            LinkMessage::Control(intent) => intent,
            other => panic!("Unexpected link message: {:?}", other),
        })
        .collect()
}

#[test]
fn test_run_emits_intents_in_order() {
    let mut f = fixture(&[
        "valve 2 open",
        "pressure 1 5",
        "bad line",
        "multiplexer 4",
        "input A",
        "wait 10 ms",
        "valve all close",
    ]);
    drain(&mut f.events);

    f.controller.begin().unwrap();
    f.controller.join().unwrap();
    assert_eq!(f.controller.status(), RunStatus::Finished);

    let mut expected = vec![
        ControlIntent::SetValve {
            valve: ValveId::new(2).unwrap(),
            open: true,
        },
        ControlIntent::SetPressure {
            controller: ControllerId::new(1).unwrap(),
            setpoint: 0.5,
        },
        ControlIntent::SetMultiplexer {
            channel: "4".into(),
        },
        ControlIntent::SetInputMultiplexer {
            channel: "A".into(),
        },
    ];
    expected.extend(ValveId::range(4).map(|valve| ControlIntent::SetValve { valve, open: false }));
    assert_eq!(controls(drain(&mut f.intents)), expected);

    let events = drain(&mut f.events);
    let steps: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            SystemEvent::CurrentStepChanged { step } => Some(*step),
            _ => None,
        })
        .collect();
    assert_eq!(steps, vec![0, 1, 2, 3, 4, 5]);
    assert!(events.contains(&SystemEvent::RoutineError {
        message: "Line 3: unknown command \"bad\"".into()
    }));
    assert!(events.iter().any(|e| matches!(
        e,
        SystemEvent::ElapsedTimeChanged { seconds } if (seconds - 0.01).abs() < 1e-9
    )));
    assert_eq!(statuses(&events), vec![RunStatus::Running, RunStatus::Finished]);
    assert_eq!(events.last(), Some(&SystemEvent::RoutineFinished));
    assert_eq!(f.controller.current_step(), None);
}

#[test]
fn test_wake_cuts_wait_short() {
    let mut f = fixture(&["wait 10", "valve 1 open"]);
    let started = Instant::now();
    f.controller.begin().unwrap();

    // A wake sent before the worker starts waiting is not remembered
    while f.controller.status() == RunStatus::Running && started.elapsed() < Duration::from_secs(5) {
        thread::sleep(Duration::from_millis(20));
        f.controller.wake();
    }
    f.controller.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(f.controller.status(), RunStatus::Finished);
    // Elapsed time still advances by the full step
    assert_eq!(f.controller.elapsed_time(), 10.0);
    assert_eq!(controls(drain(&mut f.intents)).len(), 1);
}

#[test]
fn test_pause_then_resume() {
    let mut f = fixture(&["wait 10", "valve 3 close"]);
    drain(&mut f.events);
    f.controller.begin().unwrap();

    thread::sleep(Duration::from_millis(50));
    f.controller.pause();
    wait_for_status(&f.controller, RunStatus::Paused);
    assert_eq!(f.controller.current_step(), Some(0));
    assert!(drain(&mut f.intents).is_empty());

    f.controller.resume();
    f.controller.join().unwrap();

    let events = drain(&mut f.events);
    assert_eq!(
        statuses(&events),
        vec![
            RunStatus::Running,
            RunStatus::Paused,
            RunStatus::Running,
            RunStatus::Finished
        ]
    );
    let paused = events.iter().position(|e| *e == SystemEvent::RoutinePaused);
    let resumed = events.iter().position(|e| *e == SystemEvent::RoutineResumed);
    assert!(paused.is_some() && paused < resumed);
    assert_eq!(
        controls(drain(&mut f.intents)),
        vec![ControlIntent::SetValve {
            valve: ValveId::new(3).unwrap(),
            open: false
        }]
    );
}

#[test]
fn test_stop_while_paused_ends_stopped() {
    let mut f = fixture(&["wait 10", "valve 1 open"]);
    drain(&mut f.events);
    f.controller.begin().unwrap();

    thread::sleep(Duration::from_millis(50));
    f.controller.pause();
    wait_for_status(&f.controller, RunStatus::Paused);

    f.controller.stop();
    f.controller.join().unwrap();

    assert_eq!(f.controller.status(), RunStatus::Stopped);
    let events = drain(&mut f.events);
    assert_eq!(
        statuses(&events),
        vec![RunStatus::Running, RunStatus::Paused, RunStatus::Stopped]
    );
    assert!(events.contains(&SystemEvent::RoutineStopped));
    assert!(!events.contains(&SystemEvent::RoutineFinished));
    assert!(!events.contains(&SystemEvent::RoutineResumed));
    assert!(drain(&mut f.intents).is_empty());
}

#[test]
fn test_stop_during_wait() {
    let mut f = fixture(&["wait 1 h", "valve 1 open"]);
    f.controller.begin().unwrap();

    thread::sleep(Duration::from_millis(50));
    f.controller.stop();
    f.controller.join().unwrap();

    assert_eq!(f.controller.status(), RunStatus::Stopped);
    assert!(drain(&mut f.intents).is_empty());
}

#[test]
fn test_begin_guards() {
    let mut f = fixture(&["wait 1 h"]);
    f.controller.begin().unwrap();

    assert!(matches!(
        f.controller.begin(),
        Err(RoutineError::AlreadyRunning)
    ));
    assert!(matches!(
        f.controller.validate(),
        Err(RoutineError::AlreadyRunning)
    ));
    assert!(matches!(
        f.controller.load("other", ["wait 1"]),
        Err(RoutineError::AlreadyRunning)
    ));

    f.controller.stop();
    f.controller.join().unwrap();

    // A stopped routine can run again
    f.controller.load("short", ["wait 1 ms"]).unwrap();
    f.controller.begin().unwrap();
    f.controller.join().unwrap();
    assert_eq!(f.controller.status(), RunStatus::Finished);
    f.controller.begin().unwrap();
    f.controller.join().unwrap();
    assert_eq!(f.controller.status(), RunStatus::Finished);
}

#[test]
fn test_drop_stops_worker() {
    let f = fixture(&["wait 1 h"]);
    let Fixture {
        mut controller,
        mut intents,
        ..
    } = f;
    controller.begin().unwrap();
    let started = Instant::now();
    drop(controller);
    assert!(started.elapsed() < Duration::from_secs(5));
    // Controller and worker are gone, so the link queue is closed
    assert!(matches!(intents.try_next(), Ok(None)));
}
