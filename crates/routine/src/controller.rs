use crate::errors::{LineError, RoutineError};
use crate::grammar::{parse_line, RoutineStep};
use crate::report::RoutineReport;
use actor_runtime::{actor_debug, actor_info, actor_warn, LinkMessage, RunControl, WakeReason};
use futures::executor::block_on;
use futures::sink::SinkExt;
use futures_channel::mpsc;
use link_protocol::{ComponentBounds, ControlIntent, RunStatus, SystemEvent};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct Routine {
    name: String,
    lines: Vec<String>,
    steps: Vec<RoutineStep>,
    step_texts: Vec<String>,
}

/// State reachable from both the controller and its worker thread
struct Shared {
    bounds: Arc<dyn ComponentBounds>,
    routine: Mutex<Routine>,
    report: Mutex<RoutineReport>,
    status: Mutex<RunStatus>,
    control: RunControl,
    intent_tx: mpsc::Sender<LinkMessage>,
    event_tx: mpsc::Sender<SystemEvent>,
}

impl Shared {
    fn emit(&self, event: SystemEvent) {
        if let Err(e) = self.event_tx.clone().try_send(event) {
            actor_warn!("Routine event dropped: {:?}", e);
        }
    }

    fn status(&self) -> RunStatus {
        *lock(&self.status)
    }

    fn set_status(&self, status: RunStatus) {
        let previous = std::mem::replace(&mut *lock(&self.status), status);
        if previous != status {
            actor_debug!("Routine: {:?} → {:?}", previous, status);
            self.emit(SystemEvent::RunStatusChanged { status });
        }
    }

    /// Hand an intent to the link actor, waiting for queue space.
    fn send_intent(&self, intent: ControlIntent) {
        let mut tx = self.intent_tx.clone();
        if let Err(e) = block_on(tx.send(LinkMessage::Control(intent))) {
            actor_warn!("Routine command dropped: {}", e);
            self.emit(SystemEvent::Error {
                message: format!("Routine command dropped: {}", e),
            });
        }
    }

    fn report_error(&self, line_number: usize, error: &LineError) {
        let message = format!("Line {}: {}", line_number, error);
        actor_warn!("{}", message);
        lock(&self.report).errors.push(message.clone());
        self.emit(SystemEvent::RoutineError { message });
    }

    fn execute(&self, step: &RoutineStep) {
        let index = lock(&self.report).next_step();
        self.emit(SystemEvent::CurrentStepChanged { step: index });

        match step {
            RoutineStep::Wait { seconds } => {
                let duration = Duration::try_from_secs_f64(*seconds).unwrap_or(Duration::MAX);
                let reason = self.control.wait_timeout(duration);
                if reason != WakeReason::Timeout {
                    actor_debug!("Wait at step {} interrupted: {:?}", index, reason);
                }
                // Interrupted waits still count in full.
                let elapsed = {
                    let mut report = lock(&self.report);
                    report.elapsed_wait += seconds;
                    report.elapsed_wait
                };
                self.emit(SystemEvent::ElapsedTimeChanged { seconds: elapsed });
            }
            other => {
                for intent in other.intents(self.bounds.as_ref()) {
                    self.send_intent(intent);
                }
            }
        }
    }

    /// One pass over the loaded lines.
    ///
    /// A dry run only checks lines and rebuilds the step list. A live run
    /// executes them and honours stop and pause requests between lines.
    fn interpret(&self, dry_run: bool) {
        let lines = lock(&self.routine).lines.clone();
        lock(&self.report).begin_pass(dry_run);

        let mut steps = Vec::new();
        let mut texts = Vec::new();
        let mut total_wait = 0.0;
        let mut stopped = false;

        for (index, line) in lines.iter().enumerate() {
            match parse_line(line, self.bounds.as_ref()) {
                Ok(None) => continue,
                Ok(Some(parsed)) if dry_run => {
                    if let RoutineStep::Wait { seconds } = parsed.step {
                        total_wait += seconds;
                    }
                    steps.push(parsed.step);
                    texts.push(parsed.text);
                }
                Ok(Some(parsed)) => self.execute(&parsed.step),
                Err(e) => {
                    // Error lines are not stop or pause points
                    self.report_error(index + 1, &e);
                    continue;
                }
            }

            if dry_run {
                continue;
            }

            match self.control.checkpoint() {
                Some(WakeReason::Stop) => {
                    stopped = true;
                    break;
                }
                Some(_) => {
                    self.set_status(RunStatus::Paused);
                    self.emit(SystemEvent::RoutinePaused);

                    if self.control.wait_while_paused() == WakeReason::Stop {
                        stopped = true;
                        break;
                    }

                    self.set_status(RunStatus::Running);
                    self.emit(SystemEvent::RoutineResumed);
                }
                None => {}
            }
        }

        if dry_run {
            let count = steps.len();
            {
                let mut routine = lock(&self.routine);
                routine.steps = steps;
                routine.step_texts = texts;
            }
            {
                let mut report = lock(&self.report);
                report.total_steps = count;
                report.total_wait = total_wait;
            }
            if count > 0 {
                self.emit(SystemEvent::StepsChanged { count });
            }
            self.emit(SystemEvent::TotalWaitTimeChanged {
                seconds: total_wait,
            });
        } else if stopped {
            actor_info!("Routine stopped");
            self.set_status(RunStatus::Stopped);
            self.emit(SystemEvent::RoutineStopped);
        } else {
            actor_info!("Routine finished");
            self.set_status(RunStatus::Finished);
            self.emit(SystemEvent::RoutineFinished);
        }
    }
}

/// Loads, validates and runs one routine at a time
///
/// ## Run Status
///
/// See `link-protocol/src/state.rs` for the full diagram. `begin` is
/// accepted from `Ready`, `Finished` and `Stopped`; while a run is active,
/// `load`, `validate` and `begin` return [`RoutineError::AlreadyRunning`].
///
/// ## Threading
///
/// `begin` returns immediately; the run executes on a named worker thread
/// whose handle is kept here. `stop`, `pause`, `resume` and `wake` may be
/// called from any thread holding a reference. Dropping the controller
/// stops and joins the worker.
pub struct RoutineController {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl RoutineController {
    /// * `bounds` - component counts and pressure ranges lines are checked against
    /// * `intent_tx` - the link actor's queue; the only way out to the device
    /// * `event_tx` - observers of run status and progress
    pub fn new(
        bounds: Arc<dyn ComponentBounds>,
        intent_tx: mpsc::Sender<LinkMessage>,
        event_tx: mpsc::Sender<SystemEvent>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                bounds,
                routine: Mutex::new(Routine::default()),
                report: Mutex::new(RoutineReport::default()),
                status: Mutex::new(RunStatus::NotReady),
                control: RunControl::new(),
                intent_tx,
                event_tx,
            }),
            worker: None,
        }
    }

    fn ensure_idle(&self) -> Result<(), RoutineError> {
        if self.shared.status().is_active() {
            Err(RoutineError::AlreadyRunning)
        } else {
            Ok(())
        }
    }

    fn clear(&self) {
        *lock(&self.shared.routine) = Routine::default();
        *lock(&self.shared.report) = RoutineReport::default();
        self.shared.control.clear();
    }

    /// Store a routine without checking it. Use [`validate`](Self::validate)
    /// to find errors.
    pub fn load<I, S>(&mut self, name: impl Into<String>, lines: I) -> Result<(), RoutineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_idle()?;
        self.reap_worker()?;
        self.clear();
        {
            let mut routine = lock(&self.shared.routine);
            routine.name = name.into();
            routine.lines = lines.into_iter().map(Into::into).collect();
            actor_info!(
                "Routine {} loaded with {} lines",
                routine.name,
                routine.lines.len()
            );
        }
        self.shared.set_status(RunStatus::Ready);
        Ok(())
    }

    /// Load a UTF-8 text file, one instruction per line. The routine is named
    /// after the file stem.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), RoutineError> {
        self.ensure_idle()?;
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(source) => {
                self.reset();
                return Err(RoutineError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.load(name, contents.lines())
    }

    /// Stop any run and forget the routine
    pub fn reset(&mut self) {
        if self.worker.is_some() {
            self.shared.control.stop();
            if let Err(e) = self.join() {
                actor_warn!("Routine reset: {}", e);
            }
        }
        self.clear();
        self.shared.set_status(RunStatus::NotReady);
    }

    /// Dry run: check every line and rebuild the step list
    ///
    /// Sends nothing to the device and leaves the run status alone.
    /// Returns the number of lines with errors.
    pub fn validate(&self) -> Result<usize, RoutineError> {
        self.ensure_idle()?;
        self.shared.interpret(true);
        Ok(lock(&self.shared.report).error_count())
    }

    /// Start a run on a worker thread and return immediately
    pub fn begin(&mut self) -> Result<(), RoutineError> {
        match self.shared.status() {
            status if status.can_begin() => {}
            RunStatus::NotReady => return Err(RoutineError::NotReady),
            _ => return Err(RoutineError::AlreadyRunning),
        }
        self.reap_worker()?;

        self.shared.control.clear();
        let previous = self.shared.status();
        self.shared.set_status(RunStatus::Running);

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("routine".into())
            .spawn(move || shared.interpret(false));

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.set_status(previous);
                Err(RoutineError::Spawn(e))
            }
        }
    }

    /// Stop after the current step. Releases a pause and interrupts a wait.
    pub fn stop(&self) {
        actor_debug!("Routine stop requested");
        self.shared.control.stop();
    }

    /// Pause after the current step. A wait in progress ends early.
    pub fn pause(&self) {
        actor_debug!("Routine pause requested");
        self.shared.control.pause();
    }

    pub fn resume(&self) {
        actor_debug!("Routine resume requested");
        self.shared.control.resume();
    }

    /// Cut short the wait step in progress, if any
    pub fn wake(&self) {
        self.shared.control.wake();
    }

    /// Block until the current run (if any) has ended
    pub fn join(&mut self) -> Result<(), RoutineError> {
        let result = self.reap_worker();
        if result.is_err() {
            self.shared.set_status(RunStatus::Stopped);
        }
        result
    }

    fn reap_worker(&mut self) -> Result<(), RoutineError> {
        match self.worker.take() {
            Some(handle) => handle.join().map_err(|_| RoutineError::WorkerPanicked),
            None => Ok(()),
        }
    }

    pub fn status(&self) -> RunStatus {
        self.shared.status()
    }

    pub fn name(&self) -> String {
        lock(&self.shared.routine).name.clone()
    }

    /// Every line of the loaded routine, as loaded
    pub fn file_contents(&self) -> Vec<String> {
        lock(&self.shared.routine).lines.clone()
    }

    /// Normalized text of each valid step, from the last validation
    pub fn steps(&self) -> Vec<String> {
        lock(&self.shared.routine).step_texts.clone()
    }

    pub fn parsed_steps(&self) -> Vec<RoutineStep> {
        lock(&self.shared.routine).steps.clone()
    }

    pub fn number_of_steps(&self) -> usize {
        lock(&self.shared.report).total_steps
    }

    pub fn errors(&self) -> Vec<String> {
        lock(&self.shared.report).errors.clone()
    }

    pub fn number_of_errors(&self) -> usize {
        lock(&self.shared.report).error_count()
    }

    /// Index of the step being executed, `None` when no run is active
    pub fn current_step(&self) -> Option<usize> {
        if self.status().is_active() {
            lock(&self.shared.report).current_step
        } else {
            None
        }
    }

    pub fn total_wait_time(&self) -> f64 {
        lock(&self.shared.report).total_wait
    }

    pub fn elapsed_time(&self) -> f64 {
        lock(&self.shared.report).elapsed_wait
    }

    pub fn report(&self) -> RoutineReport {
        lock(&self.shared.report).clone()
    }
}

impl Drop for RoutineController {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.shared.control.stop();
            if self.reap_worker().is_err() {
                actor_warn!("Routine worker panicked");
            }
        }
    }
}
