//! Cancellation utilities for interruptible worker operations
//!
//! [`RunControl`] is shared between a worker thread and whoever drives it.
//! The worker blocks in [`RunControl::wait_timeout`] or
//! [`RunControl::wait_while_paused`]; the driver calls `stop`, `pause`,
//! `resume` or `wake` from any thread. Flags are only read and written under
//! the mutex, so "set flag" and "check-then-block" never race.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Re-check interval for waits too long to have a deadline
const UNBOUNDED_SLICE: Duration = Duration::from_secs(3600);

/// Why a blocking call returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// `stop()` was requested
    Stop,
    /// `resume()` cleared a pause
    Resume,
    /// `wake()` was called by hand
    Manual,
    /// `pause()` interrupted a timed wait
    Pause,
    /// The full duration elapsed
    Timeout,
}

#[derive(Debug, Default)]
struct Flags {
    stop_requested: bool,
    pause_requested: bool,
    /// Bumped by every wake source so a waiter can tell a real wake from a
    /// spurious one.
    wake_seq: u64,
    last_wake: Option<WakeReason>,
}

impl Flags {
    fn signal(&mut self, reason: WakeReason) {
        self.wake_seq = self.wake_seq.wrapping_add(1);
        self.last_wake = Some(reason);
    }
}

/// Stop / pause / wake signalling for one worker
#[derive(Debug, Default)]
pub struct RunControl {
    flags: Mutex<Flags>,
    wake_cv: Condvar,
    pause_cv: Condvar,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Flags> {
        // A panicking holder cannot leave the flags half-written.
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear every request before a new run starts.
    pub fn clear(&self) {
        let mut flags = self.lock();
        flags.stop_requested = false;
        flags.pause_requested = false;
        flags.last_wake = None;
    }

    /// Pending request for the worker, if any. Both flags are read under one
    /// lock so a stop that clears a pause is never missed. Stop wins.
    pub fn checkpoint(&self) -> Option<WakeReason> {
        let flags = self.lock();
        if flags.stop_requested {
            Some(WakeReason::Stop)
        } else if flags.pause_requested {
            Some(WakeReason::Pause)
        } else {
            None
        }
    }

    /// Request a stop. Releases a paused worker and interrupts a timed wait.
    pub fn stop(&self) {
        let mut flags = self.lock();
        flags.stop_requested = true;
        flags.pause_requested = false;
        flags.signal(WakeReason::Stop);
        drop(flags);
        self.pause_cv.notify_all();
        self.wake_cv.notify_all();
    }

    /// Request a pause. A timed wait in progress returns early so the pause
    /// takes effect promptly.
    pub fn pause(&self) {
        let mut flags = self.lock();
        flags.pause_requested = true;
        flags.signal(WakeReason::Pause);
        drop(flags);
        self.wake_cv.notify_one();
    }

    /// Clear the pause request and release one paused waiter.
    pub fn resume(&self) {
        let mut flags = self.lock();
        flags.pause_requested = false;
        drop(flags);
        self.pause_cv.notify_one();
    }

    /// Release one waiter blocked in [`RunControl::wait_timeout`].
    pub fn wake(&self) {
        let mut flags = self.lock();
        flags.signal(WakeReason::Manual);
        drop(flags);
        self.wake_cv.notify_one();
    }

    /// Block for at most `duration`.
    ///
    /// Returns early with the reason if stopped, woken or paused. A stop or
    /// pause already requested when the call starts returns immediately.
    pub fn wait_timeout(&self, duration: Duration) -> WakeReason {
        // `None` when the deadline is past what `Instant` can represent
        let deadline = Instant::now().checked_add(duration);
        let mut flags = self.lock();
        let start_seq = flags.wake_seq;

        if flags.stop_requested {
            return WakeReason::Stop;
        }
        if flags.pause_requested {
            return WakeReason::Pause;
        }

        loop {
            if flags.stop_requested {
                return WakeReason::Stop;
            }
            if flags.wake_seq != start_seq {
                return flags.last_wake.unwrap_or(WakeReason::Manual);
            }
            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WakeReason::Timeout;
                    }
                    deadline - now
                }
                None => UNBOUNDED_SLICE,
            };
            let (guard, _) = self
                .wake_cv
                .wait_timeout(flags, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            flags = guard;
        }
    }

    /// Block while a pause is requested.
    ///
    /// Returns [`WakeReason::Stop`] if a stop arrives, otherwise
    /// [`WakeReason::Resume`] once the pause clears.
    pub fn wait_while_paused(&self) -> WakeReason {
        let mut flags = self.lock();
        loop {
            if flags.stop_requested {
                return WakeReason::Stop;
            }
            if !flags.pause_requested {
                return WakeReason::Resume;
            }
            flags = self
                .pause_cv
                .wait(flags)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_wait_times_out() {
        let control = RunControl::new();
        let started = Instant::now();
        assert_eq!(
            control.wait_timeout(Duration::from_millis(30)),
            WakeReason::Timeout
        );
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_wake_interrupts_wait() {
        let control = Arc::new(RunControl::new());
        let waiter = {
            let control = control.clone();
            thread::spawn(move || {
                let started = Instant::now();
                let reason = control.wait_timeout(Duration::from_secs(10));
                (reason, started.elapsed())
            })
        };

        // A wake sent before the waiter blocks is not remembered, so repeat
        while !waiter.is_finished() {
            thread::sleep(Duration::from_millis(20));
            control.wake();
        }

        let (reason, elapsed) = waiter.join().unwrap();
        assert_eq!(reason, WakeReason::Manual);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_stop_interrupts_wait() {
        let control = Arc::new(RunControl::new());
        let waiter = {
            let control = control.clone();
            thread::spawn(move || control.wait_timeout(Duration::from_secs(10)))
        };

        thread::sleep(Duration::from_millis(50));
        control.stop();

        assert_eq!(waiter.join().unwrap(), WakeReason::Stop);
        assert_eq!(control.checkpoint(), Some(WakeReason::Stop));
    }

    #[test]
    fn test_pause_interrupts_wait() {
        let control = Arc::new(RunControl::new());
        let waiter = {
            let control = control.clone();
            thread::spawn(move || control.wait_timeout(Duration::from_secs(10)))
        };

        thread::sleep(Duration::from_millis(50));
        control.pause();

        assert_eq!(waiter.join().unwrap(), WakeReason::Pause);
        assert_eq!(control.checkpoint(), Some(WakeReason::Pause));
    }

    #[test]
    fn test_pending_stop_returns_immediately() {
        let control = RunControl::new();
        control.stop();
        assert_eq!(
            control.wait_timeout(Duration::from_secs(10)),
            WakeReason::Stop
        );
        assert_eq!(control.wait_while_paused(), WakeReason::Stop);
    }

    #[test]
    fn test_resume_releases_pause() {
        let control = Arc::new(RunControl::new());
        control.pause();

        let waiter = {
            let control = control.clone();
            thread::spawn(move || control.wait_while_paused())
        };

        thread::sleep(Duration::from_millis(50));
        control.resume();

        assert_eq!(waiter.join().unwrap(), WakeReason::Resume);
        assert_eq!(control.checkpoint(), None);
    }

    #[test]
    fn test_stop_while_paused() {
        let control = Arc::new(RunControl::new());
        control.pause();

        let waiter = {
            let control = control.clone();
            thread::spawn(move || control.wait_while_paused())
        };

        thread::sleep(Duration::from_millis(50));
        control.stop();

        assert_eq!(waiter.join().unwrap(), WakeReason::Stop);
        assert_eq!(control.checkpoint(), Some(WakeReason::Stop));
    }

    #[test]
    fn test_checkpoint_sees_stop_that_cleared_pause() {
        let control = RunControl::new();
        assert_eq!(control.checkpoint(), None);

        control.pause();
        assert_eq!(control.checkpoint(), Some(WakeReason::Pause));

        // stop() drops the pause request; the worker must still see the stop
        control.stop();
        assert_eq!(control.checkpoint(), Some(WakeReason::Stop));

        control.pause();
        assert_eq!(control.checkpoint(), Some(WakeReason::Stop));
    }

    #[test]
    fn test_clear_resets_requests() {
        let control = RunControl::new();
        control.pause();
        control.stop();
        control.clear();
        assert_eq!(control.checkpoint(), None);
        assert_eq!(control.wait_while_paused(), WakeReason::Resume);
    }

    #[test]
    fn test_unbounded_wait_can_be_stopped() {
        let control = Arc::new(RunControl::new());
        let waiter = {
            let control = control.clone();
            thread::spawn(move || control.wait_timeout(Duration::MAX))
        };

        thread::sleep(Duration::from_millis(50));
        control.stop();

        assert_eq!(waiter.join().unwrap(), WakeReason::Stop);
    }

    #[test]
    fn test_stale_wake_does_not_cut_next_wait() {
        let control = RunControl::new();
        control.wake();
        assert_eq!(
            control.wait_timeout(Duration::from_millis(20)),
            WakeReason::Timeout
        );
    }
}
