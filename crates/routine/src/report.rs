/// Progress and diagnostics of the last validation or run
///
/// Written by whichever pass is executing (the worker thread for a run,
/// the caller for a validation); readers get a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutineReport {
    /// `Line <n>: <reason>`, in source order
    pub errors: Vec<String>,
    /// Zero-based index of the step being executed; `None` before the first
    pub current_step: Option<usize>,
    /// Number of valid steps found by the last validation
    pub total_steps: usize,
    /// Wait time covered so far in this run, in seconds
    pub elapsed_wait: f64,
    /// Sum of all wait steps, in seconds
    pub total_wait: f64,
}

impl RoutineReport {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Fraction of the total wait time already covered, `0.0` when the
    /// routine has no waits.
    pub fn wait_progress(&self) -> f64 {
        if self.total_wait > 0.0 {
            (self.elapsed_wait / self.total_wait).min(1.0)
        } else {
            0.0
        }
    }

    /// Reset per-pass fields before a validation or run
    pub(crate) fn begin_pass(&mut self, dry_run: bool) {
        self.errors.clear();
        self.current_step = None;
        self.elapsed_wait = 0.0;
        if dry_run {
            self.total_wait = 0.0;
        }
    }

    /// Advance to the next step and return its index
    pub(crate) fn next_step(&mut self) -> usize {
        let step = self.current_step.map_or(0, |s| s + 1);
        self.current_step = Some(step);
        step
    }
}
