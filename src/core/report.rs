//! Results of runs and rotations.

use std::time::Duration;

/// How a run that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every timeline event fired.
    Completed,
    /// Cancelled (signal, preemption, `stop_current_show`, dropped future) before
    /// the timeline was exhausted.
    Interrupted,
    /// `can_run` refused the run; no hook ran.
    Denied { reason: String },
}

impl RunOutcome {
    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Interrupted => "interrupted",
            RunOutcome::Denied { .. } => "denied",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }
}

/// Summary of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Show name.
    pub show: String,
    pub outcome: RunOutcome,
    /// Events whose commands all succeeded.
    pub events_fired: usize,
    /// Events with at least one failed command.
    pub events_failed: usize,
    /// Wall time from admission to the end of post-show.
    pub elapsed: Duration,
}

impl RunReport {
    pub(crate) fn denied(show: impl Into<String>, reason: String) -> Self {
        Self {
            show: show.into(),
            outcome: RunOutcome::Denied { reason },
            events_fired: 0,
            events_failed: 0,
            elapsed: Duration::ZERO,
        }
    }
}

/// Summary of a rotation.
#[derive(Debug, Clone)]
pub struct RotationReport {
    /// `Completed` once a non-repeating list has been played through;
    /// `Interrupted` when a run was interrupted or the manager shut down.
    pub outcome: RunOutcome,
    /// Iterations started (1-based count).
    pub iterations: u32,
    /// Runs that returned a report (including denied runs).
    pub runs: usize,
    pub events_fired: usize,
    pub events_failed: usize,
}
