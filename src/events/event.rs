//! # Lifecycle events emitted by the manager and its runs.
//!
//! The [`RunEventKind`] enum classifies event types across four categories:
//! - **Run events**: show lifecycle (starting, completed, interrupted, failed, denied)
//! - **Cue events**: per timeline-event outcome (fired, failed) and hook failures
//! - **Control events**: interrupt/shutdown requests, rotation boundaries
//! - **Subscriber events**: overflow and panics inside subscriber workers
//!
//! The [`RunEvent`] struct carries the metadata (show name, cue description,
//! offset on the show clock, reason, rotation iteration).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use showvisor::{RunEvent, RunEventKind};
//!
//! let ev = RunEvent::new(RunEventKind::EventFailed)
//!     .with_show("opening")
//!     .with_cue("strobe")
//!     .with_offset(1.5)
//!     .with_reason("dmx port closed");
//!
//! assert_eq!(ev.kind, RunEventKind::EventFailed);
//! assert_eq!(ev.show.as_deref(), Some("opening"));
//! assert_eq!(ev.offset, Some(1.5));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of run events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEventKind {
    // === Subscriber events ===
    /// Subscriber panicked while processing an event.
    ///
    /// Sets: `show` (subscriber name), `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `show` (subscriber name), `reason`.
    SubscriberOverflow,

    // === Control events ===
    /// Termination signal observed or `request_shutdown` called.
    ShutdownRequested,

    /// Active run asked to stop (preemption or `stop_current_show`).
    ///
    /// Sets: `show`, `reason`.
    InterruptRequested,

    /// Rotation iteration starting.
    ///
    /// Sets: `iteration` (1-based).
    RotationStarted,

    /// Rotation ended.
    ///
    /// Sets: `iteration` (iterations started), `reason` (outcome label).
    RotationFinished,

    // === Run lifecycle ===
    /// Admission passed; pre-show about to run.
    ///
    /// Sets: `show`.
    ShowStarting,

    /// Every event fired and post-show completed.
    ///
    /// Sets: `show`.
    ShowCompleted,

    /// Run cancelled before exhausting its timeline.
    ///
    /// Sets: `show`.
    ShowInterrupted,

    /// Run ended with an error (pre-show, hook, or fail-fast event failure).
    ///
    /// Sets: `show`, `reason`.
    ShowFailed,

    /// `can_run` refused the run.
    ///
    /// Sets: `show`, `reason`.
    ShowDenied,

    // === Cue events ===
    /// Every command of a timeline event succeeded.
    ///
    /// Sets: `show`, `cue`, `offset`.
    EventFired,

    /// One or more commands of a timeline event failed.
    ///
    /// Sets: `show`, `cue`, `offset`, `reason`.
    EventFailed,

    /// A lifecycle hook failed or panicked.
    ///
    /// Sets: `show`, `reason` (`<hook>: <error>`).
    HookFailed,
}

impl RunEventKind {
    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            RunEventKind::SubscriberPanicked => "subscriber_panicked",
            RunEventKind::SubscriberOverflow => "subscriber_overflow",
            RunEventKind::ShutdownRequested => "shutdown_requested",
            RunEventKind::InterruptRequested => "interrupt_requested",
            RunEventKind::RotationStarted => "rotation_started",
            RunEventKind::RotationFinished => "rotation_finished",
            RunEventKind::ShowStarting => "show_starting",
            RunEventKind::ShowCompleted => "show_completed",
            RunEventKind::ShowInterrupted => "show_interrupted",
            RunEventKind::ShowFailed => "show_failed",
            RunEventKind::ShowDenied => "show_denied",
            RunEventKind::EventFired => "event_fired",
            RunEventKind::EventFailed => "event_failed",
            RunEventKind::HookFailed => "hook_failed",
        }
    }
}

/// Run event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`RunEventKind`]
#[derive(Clone, Debug)]
pub struct RunEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: RunEventKind,

    /// Show name (or subscriber name for subscriber events).
    pub show: Option<Arc<str>>,
    /// Description of the timeline event.
    pub cue: Option<Arc<str>>,
    /// Timeline event timestamp, seconds from show start.
    pub offset: Option<f64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Rotation iteration (starting from 1).
    pub iteration: Option<u32>,
}

impl RunEvent {
    /// Creates a new event with the current timestamp and next sequence number.
    pub fn new(kind: RunEventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            show: None,
            cue: None,
            offset: None,
            reason: None,
            iteration: None,
        }
    }

    #[inline]
    pub fn with_show(mut self, show: impl Into<Arc<str>>) -> Self {
        self.show = Some(show.into());
        self
    }

    #[inline]
    pub fn with_cue(mut self, cue: impl Into<Arc<str>>) -> Self {
        self.cue = Some(cue.into());
        self
    }

    #[inline]
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_iteration(mut self, n: u32) -> Self {
        self.iteration = Some(n);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        RunEvent::new(RunEventKind::SubscriberOverflow)
            .with_show(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        RunEvent::new(RunEventKind::SubscriberPanicked)
            .with_show(subscriber)
            .with_reason(info)
    }

    /// True for events produced by subscriber workers themselves.
    #[inline]
    pub fn is_internal(&self) -> bool {
        matches!(
            self.kind,
            RunEventKind::SubscriberOverflow | RunEventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = RunEvent::new(RunEventKind::ShowStarting);
        let b = RunEvent::new(RunEventKind::ShowCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn subscriber_events_are_internal() {
        assert!(RunEvent::subscriber_overflow("log", "full").is_internal());
        assert!(RunEvent::subscriber_panicked("log", "boom".into()).is_internal());
        assert!(!RunEvent::new(RunEventKind::EventFired).is_internal());
    }
}
