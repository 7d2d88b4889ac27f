//! # LogWriter: renders run events through `tracing`.
//!
//! Available with the `logging` feature. Install any `tracing` subscriber (for
//! example `tracing_subscriber::fmt`) to see the output.
//!
//! ## Example output
//! ```text
//! INFO  show starting show="opening"
//! DEBUG cue fired show="opening" cue="strobe" offset=1.5
//! WARN  cue failed show="opening" cue="fog" offset=2.0 reason="1 of 1 command(s) failed ..."
//! INFO  show completed show="opening"
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{RunEvent, RunEventKind};
use crate::subscribers::Subscribe;

/// Subscriber that logs every run event.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &RunEvent) {
        let show = e.show.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        let cue = e.cue.as_deref().unwrap_or("-");

        match e.kind {
            RunEventKind::ShowStarting => info!(seq = e.seq, show, "show starting"),
            RunEventKind::ShowCompleted => info!(seq = e.seq, show, "show completed"),
            RunEventKind::ShowInterrupted => info!(seq = e.seq, show, "show interrupted"),
            RunEventKind::ShowFailed => warn!(seq = e.seq, show, reason, "show failed"),
            RunEventKind::ShowDenied => info!(seq = e.seq, show, reason, "show denied"),
            RunEventKind::EventFired => {
                debug!(seq = e.seq, show, cue, offset = e.offset, "cue fired")
            }
            RunEventKind::EventFailed => {
                warn!(seq = e.seq, show, cue, offset = e.offset, reason, "cue failed")
            }
            RunEventKind::HookFailed => warn!(seq = e.seq, show, reason, "hook failed"),
            RunEventKind::InterruptRequested => {
                info!(seq = e.seq, show, reason, "interrupt requested")
            }
            RunEventKind::ShutdownRequested => info!(seq = e.seq, "shutdown requested"),
            RunEventKind::RotationStarted => {
                info!(seq = e.seq, iteration = e.iteration, "rotation started")
            }
            RunEventKind::RotationFinished => {
                info!(seq = e.seq, iterations = e.iteration, outcome = reason, "rotation finished")
            }
            RunEventKind::SubscriberOverflow => {
                warn!(seq = e.seq, subscriber = show, reason, "subscriber overflow")
            }
            RunEventKind::SubscriberPanicked => {
                warn!(seq = e.seq, subscriber = show, reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
