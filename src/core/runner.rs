//! # Drives one admitted run of a show.
//!
//! [`ShowRun::drive`] owns the scheduling loop and the single terminal transition.
//! It runs on its own task (spawned by the manager) so the caller dropping its
//! future cannot skip post-show.
//!
//! ## Flow
//! ```text
//! ShowStarting
//!   └─► pre_show ──err──► on_error(Show) ─────────────────────┐
//!          │ok                                                │
//!          ▼                                                  │
//!   origin = now                                              │
//!   loop:                                                     │
//!     elapsed ─► playback.due(elapsed, precision)             │
//!       for each event (stop early if cancelled):             │
//!         ok  ─► EventFired ─► on_event ──err──► on_error     │
//!         err ─► EventFailed ─► on_error ─► (fail_fast? end)  │
//!     exhausted? ─► Completed                                 │
//!     cancelled? ─► Interrupted                               │
//!     select { sleep(precision), token.cancelled() }          │
//!          │                                                  │
//!          ▼                                                  ▼
//!   post_show (exactly once) ─► ShowCompleted | ShowInterrupted | ShowFailed
//! ```
//!
//! ## Rules
//! - Interruption is an outcome, not an error
//! - The first failure wins; a later post-show failure is only logged
//! - An `on_event` failure is reported to `on_error` and the loop continues
//! - An `on_error` failure ends the run with that hook error

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{HookError, HookKind, ShowError};
use crate::events::{Bus, RunEvent, RunEventKind};
use crate::hooks::{ErrorCall, ErrorSite, EventCall, Hooks, ShowCall};
use crate::show::Show;
use crate::timeline::TimelineEvent;

use super::executor::Executor;
use super::report::{RunOutcome, RunReport};

/// Everything one run needs, moved onto the run task.
pub(crate) struct ShowRun<C> {
    pub(crate) show: Arc<Show>,
    pub(crate) context: Arc<C>,
    pub(crate) hooks: Arc<Hooks<C>>,
    pub(crate) executor: Executor,
    pub(crate) bus: Bus,
    pub(crate) precision: Duration,
    pub(crate) fail_fast: bool,
    pub(crate) token: CancellationToken,
}

#[derive(Default)]
struct Tally {
    fired: usize,
    failed: usize,
}

impl<C> ShowRun<C>
where
    C: Send + Sync + 'static,
{
    /// Runs pre-show, the loop and post-show; returns the report or the first failure.
    pub(crate) async fn drive(self) -> Result<RunReport, ShowError> {
        let started = Instant::now();
        let name = self.show.name().to_string();
        let mut tally = Tally::default();

        info!(show = %name, events = self.show.timeline().len(), "show starting");
        self.publish(RunEvent::new(RunEventKind::ShowStarting));

        let mut failure = self.pre_show().await.err();
        let mut completed = false;

        if failure.is_none() {
            match self.play(&mut tally).await {
                Ok(done) => completed = done,
                Err(e) => failure = Some(e),
            }
        }

        if let Err(e) = self.post_show().await {
            if failure.is_none() {
                failure = Some(e);
            } else {
                warn!(show = %name, error = %e, "post_show failed after an earlier failure");
            }
        }

        if let Some(err) = failure {
            error!(show = %name, kind = err.as_label(), error = %err, "show failed");
            self.publish(RunEvent::new(RunEventKind::ShowFailed).with_reason(err.to_string()));
            return Err(err);
        }

        let outcome = if completed {
            info!(show = %name, fired = tally.fired, failed = tally.failed, "show completed");
            self.publish(RunEvent::new(RunEventKind::ShowCompleted));
            RunOutcome::Completed
        } else {
            info!(show = %name, fired = tally.fired, failed = tally.failed, "show interrupted");
            self.publish(RunEvent::new(RunEventKind::ShowInterrupted));
            RunOutcome::Interrupted
        };

        Ok(RunReport {
            show: name,
            outcome,
            events_fired: tally.fired,
            events_failed: tally.failed,
            elapsed: started.elapsed(),
        })
    }

    /// Runs pre-show. A failure is reported to `on_error`, whose own failure is only logged.
    async fn pre_show(&self) -> Result<(), ShowError> {
        let Some(hook) = &self.hooks.pre_show else {
            return Ok(());
        };
        debug!(show = %self.show.name(), "running pre_show");

        let Err(e) = hook.invoke(self.show_call()).await else {
            return Ok(());
        };
        let err = self.hook_error(HookKind::PreShow, e);
        if let Err(report_err) = self.report_error(err.clone(), ErrorSite::Show).await {
            warn!(show = %self.show.name(), error = %report_err, "on_error failed while reporting pre_show failure");
        }
        Err(err)
    }

    async fn post_show(&self) -> Result<(), ShowError> {
        let Some(hook) = &self.hooks.post_show else {
            return Ok(());
        };
        debug!(show = %self.show.name(), "running post_show");
        hook.invoke(self.show_call())
            .await
            .map_err(|e| self.hook_error(HookKind::PostShow, e))
    }

    /// The scheduling loop. Returns `Ok(true)` when the timeline was exhausted and
    /// `Ok(false)` when cancelled first.
    async fn play(&self, tally: &mut Tally) -> Result<bool, ShowError> {
        let mut playback = self.show.timeline().playback();
        if playback.is_exhausted() {
            warn!(show = %self.show.name(), "show has no events");
            return Ok(true);
        }

        let precision = self.precision.as_secs_f64();
        let origin = Instant::now();

        loop {
            let elapsed = origin.elapsed().as_secs_f64();
            for event in playback.due(elapsed, precision) {
                if self.token.is_cancelled() {
                    return Ok(false);
                }
                self.dispatch(event, tally).await?;
            }

            if playback.is_exhausted() {
                return Ok(true);
            }
            if self.token.is_cancelled() {
                return Ok(false);
            }

            tokio::select! {
                _ = time::sleep(self.precision) => {}
                _ = self.token.cancelled() => return Ok(false),
            }
        }
    }

    /// Executes one event and runs the matching hooks.
    async fn dispatch(&self, event: Arc<TimelineEvent>, tally: &mut Tally) -> Result<(), ShowError> {
        debug!(
            show = %self.show.name(),
            cue = %event.description(),
            offset = event.timestamp(),
            mode = event.mode().as_label(),
            batch = event.is_batch(),
            "dispatching event"
        );

        match self.executor.execute(&event).await {
            Ok(()) => {
                tally.fired += 1;
                self.publish(cue_event(RunEventKind::EventFired, &event));

                if let Some(hook) = &self.hooks.on_event {
                    let call = EventCall {
                        event: Arc::clone(&event),
                        show: Arc::clone(&self.show),
                        context: Arc::clone(&self.context),
                    };
                    if let Err(e) = hook.invoke(call).await {
                        let err = self.hook_error(HookKind::OnEvent, e);
                        self.report_error(err, ErrorSite::Event(event)).await?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                tally.failed += 1;
                self.publish(cue_event(RunEventKind::EventFailed, &event).with_reason(e.to_string()));

                let err = ShowError::Event(e);
                self.report_error(err.clone(), ErrorSite::Event(event)).await?;
                if self.fail_fast {
                    return Err(err);
                }
                Ok(())
            }
        }
    }

    /// Hands `error` to `on_error`. Fails only if the hook itself fails.
    async fn report_error(&self, error: ShowError, site: ErrorSite) -> Result<(), ShowError> {
        let Some(hook) = &self.hooks.on_error else {
            return Ok(());
        };
        let call = ErrorCall {
            error,
            site,
            show: Arc::clone(&self.show),
            context: Arc::clone(&self.context),
        };
        hook.invoke(call)
            .await
            .map_err(|e| self.hook_error(HookKind::OnError, e))
    }

    fn hook_error(&self, hook: HookKind, error: HookError) -> ShowError {
        warn!(show = %self.show.name(), hook = hook.as_label(), error = %error, "hook failed");
        self.publish(RunEvent::new(RunEventKind::HookFailed).with_reason(format!("{hook}: {error}")));
        ShowError::Hook {
            hook,
            show: self.show.name().to_string(),
            error,
        }
    }

    fn show_call(&self) -> ShowCall<C> {
        ShowCall {
            show: Arc::clone(&self.show),
            context: Arc::clone(&self.context),
        }
    }

    /// Publishes `ev` tagged with this run's show.
    fn publish(&self, ev: RunEvent) {
        self.bus.publish(ev.with_show(self.show.name()));
    }
}

fn cue_event(kind: RunEventKind, event: &TimelineEvent) -> RunEvent {
    RunEvent::new(kind)
        .with_cue(event.description())
        .with_offset(event.timestamp())
}
