//! # Manager: show registry, admission and run control.
//!
//! The [`Manager`] owns the registered shows, the hooks table, the [`Executor`] and
//! the event bus. At most one show runs at a time.
//!
//! ## Admission
//! ```text
//! run_show(name, ctx)
//!   ├─ unknown name            → ShowError::ShowNotFound   (no hooks)
//!   ├─ manager shut down       → ShowError::ShuttingDown
//!   ├─ slot taken
//!   │    ├─ run_show           → ShowError::Busy { active }
//!   │    └─ run_show_preempting → cancel active, await its post_show, take slot
//!   ├─ can_run → Deny          → RunOutcome::Denied        (no hooks)
//!   └─ spawn ShowRun::drive on its own task; await it
//! ```
//!
//! ## Cancellation
//! ```text
//! shutdown token (manager-wide)
//!   └─ run token (child, one per run)
//!        ├─ cancelled by: signal watcher, request_shutdown, preemption,
//!        │                stop_current_show, caller dropping run_show
//!        └─ observed by:  ShowRun loop (between events and while sleeping)
//! ```
//!
//! ## Rules
//! - Every admitted run reaches post_show exactly once, even if the caller's future is dropped
//! - The slot is released only after post_show returned
//! - A signal shuts the manager down for good; later runs get `ShuttingDown`

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{HookKind, ShowError};
use crate::events::{Bus, RunEvent, RunEventKind};
use crate::hooks::{Admission, Hooks, ShowCall};
use crate::show::Show;

use super::builder::ManagerBuilder;
use super::config::ManagerConfig;
use super::executor::Executor;
use super::report::{RotationReport, RunOutcome, RunReport};
use super::runner::ShowRun;
use super::shutdown;

/// Run currently holding the slot.
struct ActiveRun {
    show: String,
    token: CancellationToken,
}

/// Clears the active-run record when the run ends (or admission is abandoned).
struct ActiveGuard {
    active: Arc<Mutex<Option<ActiveRun>>>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// Runs shows from a registry, one at a time.
///
/// `C` is the caller context type handed to every hook (defaults to `()`).
pub struct Manager<C = ()> {
    cfg: ManagerConfig,
    shows: RwLock<HashMap<String, Arc<Show>>>,
    hooks: Arc<Hooks<C>>,
    executor: Executor,
    bus: Bus,
    slot: Arc<AsyncMutex<()>>,
    active: Arc<Mutex<Option<ActiveRun>>>,
    shutdown: CancellationToken,
    /// Stops the subscriber listener; fired by `shutdown()` and on drop.
    closing: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<C> Manager<C>
where
    C: Send + Sync + 'static,
{
    /// Starts building a manager.
    pub fn builder(cfg: ManagerConfig) -> ManagerBuilder<C> {
        ManagerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: ManagerConfig,
        shows: HashMap<String, Arc<Show>>,
        hooks: Hooks<C>,
        bus: Bus,
        closing: CancellationToken,
        listener: Option<JoinHandle<()>>,
    ) -> Self {
        let executor = Executor::from_config(&cfg);
        Self {
            cfg,
            shows: RwLock::new(shows),
            hooks: Arc::new(hooks),
            executor,
            bus,
            slot: Arc::new(AsyncMutex::new(())),
            active: Arc::new(Mutex::new(None)),
            shutdown: CancellationToken::new(),
            closing,
            listener: Mutex::new(listener),
        }
    }

    /// Configuration the manager was built with.
    pub fn config(&self) -> &ManagerConfig {
        &self.cfg
    }

    /// The command executor shared by all runs.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Event bus; `subscribe()` to observe runs without a [`Subscribe`](crate::Subscribe) impl.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    // ---- registry ----

    /// Registers `show`, replacing (and returning) any show with the same name.
    pub fn add_show(&self, show: Show) -> Option<Arc<Show>> {
        let name = show.name().to_string();
        info!(show = %name, events = show.timeline().len(), "show added");
        self.write_shows().insert(name, Arc::new(show))
    }

    /// Unregisters a show. A run already in progress keeps its own reference.
    pub fn remove_show(&self, name: &str) -> Option<Arc<Show>> {
        let removed = self.write_shows().remove(name);
        if removed.is_some() {
            info!(show = %name, "show removed");
        }
        removed
    }

    pub fn show(&self, name: &str) -> Option<Arc<Show>> {
        self.read_shows().get(name).cloned()
    }

    /// Registered show names, sorted.
    pub fn show_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read_shows().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered shows.
    pub fn len(&self) -> usize {
        self.read_shows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_shows().is_empty()
    }

    // ---- state ----

    /// True while a run holds the slot (admission included).
    pub fn is_running(&self) -> bool {
        self.lock_active().is_some()
    }

    pub fn current_show_name(&self) -> Option<String> {
        self.lock_active().as_ref().map(|a| a.show.clone())
    }

    /// True once a signal, [`request_shutdown`](Self::request_shutdown) or
    /// [`shutdown`](Self::shutdown) was observed.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    // ---- runs ----

    /// Runs the named show to its end.
    ///
    /// Fails with [`ShowError::Busy`] if another run is active.
    pub async fn run_show(
        &self,
        name: &str,
        context: impl Into<Arc<C>>,
    ) -> Result<RunReport, ShowError> {
        self.run(name, context.into(), false).await
    }

    /// Runs the named show, first interrupting the active run (if any) and waiting
    /// for its post-show to finish.
    pub async fn run_show_preempting(
        &self,
        name: &str,
        context: impl Into<Arc<C>>,
    ) -> Result<RunReport, ShowError> {
        self.run(name, context.into(), true).await
    }

    async fn run(
        &self,
        name: &str,
        context: Arc<C>,
        preempt: bool,
    ) -> Result<RunReport, ShowError> {
        let show = self.show(name).ok_or_else(|| ShowError::ShowNotFound {
            name: name.to_string(),
        })?;
        if self.shutdown.is_cancelled() {
            return Err(ShowError::ShuttingDown);
        }

        let slot = self.claim_slot(name, preempt).await?;
        if self.shutdown.is_cancelled() {
            return Err(ShowError::ShuttingDown);
        }

        let token = self.shutdown.child_token();
        let active = self.set_active(name, token.clone());

        if let Some(reason) = self.admission(&show, &context).await {
            info!(show = %name, reason = %reason, "show denied by can_run");
            self.bus.publish(
                RunEvent::new(RunEventKind::ShowDenied)
                    .with_show(name)
                    .with_reason(reason.as_str()),
            );
            return Ok(RunReport::denied(name, reason));
        }

        let run = ShowRun {
            show,
            context,
            hooks: Arc::clone(&self.hooks),
            executor: self.executor.clone(),
            bus: self.bus.clone(),
            precision: self.cfg.poll_interval(),
            fail_fast: self.cfg.fail_fast,
            token: token.clone(),
        };

        let handle = tokio::spawn(async move {
            let _slot = slot;
            let _active = active;
            run.drive().await
        });

        // Dropping this future (or returning) cancels the run token; the spawned
        // run still finishes through post_show.
        let _cancel_on_drop = token.clone().drop_guard();
        if self.cfg.handle_signals {
            self.watch_signals(token);
        }

        match handle.await {
            Ok(res) => res,
            Err(e) => {
                let error = if e.is_panic() {
                    crate::error::panic_message(&*e.into_panic())
                } else {
                    e.to_string()
                };
                warn!(show = %name, error = %error, "run task ended abnormally");
                Err(ShowError::Panicked {
                    show: name.to_string(),
                    error,
                })
            }
        }
    }

    /// Plays `names` in order; with `repeat`, starts over until interrupted.
    ///
    /// Every name is checked before anything runs. A run error ends the rotation with
    /// that error. An interrupted run or a manager shutdown ends it with outcome
    /// `Interrupted`.
    pub async fn run_rotation<I, S>(
        &self,
        names: I,
        repeat: bool,
        context: impl Into<Arc<C>>,
    ) -> Result<RotationReport, ShowError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        {
            let shows = self.read_shows();
            if let Some(missing) = names.iter().find(|n| !shows.contains_key(n.as_str())) {
                return Err(ShowError::ShowNotFound {
                    name: missing.clone(),
                });
            }
        }

        let context = context.into();
        let mut report = RotationReport {
            outcome: RunOutcome::Completed,
            iterations: 0,
            runs: 0,
            events_fired: 0,
            events_failed: 0,
        };
        if names.is_empty() {
            return Ok(report);
        }

        'rotation: loop {
            report.iterations += 1;
            info!(iteration = report.iterations, shows = names.len(), "rotation iteration starting");
            self.bus
                .publish(RunEvent::new(RunEventKind::RotationStarted).with_iteration(report.iterations));

            for name in &names {
                let run = match self.run_show(name, Arc::clone(&context)).await {
                    Ok(run) => run,
                    Err(ShowError::ShuttingDown) => {
                        report.outcome = RunOutcome::Interrupted;
                        break 'rotation;
                    }
                    Err(e) => return Err(e),
                };
                report.runs += 1;
                report.events_fired += run.events_fired;
                report.events_failed += run.events_failed;

                if run.outcome == RunOutcome::Interrupted {
                    report.outcome = RunOutcome::Interrupted;
                    break 'rotation;
                }
            }

            if !repeat {
                break;
            }
            tokio::task::yield_now().await;
        }

        info!(
            iterations = report.iterations,
            runs = report.runs,
            outcome = report.outcome.as_label(),
            "rotation finished"
        );
        self.bus.publish(
            RunEvent::new(RunEventKind::RotationFinished)
                .with_iteration(report.iterations)
                .with_reason(report.outcome.as_label()),
        );
        Ok(report)
    }

    // ---- control ----

    /// Interrupts the active run and waits until its post-show has finished.
    ///
    /// Returns the stopped show's name, or `None` if nothing was running.
    pub async fn stop_current_show(&self) -> Option<String> {
        let name = self.interrupt_active("stop requested")?;
        drop(self.slot.lock().await);
        Some(name)
    }

    /// Same path as a termination signal: interrupts the active run and refuses new ones.
    ///
    /// Does not wait; see [`shutdown`](Self::shutdown).
    pub fn request_shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!("shutdown requested");
            self.bus.publish(RunEvent::new(RunEventKind::ShutdownRequested));
        }
        self.shutdown.cancel();
    }

    /// Requests shutdown, waits for the active run to finish, closes the executor and
    /// waits until every subscriber has processed the events published so far.
    pub async fn shutdown(&self) {
        self.request_shutdown();
        drop(self.slot.lock().await);
        self.executor.shutdown();

        self.closing.cancel();
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = listener {
            if let Err(e) = handle.await {
                warn!(error = %e, "subscriber listener ended abnormally");
            }
        }
    }

    // ---- internals ----

    /// Takes the run slot, preempting the holder if asked to.
    async fn claim_slot(
        &self,
        name: &str,
        preempt: bool,
    ) -> Result<OwnedMutexGuard<()>, ShowError> {
        if let Ok(guard) = Arc::clone(&self.slot).try_lock_owned() {
            return Ok(guard);
        }
        if !preempt {
            let active = self
                .current_show_name()
                .unwrap_or_else(|| "<starting>".to_string());
            debug!(show = %name, active = %active, "run refused: busy");
            return Err(ShowError::Busy { active });
        }

        self.interrupt_active(&format!("preempted by '{name}'"));
        Ok(Arc::clone(&self.slot).lock_owned().await)
    }

    /// Cancels the active run's token; returns its show name.
    fn interrupt_active(&self, reason: &str) -> Option<String> {
        let active = self.lock_active();
        let run = active.as_ref()?;
        info!(show = %run.show, reason, "interrupting show");
        self.bus.publish(
            RunEvent::new(RunEventKind::InterruptRequested)
                .with_show(run.show.as_str())
                .with_reason(reason),
        );
        run.token.cancel();
        Some(run.show.clone())
    }

    fn set_active(&self, name: &str, token: CancellationToken) -> ActiveGuard {
        *self.lock_active() = Some(ActiveRun {
            show: name.to_string(),
            token,
        });
        ActiveGuard {
            active: Arc::clone(&self.active),
        }
    }

    /// Evaluates `can_run`. Returns the denial reason, or `None` to proceed.
    ///
    /// A failing gate lets the run proceed.
    async fn admission(&self, show: &Arc<Show>, context: &Arc<C>) -> Option<String> {
        let gate = self.hooks.can_run.as_ref()?;
        let call = ShowCall {
            show: Arc::clone(show),
            context: Arc::clone(context),
        };
        match gate.invoke(call).await {
            Ok(Admission::Allow) => None,
            Ok(Admission::Deny { reason }) => Some(reason),
            Err(e) => {
                warn!(show = %show.name(), error = %e, "can_run failed; allowing run");
                self.bus.publish(
                    RunEvent::new(RunEventKind::HookFailed)
                        .with_show(show.name())
                        .with_reason(format!("{}: {e}", HookKind::CanRun)),
                );
                None
            }
        }
    }

    /// Watches for termination signals until `token` is cancelled.
    fn watch_signals(&self, token: CancellationToken) {
        let shutdown = self.shutdown.clone();
        let bus = self.bus.clone();
        tokio::spawn(async move {
            tokio::select! {
                res = shutdown::wait_for_shutdown_signal() => match res {
                    Ok(()) => {
                        warn!("termination signal received; stopping");
                        bus.publish(RunEvent::new(RunEventKind::ShutdownRequested));
                        shutdown.cancel();
                    }
                    Err(e) => warn!(error = %e, "cannot install signal handlers"),
                },
                _ = token.cancelled() => {}
            }
        });
    }

    fn read_shows(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<Show>>> {
        self.shows.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_shows(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<Show>>> {
        self.shows.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C> Drop for Manager<C> {
    fn drop(&mut self) {
        self.closing.cancel();
    }
}
