//! # showvisor
//!
//! **Showvisor** drives caller-supplied commands at offsets along a show clock.
//!
//! It knows *when* to fire a command and *how* to call it (blocking on a bounded
//! worker pool, or non-blocking on the run task). It does not care *what* a
//! command does: lights, sound, smoke machines and projectors are all just closures.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │     Show     │   │     Show     │   │     Show     │
//!     │  (Timeline)  │   │  (Timeline)  │   │  (Timeline)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Manager (one run at a time)                                      │
//! │  - registry of shows                                              │
//! │  - Hooks (can_run, pre_show, on_event, on_error, post_show)       │
//! │  - Executor (bounded blocking pool + inline non-blocking)         │
//! │  - Bus (broadcast RunEvents)                                      │
//! └──────┬────────────────────────────────────────────────────┬───────┘
//!        ▼                                                    │
//!     ┌──────────────────────────────┐                        │
//!     │  ShowRun (own task)          │  publishes:            │
//!     │  pre_show → loop → post_show │  ShowStarting,         │
//!     └──────────────────────────────┘  EventFired, ...       │
//!        │                                                    ▼
//!        ▼                                    ┌────────────────────────┐
//! ┌───────────────────────────────┐           │  Bus ─► SubscriberSet  │
//! │  Executor                     │           │  ─► worker per sub     │
//! │  blocking:  spawn_blocking    │           └────────────────────────┘
//! │  non-blocking: inline await   │
//! └───────────────────────────────┘
//! ```
//!
//! ### Run lifecycle
//! ```text
//! run_show(name, ctx)
//!   ├─► admission (registry, shutdown, slot, can_run)
//!   ├─► pre_show
//!   ├─► loop {
//!   │     elapsed = now - origin
//!   │     for event in playback.due(elapsed, precision):
//!   │         execute ─► on_event | on_error
//!   │     exhausted ─► Completed;  cancelled ─► Interrupted
//!   │     sleep(precision) or wake on cancel
//!   │   }
//!   └─► post_show (exactly once)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types                                  |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Commands**      | Tagged blocking / non-blocking callables                       | [`Commands`], [`command`]                  |
//! | **Timeline**      | Ordered events and per-run playback                            | [`Timeline`], [`TimelineEvent`], [`Playback`] |
//! | **Shows**         | Named, replayable timelines                                    | [`Show`]                                   |
//! | **Execution**     | Bounded worker pool, failure aggregation                       | [`Executor`]                               |
//! | **Orchestration** | Registry, admission, preemption, rotation, shutdown            | [`Manager`], [`ManagerConfig`]             |
//! | **Hooks**         | Lifecycle callbacks with caller context                        | [`Hooks`], [`Hook`]                        |
//! | **Subscriber API**| Observe run events (logging, metrics)                          | [`Subscribe`], [`RunEvent`]                |
//! | **Single instance** | PID-file lock                                                | [`ProcessLock`]                            |
//! | **Errors**        | Typed errors                                                   | [`ShowError`], [`CommandError`], [`LockError`] |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] subscriber (renders events via `tracing`).
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use showvisor::{command, Manager, ManagerConfig, RunOutcome, Show};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut show = Show::new("intro", 0.2)?;
//!     show.add_blocking(0.0, command::blocking(|| Ok(())), "lights on")?
//!         .add_non_blocking(0.1, command::non_blocking(|| async { Ok(()) }), "music")?;
//!
//!     let cfg = ManagerConfig {
//!         time_precision: Duration::from_millis(10),
//!         handle_signals: false,
//!         ..ManagerConfig::default()
//!     };
//!     let manager = Manager::<()>::builder(cfg).with_show(show).build();
//!
//!     let report = manager.run_show("intro", ()).await?;
//!     assert_eq!(report.outcome, RunOutcome::Completed);
//!     assert_eq!(report.events_fired, 2);
//!     Ok(())
//! }
//! ```

mod commands;
mod core;
mod error;
mod events;
mod hooks;
mod lock;
mod show;
mod subscribers;
mod timeline;

/// Command constructors: `command::blocking(..)`, `command::non_blocking(..)`.
pub mod command {
    pub use crate::commands::{blocking, non_blocking};
}

// ---- Public re-exports ----

pub use commands::{
    Arity, BlockingCommand, BoxCommandFuture, CommandResult, Commands, Mode, NonBlockingCommand,
};
pub use core::{
    Executor, Manager, ManagerBuilder, ManagerConfig, RotationReport, RunOutcome, RunReport,
};
pub use error::{
    CommandError, CommandFailure, EventExecutionError, HookError, HookKind, LockError, ShowError,
};
pub use events::{Bus, RunEvent, RunEventKind};
pub use hooks::{Admission, ErrorCall, ErrorSite, EventCall, Hook, Hooks, ShowCall};
pub use lock::{LockGuard, ProcessLock};
pub use show::Show;
pub use subscribers::{Subscribe, SubscriberSet};
pub use timeline::{Playback, Timeline, TimelineEvent};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
