//! # Dispatches the commands of one timeline event.
//!
//! The [`Executor`] knows *how* to call a command, never *what* it does.
//!
//! ```text
//! Blocking:      acquire permit ──► spawn_blocking(cmd) ──► release permit
//!                   (bounded by max_workers; the run task only awaits)
//!
//! Non-blocking:  cmd() future polled on the run task (catch_unwind guarded)
//!
//! Batch:         all commands start together ──► join_all (barrier)
//! ```
//!
//! ## Rules
//! - Blocking commands never run on the run task
//! - A panicking command becomes [`CommandError::Panicked`]; nothing unwinds into the loop
//! - Batch members race; the result list stays in command order
//! - After [`Executor::shutdown`] blocking dispatches fail with [`CommandError::Rejected`]

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{join_all, FutureExt};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::commands::{BlockingCommand, CommandResult, Commands, NonBlockingCommand};
use crate::error::{panic_message, CommandError, CommandFailure, EventExecutionError};
use crate::timeline::TimelineEvent;

use super::config::ManagerConfig;

/// Command dispatcher with a bounded blocking worker pool.
///
/// Cheap to clone: clones share the same pool.
#[derive(Clone, Debug)]
pub struct Executor {
    permits: Arc<Semaphore>,
    max_workers: usize,
}

impl Executor {
    /// Creates an executor running at most `max_workers` blocking commands at once
    /// (`0` = unlimited).
    pub fn new(max_workers: usize) -> Self {
        Self::from_config(&ManagerConfig {
            max_workers,
            ..ManagerConfig::default()
        })
    }

    /// Creates the executor sized by `cfg.max_workers`.
    pub(crate) fn from_config(cfg: &ManagerConfig) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(cfg.worker_limit())),
            max_workers: cfg.max_workers,
        }
    }

    /// Configured pool size (`0` = unlimited).
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Closes the pool. Commands already running finish; new blocking submissions
    /// are rejected.
    pub fn shutdown(&self) {
        if !self.permits.is_closed() {
            debug!(max_workers = self.max_workers, "executor shut down");
        }
        self.permits.close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }

    /// Runs one blocking command on the worker pool and waits for it.
    pub async fn run_blocking(&self, cmd: BlockingCommand) -> CommandResult {
        let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
            return Err(CommandError::Rejected);
        };

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            cmd()
        });

        match handle.await {
            Ok(res) => res,
            Err(e) if e.is_panic() => Err(CommandError::Panicked {
                error: panic_message(&*e.into_panic()),
            }),
            Err(e) => Err(CommandError::fail(e)),
        }
    }

    /// Starts every command on the pool and waits for all of them.
    ///
    /// Results are in command order.
    pub async fn run_blocking_batch(&self, cmds: &[BlockingCommand]) -> Vec<CommandResult> {
        join_all(cmds.iter().map(|cmd| self.run_blocking(Arc::clone(cmd)))).await
    }

    /// Awaits one non-blocking command on the current task.
    pub async fn run_non_blocking(&self, cmd: NonBlockingCommand) -> CommandResult {
        match AssertUnwindSafe(async move { cmd().await })
            .catch_unwind()
            .await
        {
            Ok(res) => res,
            Err(payload) => Err(CommandError::Panicked {
                error: panic_message(&*payload),
            }),
        }
    }

    /// Starts every command concurrently on the current task and waits for all.
    ///
    /// Results are in command order.
    pub async fn run_non_blocking_batch(&self, cmds: &[NonBlockingCommand]) -> Vec<CommandResult> {
        join_all(cmds.iter().map(|cmd| self.run_non_blocking(Arc::clone(cmd)))).await
    }

    /// Dispatches every command of `event` and aggregates failures.
    ///
    /// Returns `Ok(())` only if every command succeeded. The error lists exactly the
    /// failing commands with their index.
    pub async fn execute(&self, event: &TimelineEvent) -> Result<(), EventExecutionError> {
        let results = match event.commands() {
            Commands::Blocking(cmds) => match cmds.as_slice() {
                [cmd] => vec![self.run_blocking(Arc::clone(cmd)).await],
                many => self.run_blocking_batch(many).await,
            },
            Commands::NonBlocking(cmds) => match cmds.as_slice() {
                [cmd] => vec![self.run_non_blocking(Arc::clone(cmd)).await],
                many => self.run_non_blocking_batch(many).await,
            },
        };

        let total = results.len();
        let failures: Vec<CommandFailure> = results
            .into_iter()
            .enumerate()
            .filter_map(|(index, res)| res.err().map(|error| CommandFailure { index, error }))
            .collect();

        if failures.is_empty() {
            return Ok(());
        }

        for failure in &failures {
            warn!(
                cue = %event.description(),
                offset = event.timestamp(),
                index = failure.index,
                kind = failure.error.as_label(),
                error = %failure.error,
                "command failed"
            );
        }

        Err(EventExecutionError {
            description: event.description().to_string(),
            timestamp: event.timestamp(),
            total,
            failures,
        })
    }
}

impl Default for Executor {
    /// Pool sized by [`ManagerConfig::default`].
    fn default() -> Self {
        Self::from_config(&ManagerConfig::default())
    }
}
