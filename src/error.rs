//! Error types used by the showvisor runtime, commands, hooks and the process lock.
//!
//! This module defines:
//!
//! - [`ShowError`] - errors raised by show construction and the [`Manager`](crate::Manager).
//! - [`EventExecutionError`] - aggregate failure of one timeline event.
//! - [`CommandError`] - errors raised by individual commands.
//! - [`HookError`] - errors raised by lifecycle hooks.
//! - [`LockError`] - errors raised by [`ProcessLock`](crate::ProcessLock).
//!
//! The enums provide `as_label` helpers returning stable snake_case labels for logs/metrics.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Lifecycle hook identifiers, used to tag hook failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Admission gate evaluated before a run starts.
    CanRun,
    /// Invoked once before the scheduling loop starts.
    PreShow,
    /// Invoked once after the run ends, on every path.
    PostShow,
    /// Invoked after each successfully dispatched event.
    OnEvent,
    /// Invoked on event failures and show-level failures.
    OnError,
}

impl HookKind {
    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            HookKind::CanRun => "can_run",
            HookKind::PreShow => "pre_show",
            HookKind::PostShow => "post_show",
            HookKind::OnEvent => "on_event",
            HookKind::OnError => "on_error",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// # Errors produced by shows and the manager.
///
/// Interruption is **not** an error: an interrupted run returns
/// [`RunOutcome::Interrupted`](crate::RunOutcome::Interrupted).
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ShowError {
    /// The requested show is not registered. No run was started.
    #[error("show not found: {name}")]
    ShowNotFound {
        /// The requested show name.
        name: String,
    },

    /// Another run is active and preemption was not requested. No run was started.
    #[error("show '{active}' is already running")]
    Busy {
        /// Name of the show currently running.
        active: String,
    },

    /// The manager received a shutdown request and refuses new runs.
    #[error("manager is shutting down")]
    ShuttingDown,

    /// Event timestamp is negative, NaN or infinite.
    #[error("invalid timestamp {timestamp}: must be a finite, non-negative number of seconds")]
    InvalidTimestamp {
        /// The rejected value.
        timestamp: f64,
    },

    /// Show duration is negative, NaN or infinite.
    #[error("invalid duration {duration}: must be a finite, non-negative number of seconds")]
    InvalidDuration {
        /// The rejected value.
        duration: f64,
    },

    /// An event was built without any command.
    #[error("event '{description}' has no commands")]
    EmptyCommands {
        /// Description of the rejected event.
        description: String,
    },

    /// One or more commands of a timeline event failed.
    #[error(transparent)]
    Event(#[from] EventExecutionError),

    /// A lifecycle hook failed.
    #[error("{hook} hook failed for show '{show}': {error}")]
    Hook {
        /// Which hook failed.
        hook: HookKind,
        /// Show the hook was invoked for.
        show: String,
        /// Underlying hook error.
        error: HookError,
    },

    /// The run task itself panicked (outside of commands and hooks).
    #[error("run of show '{show}' panicked: {error}")]
    Panicked {
        /// Show being run.
        show: String,
        /// Panic payload rendered as text.
        error: String,
    },
}

impl ShowError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use showvisor::ShowError;
    ///
    /// let err = ShowError::ShowNotFound { name: "demo".into() };
    /// assert_eq!(err.as_label(), "show_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ShowError::ShowNotFound { .. } => "show_not_found",
            ShowError::Busy { .. } => "show_busy",
            ShowError::ShuttingDown => "manager_shutting_down",
            ShowError::InvalidTimestamp { .. } => "invalid_timestamp",
            ShowError::InvalidDuration { .. } => "invalid_duration",
            ShowError::EmptyCommands { .. } => "empty_commands",
            ShowError::Event(_) => "event_failed",
            ShowError::Hook { .. } => "hook_failed",
            ShowError::Panicked { .. } => "run_panicked",
        }
    }
}

/// Failure of a single command inside an event.
#[derive(Debug, Clone)]
pub struct CommandFailure {
    /// Position of the command inside the event's command list.
    pub index: usize,
    /// The command's error.
    pub error: CommandError,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}: {}", self.index, self.error)
    }
}

/// # Aggregate failure of one timeline event.
///
/// Lists **exactly** the failing commands; siblings that succeeded are only
/// reflected in `total`.
#[derive(Error, Debug, Clone)]
#[error(
    "event '{description}' at {timestamp}s failed: {} of {total} command(s) failed [{}]",
    .failures.len(),
    render_failures(.failures)
)]
pub struct EventExecutionError {
    /// Description of the originating event.
    pub description: String,
    /// Timestamp of the originating event (seconds from show start).
    pub timestamp: f64,
    /// Number of commands the event dispatched.
    pub total: usize,
    /// Per-command failures, in command order.
    pub failures: Vec<CommandFailure>,
}

fn render_failures(failures: &[CommandFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// # Errors produced by commands.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Command returned an error.
    #[error("command failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Command panicked; the panic was contained by the executor.
    #[error("command panicked: {error}")]
    Panicked {
        /// Panic payload rendered as text.
        error: String,
    },

    /// The executor pool was shut down before the command could be submitted.
    #[error("executor is shut down")]
    Rejected,
}

impl CommandError {
    /// Convenience constructor for [`CommandError::Fail`].
    ///
    /// # Example
    /// ```
    /// use showvisor::CommandError;
    ///
    /// let err = CommandError::fail("dmx port closed");
    /// assert_eq!(err.to_string(), "command failed: dmx port closed");
    /// ```
    pub fn fail(error: impl fmt::Display) -> Self {
        CommandError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CommandError::Fail { .. } => "command_failed",
            CommandError::Panicked { .. } => "command_panicked",
            CommandError::Rejected => "command_rejected",
        }
    }
}

/// # Errors produced by lifecycle hooks.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// Hook returned an error.
    #[error("{error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Hook panicked; the panic was contained by the manager.
    #[error("panicked: {error}")]
    Panicked {
        /// Panic payload rendered as text.
        error: String,
    },
}

impl HookError {
    /// Convenience constructor for [`HookError::Fail`].
    pub fn fail(error: impl fmt::Display) -> Self {
        HookError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HookError::Fail { .. } => "hook_failed",
            HookError::Panicked { .. } => "hook_panicked",
        }
    }
}

/// # Errors produced by [`ProcessLock`](crate::ProcessLock).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LockError {
    /// The lock record names a process that is still alive.
    #[error("another instance is already running: lock '{name}' is held by pid {pid} ({})", .path.display())]
    Held {
        /// Logical lock name.
        name: String,
        /// PID recorded in the lock file.
        pid: u32,
        /// Lock file location.
        path: PathBuf,
    },

    /// Filesystem failure while reading or writing the lock record.
    #[error("lock file {}: {source}", .path.display())]
    Io {
        /// Lock file location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl LockError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LockError::Held { .. } => "lock_held",
            LockError::Io { .. } => "lock_io",
        }
    }
}

/// Renders a panic payload (`Box<dyn Any>`) as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_error_lists_only_failures() {
        let err = EventExecutionError {
            description: "mid".into(),
            timestamp: 1.0,
            total: 3,
            failures: vec![CommandFailure {
                index: 1,
                error: CommandError::fail("boom"),
            }],
        };
        let msg = err.to_string();
        assert!(msg.contains("'mid'"), "{msg}");
        assert!(msg.contains("1 of 3"), "{msg}");
        assert!(msg.contains("#1: command failed: boom"), "{msg}");
    }

    #[test]
    fn hook_error_names_hook_and_show() {
        let err = ShowError::Hook {
            hook: HookKind::PreShow,
            show: "demo".into(),
            error: HookError::fail("no projector"),
        };
        assert_eq!(
            err.to_string(),
            "pre_show hook failed for show 'demo': no projector"
        );
        assert_eq!(err.as_label(), "hook_failed");
    }

    #[test]
    fn lock_held_names_pid_and_path() {
        let err = LockError::Held {
            name: "lights".into(),
            pid: 4242,
            path: PathBuf::from("/tmp/lights.lock"),
        };
        let msg = err.to_string();
        assert!(msg.contains("already running"));
        assert!(msg.contains("4242"));
        assert!(msg.contains("/tmp/lights.lock"));
    }

    #[test]
    fn panic_message_handles_common_payloads() {
        let s: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
