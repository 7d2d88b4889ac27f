//! # Command abstraction.
//!
//! A command is a zero-argument unit of work the runtime invokes at a point on the
//! show clock. It never knows *what* a command does, only *how* to call it:
//!
//! - [`BlockingCommand`] - synchronous closure, always executed on the bounded worker pool;
//! - [`NonBlockingCommand`] - closure producing a future, polled on the run task itself.
//!
//! Commands are `Fn` (not `FnOnce`) and shared through `Arc`, so a show can be replayed
//! any number of times. Each invocation of a non-blocking command creates a **fresh**
//! future; if you need shared state across invocations, capture an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use showvisor::{command, CommandError, Commands};
//!
//! let strobe = command::blocking(|| {
//!     // talk to hardware...
//!     Ok(())
//! });
//! let fade = command::non_blocking(|| async {
//!     // await some I/O...
//!     Ok::<_, CommandError>(())
//! });
//!
//! let batch = Commands::blocking_batch(vec![strobe.clone(), strobe]);
//! assert_eq!(batch.len(), 2);
//! assert!(!Commands::non_blocking(fade).is_blocking());
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::error::CommandError;

/// Result of one command invocation.
pub type CommandResult = Result<(), CommandError>;

/// Boxed future returned by a non-blocking command.
pub type BoxCommandFuture = BoxFuture<'static, CommandResult>;

/// Shared handle to a synchronous command.
pub type BlockingCommand = Arc<dyn Fn() -> CommandResult + Send + Sync>;

/// Shared handle to an asynchronous command.
pub type NonBlockingCommand = Arc<dyn Fn() -> BoxCommandFuture + Send + Sync>;

/// Wraps a synchronous closure into a [`BlockingCommand`].
pub fn blocking<F>(f: F) -> BlockingCommand
where
    F: Fn() -> CommandResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a future-producing closure into a [`NonBlockingCommand`].
pub fn non_blocking<F, Fut>(f: F) -> NonBlockingCommand
where
    F: Fn() -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = CommandResult> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Calling convention of an event's commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Submitted to the bounded worker pool.
    Blocking,
    /// Polled inline on the run task.
    NonBlocking,
}

impl Mode {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            Mode::Blocking => "blocking",
            Mode::NonBlocking => "non_blocking",
        }
    }
}

/// Whether an event fires one command or a concurrent batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly one command.
    Single,
    /// An ordered set of commands started together.
    Batch,
}

/// Commands of one event, tagged by calling convention.
///
/// The variant is the event's [`Mode`]: a single event can never mix blocking and
/// non-blocking commands.
#[derive(Clone)]
pub enum Commands {
    /// Synchronous commands, run on the worker pool.
    Blocking(Vec<BlockingCommand>),
    /// Asynchronous commands, polled on the run task.
    NonBlocking(Vec<NonBlockingCommand>),
}

impl Commands {
    /// One blocking command.
    pub fn blocking(cmd: BlockingCommand) -> Self {
        Commands::Blocking(vec![cmd])
    }

    /// One non-blocking command.
    pub fn non_blocking(cmd: NonBlockingCommand) -> Self {
        Commands::NonBlocking(vec![cmd])
    }

    /// A batch of blocking commands.
    pub fn blocking_batch(cmds: impl IntoIterator<Item = BlockingCommand>) -> Self {
        Commands::Blocking(cmds.into_iter().collect())
    }

    /// A batch of non-blocking commands.
    pub fn non_blocking_batch(cmds: impl IntoIterator<Item = NonBlockingCommand>) -> Self {
        Commands::NonBlocking(cmds.into_iter().collect())
    }

    /// Calling convention of these commands.
    pub fn mode(&self) -> Mode {
        match self {
            Commands::Blocking(_) => Mode::Blocking,
            Commands::NonBlocking(_) => Mode::NonBlocking,
        }
    }

    /// True for [`Commands::Blocking`].
    pub fn is_blocking(&self) -> bool {
        matches!(self, Commands::Blocking(_))
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        match self {
            Commands::Blocking(v) => v.len(),
            Commands::NonBlocking(v) => v.len(),
        }
    }

    /// True if there are no commands.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commands")
            .field("mode", &self.mode())
            .field("len", &self.len())
            .finish()
    }
}
