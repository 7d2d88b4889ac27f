//! # Command abstractions.
//!
//! This module provides the command-related types:
//! - [`BlockingCommand`] / [`NonBlockingCommand`] - shared callables
//! - [`Commands`] - the tagged command list of one timeline event
//! - [`Mode`] / [`Arity`] - how an event's commands are dispatched
//! - [`blocking`] / [`non_blocking`] - constructors from closures

mod command;

pub use command::{
    blocking, non_blocking, Arity, BlockingCommand, BoxCommandFuture, CommandResult, Commands,
    Mode, NonBlockingCommand,
};
