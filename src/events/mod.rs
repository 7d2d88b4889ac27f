//! Run events: types and broadcast bus.
//!
//! ## Contents
//! - [`RunEventKind`], [`RunEvent`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `ShowRun` (per run), `Manager` (admission, rotation, control),
//!   the per-run signal watcher, and `SubscriberSet` workers (overflow/panic).
//! - **Consumer**: the subscriber listener spawned by `ManagerBuilder::build`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{RunEvent, RunEventKind};
