//! # Broadcast bus for run events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that lets runs, the
//! manager and subscriber workers publish without blocking.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                  Consumer (one):
//!   ShowRun   ──┐
//!   Manager   ──┼──────► Bus ───────► subscriber listener ────► SubscriberSet
//!   signal    ──┤  (broadcast chan)     (spawned by the builder)
//!   workers   ──┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks
//! - A single ring buffer of `capacity` events is shared by all receivers
//! - Slow receivers get `RecvError::Lagged(n)` and skip the `n` oldest events
//! - Events published with no receiver are dropped

use tokio::sync::broadcast;

use super::event::RunEvent;

/// Broadcast channel for run events.
///
/// Cheap to clone (holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<RunEvent>,
}

impl Bus {
    /// Creates a bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<RunEvent>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to every active receiver.
    pub fn publish(&self, ev: RunEvent) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver observing events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.tx.subscribe()
    }
}
