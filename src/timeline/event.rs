//! # Timeline event: one scheduling record.
//!
//! A [`TimelineEvent`] binds a set of [`Commands`] to an offset on the show clock.
//! It is validated at construction (finite, non-negative timestamp; at least one
//! command) and immutable afterwards; the owning [`Timeline`](super::Timeline)
//! stamps the `sequence_id` when the event is appended.

use std::cmp::Ordering;
use std::fmt;

use crate::commands::{Arity, Commands, Mode};
use crate::error::ShowError;

/// Validates a show-clock offset in seconds.
fn check_timestamp(timestamp: f64) -> Result<f64, ShowError> {
    if timestamp.is_finite() && timestamp >= 0.0 {
        Ok(timestamp)
    } else {
        Err(ShowError::InvalidTimestamp { timestamp })
    }
}

/// Scheduling record: commands fired at `timestamp` seconds from show start.
#[derive(Clone)]
pub struct TimelineEvent {
    timestamp: f64,
    arity: Arity,
    commands: Commands,
    description: String,
    sequence_id: u64,
}

impl TimelineEvent {
    /// Creates an event from `commands`.
    ///
    /// One command gives a single event; more than one becomes a batch, as with
    /// [`TimelineEvent::batch`].
    pub fn new(
        timestamp: f64,
        commands: Commands,
        description: impl Into<String>,
    ) -> Result<Self, ShowError> {
        let description = description.into();
        if commands.len() > 1 {
            return Self::build(timestamp, Arity::Batch, commands, description);
        }
        Self::build(timestamp, Arity::Single, commands, description)
    }

    /// Creates a batch event: all commands start together and the event completes
    /// when every one of them has finished.
    pub fn batch(
        timestamp: f64,
        commands: Commands,
        description: impl Into<String>,
    ) -> Result<Self, ShowError> {
        Self::build(timestamp, Arity::Batch, commands, description.into())
    }

    fn build(
        timestamp: f64,
        arity: Arity,
        commands: Commands,
        description: String,
    ) -> Result<Self, ShowError> {
        let timestamp = check_timestamp(timestamp)?;
        if commands.is_empty() {
            return Err(ShowError::EmptyCommands { description });
        }
        Ok(Self {
            timestamp,
            arity,
            commands,
            description,
            sequence_id: 0,
        })
    }

    /// Offset from show start, in seconds.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Calling convention of the event's commands.
    pub fn mode(&self) -> Mode {
        self.commands.mode()
    }

    /// Single command or batch.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// True if the event is a batch.
    pub fn is_batch(&self) -> bool {
        self.arity == Arity::Batch
    }

    /// The event's commands.
    pub fn commands(&self) -> &Commands {
        &self.commands
    }

    /// Free-text label used in hooks and diagnostics.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Insertion order tie-break, assigned by the owning timeline.
    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    pub(crate) fn stamped(mut self, sequence_id: u64) -> Self {
        self.sequence_id = sequence_id;
        self
    }

    /// Total order used by the timeline: `(timestamp, sequence_id)`.
    pub(crate) fn order(&self, other: &Self) -> Ordering {
        self.timestamp
            .total_cmp(&other.timestamp)
            .then(self.sequence_id.cmp(&other.sequence_id))
    }
}

impl fmt::Debug for TimelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineEvent")
            .field("timestamp", &self.timestamp)
            .field("mode", &self.mode())
            .field("arity", &self.arity)
            .field("commands", &self.commands.len())
            .field("description", &self.description)
            .field("sequence_id", &self.sequence_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::blocking;

    fn noop() -> Commands {
        Commands::blocking(blocking(|| Ok(())))
    }

    #[test]
    fn rejects_bad_timestamps() {
        for ts in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = TimelineEvent::new(ts, noop(), "bad").unwrap_err();
            assert_eq!(err.as_label(), "invalid_timestamp", "timestamp {ts}");
        }
    }

    #[test]
    fn rejects_empty_commands() {
        let err = TimelineEvent::batch(1.0, Commands::Blocking(Vec::new()), "empty").unwrap_err();
        assert!(matches!(err, ShowError::EmptyCommands { ref description } if description == "empty"));
    }

    #[test]
    fn multi_command_event_is_batch() {
        let cmds = Commands::blocking_batch(vec![blocking(|| Ok(())), blocking(|| Ok(()))]);
        let ev = TimelineEvent::new(1.0, cmds, "pair").unwrap();
        assert!(ev.is_batch());
        assert_eq!(ev.commands().len(), 2);
        assert_eq!(ev.mode(), Mode::Blocking);
    }

    #[test]
    fn one_command_event_is_single() {
        let ev = TimelineEvent::new(0.5, noop(), "solo").unwrap();
        assert_eq!(ev.arity(), Arity::Single);
        assert!(!ev.is_batch());
    }

    #[test]
    fn single_element_batch_keeps_batch_arity() {
        let ev = TimelineEvent::batch(0.0, noop(), "solo").unwrap();
        assert_eq!(ev.arity(), Arity::Batch);
    }

    #[test]
    fn order_breaks_ties_by_sequence() {
        let a = TimelineEvent::new(1.0, noop(), "a").unwrap().stamped(0);
        let b = TimelineEvent::new(1.0, noop(), "b").unwrap().stamped(1);
        let c = TimelineEvent::new(0.5, noop(), "c").unwrap().stamped(2);
        assert_eq!(a.order(&b), Ordering::Less);
        assert_eq!(c.order(&a), Ordering::Less);
    }
}
