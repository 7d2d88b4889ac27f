//! # Show: a named, replayable timeline.
//!
//! A [`Show`] is what the [`Manager`](crate::Manager) registers and runs. It owns its
//! [`Timeline`] and is immutable once registered (the manager keeps it behind an `Arc`).
//!
//! ```rust
//! use showvisor::{command, Show};
//!
//! let mut show = Show::new("opening", 10.0)?.with_description("first act");
//! show.add_blocking(0.0, command::blocking(|| Ok(())), "house lights down")?
//!     .add_non_blocking(2.5, command::non_blocking(|| async { Ok(()) }), "fog")?;
//! assert_eq!(show.timeline().len(), 2);
//! # Ok::<(), showvisor::ShowError>(())
//! ```

use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use crate::commands::{BlockingCommand, Commands, NonBlockingCommand};
use crate::error::ShowError;
use crate::timeline::{Timeline, TimelineEvent};

/// Named unit of choreography.
#[derive(Clone, Debug)]
pub struct Show {
    name: String,
    duration: f64,
    description: String,
    metadata: BTreeMap<String, String>,
    timeline: Timeline,
}

impl Show {
    /// Creates an empty show.
    ///
    /// `duration` is informational (seconds); it must be finite and non-negative.
    pub fn new(name: impl Into<String>, duration: f64) -> Result<Self, ShowError> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(ShowError::InvalidDuration { duration });
        }
        Ok(Self {
            name: name.into(),
            duration,
            description: String::new(),
            metadata: BTreeMap::new(),
            timeline: Timeline::new(),
        })
    }

    /// Sets the free-text description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attaches a caller label (artist, genre, ...).
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Registry key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Informational upper bound of the show clock, in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Mutable access for building; not reachable once the show is registered.
    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    /// Appends an event with arbitrary commands. More than one command makes a batch.
    pub fn add_event(
        &mut self,
        timestamp: f64,
        commands: Commands,
        description: impl Into<String>,
    ) -> Result<&mut Self, ShowError> {
        let event = TimelineEvent::new(timestamp, commands, description)?;
        self.push(event);
        Ok(self)
    }

    pub fn add_blocking(
        &mut self,
        timestamp: f64,
        cmd: BlockingCommand,
        description: impl Into<String>,
    ) -> Result<&mut Self, ShowError> {
        self.add_event(timestamp, Commands::blocking(cmd), description)
    }

    pub fn add_non_blocking(
        &mut self,
        timestamp: f64,
        cmd: NonBlockingCommand,
        description: impl Into<String>,
    ) -> Result<&mut Self, ShowError> {
        self.add_event(timestamp, Commands::non_blocking(cmd), description)
    }

    /// Appends a batch: every command starts together on the worker pool.
    pub fn add_blocking_batch(
        &mut self,
        timestamp: f64,
        cmds: impl IntoIterator<Item = BlockingCommand>,
        description: impl Into<String>,
    ) -> Result<&mut Self, ShowError> {
        let event =
            TimelineEvent::batch(timestamp, Commands::blocking_batch(cmds), description)?;
        self.push(event);
        Ok(self)
    }

    /// Appends a batch of concurrently awaited commands.
    pub fn add_non_blocking_batch(
        &mut self,
        timestamp: f64,
        cmds: impl IntoIterator<Item = NonBlockingCommand>,
        description: impl Into<String>,
    ) -> Result<&mut Self, ShowError> {
        let event =
            TimelineEvent::batch(timestamp, Commands::non_blocking_batch(cmds), description)?;
        self.push(event);
        Ok(self)
    }

    /// Appends one single-command event per `(timestamp, command, description)`.
    ///
    /// Stops at the first invalid entry; entries before it stay appended.
    pub fn add_blocking_events<I, D>(&mut self, events: I) -> Result<&mut Self, ShowError>
    where
        I: IntoIterator<Item = (f64, BlockingCommand, D)>,
        D: Into<String>,
    {
        for (timestamp, cmd, description) in events {
            self.add_blocking(timestamp, cmd, description)?;
        }
        Ok(self)
    }

    /// Non-blocking counterpart of [`Show::add_blocking_events`].
    pub fn add_non_blocking_events<I, D>(&mut self, events: I) -> Result<&mut Self, ShowError>
    where
        I: IntoIterator<Item = (f64, NonBlockingCommand, D)>,
        D: Into<String>,
    {
        for (timestamp, cmd, description) in events {
            self.add_non_blocking(timestamp, cmd, description)?;
        }
        Ok(self)
    }

    fn push(&mut self, event: TimelineEvent) {
        if event.timestamp() > self.duration {
            warn!(
                show = %self.name,
                cue = %event.description(),
                offset = event.timestamp(),
                duration = self.duration,
                "event scheduled past show duration"
            );
        }
        self.timeline.append(event);
    }
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "show '{}' (duration {}s, {} events)",
            self.name,
            self.duration,
            self.timeline.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{blocking, non_blocking};
    use crate::Mode;

    #[test]
    fn rejects_invalid_duration() {
        for d in [-1.0, f64::NAN, f64::INFINITY] {
            let err = Show::new("bad", d).unwrap_err();
            assert_eq!(err.as_label(), "invalid_duration");
        }
        assert!(Show::new("zero", 0.0).is_ok());
    }

    #[test]
    fn builder_helpers_append_in_order() {
        let mut show = Show::new("demo", 10.0).unwrap();
        show.add_blocking(2.0, blocking(|| Ok(())), "b")
            .unwrap()
            .add_non_blocking(1.0, non_blocking(|| async { Ok(()) }), "a")
            .unwrap()
            .add_blocking_batch(3.0, vec![blocking(|| Ok(())), blocking(|| Ok(()))], "c")
            .unwrap();

        let events = show.timeline().events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].description(), "a");
        assert_eq!(events[0].mode(), Mode::NonBlocking);
        assert_eq!(events[1].description(), "b");
        assert!(events[2].is_batch());
        assert_eq!(events[2].commands().len(), 2);
    }

    #[test]
    fn bulk_helpers_stop_at_first_invalid() {
        let mut show = Show::new("bulk", 5.0).unwrap();
        let err = show
            .add_blocking_events(vec![
                (0.0, blocking(|| Ok(())), "ok"),
                (-1.0, blocking(|| Ok(())), "bad"),
                (2.0, blocking(|| Ok(())), "never"),
            ])
            .unwrap_err();
        assert_eq!(err.as_label(), "invalid_timestamp");
        assert_eq!(show.timeline().len(), 1);

        show.add_non_blocking_events([
            (1.0, non_blocking(|| async { Ok(()) }), "x"),
            (1.0, non_blocking(|| async { Ok(()) }), "y"),
        ])
        .unwrap();
        assert_eq!(show.timeline().len(), 3);
    }

    #[test]
    fn events_past_duration_are_kept() {
        let mut show = Show::new("short", 1.0).unwrap();
        show.add_blocking(5.0, blocking(|| Ok(())), "late").unwrap();
        assert_eq!(show.timeline().last_timestamp(), Some(5.0));
    }

    #[test]
    fn metadata_and_display() {
        let show = Show::new("finale", 10.0)
            .unwrap()
            .with_description("last")
            .with_metadata("genre", "rock")
            .with_metadata("artist", "someone");
        assert_eq!(show.description(), "last");
        let keys: Vec<&String> = show.metadata().keys().collect();
        assert_eq!(keys, vec!["artist", "genre"]);
        assert_eq!(show.to_string(), "show 'finale' (duration 10s, 0 events)");
    }
}
