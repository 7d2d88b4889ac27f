//! # Ordered event storage and due-event resolution.
//!
//! [`Timeline`] keeps its events sorted by `(timestamp, sequence_id)`. It is built
//! before a run and read-only while the run is active; the per-run "fired" state
//! lives in a [`Playback`] cursor so the same timeline can be replayed.
//!
//! ## Due resolution
//! ```text
//! events:   [0.0 start] [1.0 mid] [1.0 mid-2] [2.0 end]
//!                         ▲
//!                     watermark (Playback::next)
//!
//! due(at = 0.97, precision = 0.05) → [mid, mid-2]   (1.0 <= 1.02)
//! ```
//!
//! Due events are always a prefix of the unfired suffix, so the fired set of a run
//! is fully described by a watermark index.

use std::cmp::Ordering;
use std::slice;
use std::sync::Arc;

use crate::commands::Commands;
use crate::error::ShowError;

use super::event::TimelineEvent;

/// Ordered, append-only (until [`clear`](Timeline::clear)) collection of events.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    events: Vec<Arc<TimelineEvent>>,
    next_seq: u64,
}

impl Timeline {
    /// Creates an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `event`, stamping its `sequence_id`, and returns that id.
    ///
    /// The event lands after every event with a lower or equal timestamp, so
    /// same-timestamp events keep insertion order.
    pub fn append(&mut self, event: TimelineEvent) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;

        let event = event.stamped(seq);
        let at = self
            .events
            .partition_point(|e| e.order(&event) == Ordering::Less);
        self.events.insert(at, Arc::new(event));
        seq
    }

    /// Validates and appends a single-command event.
    pub fn add_event(
        &mut self,
        timestamp: f64,
        commands: Commands,
        description: impl Into<String>,
    ) -> Result<u64, ShowError> {
        Ok(self.append(TimelineEvent::new(timestamp, commands, description)?))
    }

    /// Validates and appends a batch event.
    pub fn add_batch(
        &mut self,
        timestamp: f64,
        commands: Commands,
        description: impl Into<String>,
    ) -> Result<u64, ShowError> {
        Ok(self.append(TimelineEvent::batch(timestamp, commands, description)?))
    }

    /// Starts a fresh run over this timeline: nothing has fired yet.
    pub fn playback(&self) -> Playback {
        Playback {
            events: self.events.clone(),
            next: 0,
        }
    }

    /// Sorted view of all events.
    pub fn events(&self) -> &[Arc<TimelineEvent>] {
        &self.events
    }

    /// Iterates events in firing order.
    pub fn iter(&self) -> slice::Iter<'_, Arc<TimelineEvent>> {
        self.events.iter()
    }

    /// Events with `start <= timestamp < end`.
    pub fn events_between(&self, start: f64, end: f64) -> &[Arc<TimelineEvent>] {
        let lo = self.events.partition_point(|e| e.timestamp() < start);
        let hi = self.events.partition_point(|e| e.timestamp() < end);
        &self.events[lo..hi.max(lo)]
    }

    /// Events within `tolerance` seconds of `at` (inclusive on both sides).
    pub fn events_at(&self, at: f64, tolerance: f64) -> &[Arc<TimelineEvent>] {
        let tolerance = tolerance.abs();
        let lo = self.events.partition_point(|e| e.timestamp() < at - tolerance);
        let hi = self.events.partition_point(|e| e.timestamp() <= at + tolerance);
        &self.events[lo..hi.max(lo)]
    }

    /// Timestamp of the last event, if any.
    pub fn last_timestamp(&self) -> Option<f64> {
        self.events.last().map(|e| e.timestamp())
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if the timeline holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Removes all events. Sequence ids keep increasing.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Arc<TimelineEvent>;
    type IntoIter = slice::Iter<'a, Arc<TimelineEvent>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Per-run cursor over a timeline snapshot.
///
/// Holds the run's fired markers; each event is returned by [`due`](Playback::due)
/// exactly once.
#[derive(Debug)]
pub struct Playback {
    events: Vec<Arc<TimelineEvent>>,
    next: usize,
}

impl Playback {
    /// Returns, in order, every unfired event with `timestamp <= at + precision`
    /// and marks them fired.
    ///
    /// `precision` absorbs scheduler wake-up jitter; a negative value is treated as zero.
    pub fn due(&mut self, at: f64, precision: f64) -> Vec<Arc<TimelineEvent>> {
        let horizon = at + precision.max(0.0);
        let pending = &self.events[self.next..];
        let count = pending.partition_point(|e| e.timestamp() <= horizon);
        let fired = pending[..count].to_vec();
        self.next += count;
        fired
    }

    /// True once every event has fired.
    pub fn is_exhausted(&self) -> bool {
        self.next >= self.events.len()
    }

    /// Number of events already fired in this run.
    pub fn fired(&self) -> usize {
        self.next
    }

    /// Number of events still pending.
    pub fn remaining(&self) -> usize {
        self.events.len() - self.next
    }

    /// Timestamp of the next pending event.
    pub fn next_timestamp(&self) -> Option<f64> {
        self.events.get(self.next).map(|e| e.timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{blocking, non_blocking};

    fn noop() -> Commands {
        Commands::blocking(blocking(|| Ok(())))
    }

    fn timeline(stamps: &[(f64, &str)]) -> Timeline {
        let mut t = Timeline::new();
        for (ts, desc) in stamps {
            t.add_event(*ts, noop(), *desc).unwrap();
        }
        t
    }

    fn descriptions(events: &[Arc<TimelineEvent>]) -> Vec<&str> {
        events.iter().map(|e| e.description()).collect()
    }

    #[test]
    fn events_sorted_by_timestamp() {
        let t = timeline(&[(5.0, "5"), (1.0, "1"), (9.0, "9"), (0.0, "0")]);
        let stamps: Vec<f64> = t.iter().map(|e| e.timestamp()).collect();
        assert_eq!(stamps, vec![0.0, 1.0, 5.0, 9.0]);
    }

    #[test]
    fn same_timestamp_keeps_insertion_order() {
        let t = timeline(&[(2.0, "a"), (1.0, "x"), (2.0, "b"), (2.0, "c"), (1.0, "y")]);
        assert_eq!(descriptions(t.events()), vec!["x", "y", "a", "b", "c"]);
        let seqs: Vec<u64> = t.iter().map(|e| e.sequence_id()).collect();
        assert_eq!(seqs, vec![1, 4, 0, 2, 3]);
    }

    #[test]
    fn ties_after_clear_still_follow_insertion() {
        let mut t = timeline(&[(1.0, "old")]);
        t.clear();
        t.add_event(3.0, noop(), "a").unwrap();
        t.add_event(3.0, noop(), "b").unwrap();
        t.add_event(0.0, noop(), "z").unwrap();
        assert_eq!(descriptions(t.events()), vec!["z", "a", "b"]);
        assert_eq!(t.events()[1].sequence_id(), 1);
    }

    #[test]
    fn append_rejects_invalid_timestamp() {
        let mut t = Timeline::new();
        assert!(t.add_event(-0.5, noop(), "neg").is_err());
        assert!(t.add_event(f64::NAN, noop(), "nan").is_err());
        assert!(t.is_empty());
    }

    #[test]
    fn due_returns_prefix_with_precision() {
        let t = timeline(&[(0.0, "start"), (1.0, "mid"), (2.0, "end")]);
        let mut p = t.playback();

        assert_eq!(descriptions(&p.due(0.0, 0.05)), vec!["start"]);
        assert!(p.due(0.5, 0.05).is_empty());
        // Woke slightly early: precision still catches it.
        assert_eq!(descriptions(&p.due(0.96, 0.05)), vec!["mid"]);
        assert!(!p.is_exhausted());
        assert_eq!(descriptions(&p.due(2.5, 0.05)), vec!["end"]);
        assert!(p.is_exhausted());
        assert!(p.due(10.0, 0.05).is_empty());
    }

    #[test]
    fn late_poll_returns_all_overdue_in_order() {
        let t = timeline(&[(0.3, "c"), (0.1, "a"), (0.2, "b")]);
        let mut p = t.playback();
        assert_eq!(descriptions(&p.due(5.0, 0.0)), vec!["a", "b", "c"]);
        assert_eq!(p.fired(), 3);
        assert_eq!(p.remaining(), 0);
    }

    #[test]
    fn same_timestamp_events_fire_together() {
        let t = timeline(&[(1.0, "first"), (1.0, "second")]);
        let mut p = t.playback();
        assert_eq!(descriptions(&p.due(1.0, 0.0)), vec!["first", "second"]);
    }

    #[test]
    fn each_event_fires_once_and_playback_is_replayable() {
        let t = timeline(&[(0.0, "a"), (0.5, "b")]);

        let mut first = t.playback();
        let mut seen = Vec::new();
        for step in 0..20 {
            seen.extend(first.due(step as f64 * 0.1, 0.05));
        }
        assert_eq!(descriptions(&seen), vec!["a", "b"]);
        assert!(first.is_exhausted());

        let mut replay = t.playback();
        assert_eq!(replay.fired(), 0);
        assert_eq!(descriptions(&replay.due(1.0, 0.0)), vec!["a", "b"]);
    }

    #[test]
    fn empty_timeline_is_exhausted_immediately() {
        let t = Timeline::new();
        assert!(t.playback().is_exhausted());
        assert_eq!(t.last_timestamp(), None);
    }

    #[test]
    fn events_between_and_at() {
        let t = timeline(&[(1.0, "1"), (1.001, "1.001"), (5.0, "5"), (10.0, "10")]);
        assert_eq!(descriptions(t.events_between(2.0, 8.0)), vec!["5"]);
        assert_eq!(descriptions(t.events_between(1.0, 5.0)), vec!["1", "1.001"]);
        assert!(t.events_between(8.0, 2.0).is_empty());
        assert_eq!(descriptions(t.events_at(1.0, 0.01)), vec!["1", "1.001"]);
        assert_eq!(descriptions(t.events_at(1.0, 0.0)), vec!["1"]);
    }

    #[test]
    fn clear_keeps_sequence_monotonic() {
        let mut t = timeline(&[(1.0, "a"), (2.0, "b")]);
        assert_eq!(t.len(), 2);
        t.clear();
        assert_eq!(t.len(), 0);
        let seq = t
            .add_event(0.0, Commands::non_blocking(non_blocking(|| async { Ok(()) })), "c")
            .unwrap();
        assert_eq!(seq, 2);
    }

    #[test]
    fn playback_is_a_snapshot() {
        let mut t = timeline(&[(0.0, "a")]);
        let mut p = t.playback();
        t.add_event(0.0, noop(), "late").unwrap();
        assert_eq!(descriptions(&p.due(1.0, 0.0)), vec!["a"]);
        assert!(p.is_exhausted());
    }
}
