//! # Manager configuration.
//!
//! Provides [`ManagerConfig`], the centralized settings of a [`Manager`](crate::Manager).
//! It is consumed once, by [`Manager::builder`](crate::Manager::builder).
//!
//! ## Sentinel values
//! - `max_workers = 0` → unlimited blocking workers (semaphore sized to its maximum)
//! - `time_precision = 0s` → clamped to 1ms so the loop always yields

use std::time::Duration;

use tokio::sync::Semaphore;

/// Global configuration for the show manager.
///
/// ## Field semantics
/// - `max_workers`: blocking worker pool size (`0` = unlimited)
/// - `time_precision`: loop poll interval and due-tolerance
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `handle_signals`: install SIGINT/SIGTERM (Ctrl-C) watchers per run
/// - `fail_fast`: end the run on the first failed event
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over sentinel checks.
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Maximum number of blocking commands executing at once.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = at most `n` blocking commands run simultaneously; extra
    ///   submissions of a batch wait for a free worker.
    pub max_workers: usize,

    /// Scheduling granularity of the run loop.
    ///
    /// The loop sleeps this long between polls, and an event counts as due when
    /// `timestamp <= elapsed + time_precision`. It also bounds cancellation latency.
    pub time_precision: Duration,

    /// Capacity of the run-event broadcast channel.
    ///
    /// Subscribers lagging by more than `bus_capacity` events skip older ones.
    pub bus_capacity: usize,

    /// Whether each run listens for process termination signals.
    ///
    /// A signal shuts the manager down: the active run is interrupted and further
    /// runs are refused with `ShowError::ShuttingDown`.
    pub handle_signals: bool,

    /// End a run as failed when an event fails (after `on_error`).
    ///
    /// When `false`, failures are reported and the loop continues.
    pub fail_fast: bool,
}

impl ManagerConfig {
    /// Returns the worker limit as a semaphore permit count.
    #[inline]
    pub fn worker_limit(&self) -> usize {
        if self.max_workers == 0 {
            Semaphore::MAX_PERMITS
        } else {
            self.max_workers.min(Semaphore::MAX_PERMITS)
        }
    }

    /// Returns the poll interval, never shorter than 1ms.
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        self.time_precision.max(Duration::from_millis(1))
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for ManagerConfig {
    /// Default configuration:
    ///
    /// - `max_workers = 20`
    /// - `time_precision = 50ms`
    /// - `bus_capacity = 1024`
    /// - `handle_signals = true`
    /// - `fail_fast = false` (keep playing after a failed cue)
    fn default() -> Self {
        Self {
            max_workers: 20,
            time_precision: Duration::from_millis(50),
            bus_capacity: 1024,
            handle_signals: true,
            fail_fast: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ManagerConfig::default();
        assert_eq!(cfg.max_workers, 20);
        assert_eq!(cfg.worker_limit(), 20);
        assert_eq!(cfg.poll_interval(), Duration::from_millis(50));
        assert!(cfg.handle_signals);
        assert!(!cfg.fail_fast);
    }

    #[test]
    fn sentinels() {
        let cfg = ManagerConfig {
            max_workers: 0,
            time_precision: Duration::ZERO,
            bus_capacity: 0,
            ..ManagerConfig::default()
        };
        assert_eq!(cfg.worker_limit(), Semaphore::MAX_PERMITS);
        assert_eq!(cfg.poll_interval(), Duration::from_millis(1));
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
