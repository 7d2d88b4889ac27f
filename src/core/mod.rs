//! Runtime core: scheduling, dispatch and run lifecycle.
//!
//! The public API from this module is [`Manager`] (with [`ManagerBuilder`] and
//! [`ManagerConfig`]), the [`Executor`] and the run reports.
//!
//! Internal modules:
//! - [`runner`]: drives one admitted run (pre-show, loop, post-show) and publishes events;
//! - [`manager`]: registry, admission, preemption, rotation and shutdown;
//! - [`executor`]: bounded blocking pool and non-blocking dispatch;
//! - [`shutdown`]: cross-platform termination signal handling.

mod builder;
mod config;
mod executor;
mod manager;
mod report;
mod runner;
mod shutdown;

pub use builder::ManagerBuilder;
pub use config::ManagerConfig;
pub use executor::Executor;
pub use manager::Manager;
pub use report::{RotationReport, RunOutcome, RunReport};
