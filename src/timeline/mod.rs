//! # Timeline: ordered scheduling records of a show.
//!
//! - [`TimelineEvent`] - validated, immutable record binding commands to a timestamp
//! - [`Timeline`] - events sorted by `(timestamp, sequence_id)`
//! - [`Playback`] - per-run cursor returning each due event exactly once

mod event;
#[allow(clippy::module_inception)]
mod timeline;

pub use event::TimelineEvent;
pub use timeline::{Playback, Timeline};
