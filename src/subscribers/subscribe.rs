//! # Run event subscriber trait.
//!
//! Provides [`Subscribe`], the extension point for plugging observers into the manager.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently of the show loop)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as `RunEventKind::SubscriberPanicked`)
//!
//! ## Rules
//! - A slow subscriber only affects its own queue
//! - Queue overflow drops the event for this subscriber only and publishes
//!   `RunEventKind::SubscriberOverflow`
//! - Events are processed sequentially (FIFO) per subscriber
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use showvisor::{RunEvent, RunEventKind, Subscribe};
//!
//! struct CueCounter(std::sync::atomic::AtomicUsize);
//!
//! #[async_trait]
//! impl Subscribe for CueCounter {
//!     async fn on_event(&self, ev: &RunEvent) {
//!         if matches!(ev.kind, RunEventKind::EventFired) {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "cue-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::RunEvent;

/// Observer of run events.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the runtime.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event, on the subscriber's own worker task.
    async fn on_event(&self, event: &RunEvent);

    /// Name used in logs and in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity (clamped to at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
