//! # Hooks: the manager's capability table.
//!
//! Every entry is optional; an absent hook is simply skipped. The table is built once,
//! handed to [`ManagerBuilder::with_hooks`](crate::ManagerBuilder::with_hooks) and
//! shared read-only by every run.
//!
//! ```text
//! admission ──► can_run ──deny──► (no hooks, RunOutcome::Denied)
//!                  │allow
//!                  ▼
//!              pre_show ──fail──► on_error(Show) ──┐
//!                  │ok                             │
//!                  ▼                               │
//!   loop:  event ok ──► on_event                   │
//!          event err ─► on_error(Event)            │
//!                  │                               │
//!                  ▼                               ▼
//!              post_show  (exactly once, every admitted run)
//! ```

use std::fmt;

use super::call::{Admission, ErrorCall, EventCall, ShowCall};
use super::hook::Hook;

/// Optional lifecycle callbacks, generic over the caller context `C`.
pub struct Hooks<C = ()> {
    pub(crate) can_run: Option<Hook<ShowCall<C>, Admission>>,
    pub(crate) pre_show: Option<Hook<ShowCall<C>>>,
    pub(crate) post_show: Option<Hook<ShowCall<C>>>,
    pub(crate) on_event: Option<Hook<EventCall<C>>>,
    pub(crate) on_error: Option<Hook<ErrorCall<C>>>,
}

impl<C> Default for Hooks<C> {
    fn default() -> Self {
        Self {
            can_run: None,
            pre_show: None,
            post_show: None,
            on_event: None,
            on_error: None,
        }
    }
}

impl<C> Clone for Hooks<C> {
    fn clone(&self) -> Self {
        Self {
            can_run: self.can_run.clone(),
            pre_show: self.pre_show.clone(),
            post_show: self.post_show.clone(),
            on_event: self.on_event.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<C> Hooks<C> {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admission gate. A failing or panicking gate lets the run proceed.
    pub fn with_can_run(mut self, hook: Hook<ShowCall<C>, Admission>) -> Self {
        self.can_run = Some(hook);
        self
    }

    /// Runs once before the loop; a failure skips the loop.
    pub fn with_pre_show(mut self, hook: Hook<ShowCall<C>>) -> Self {
        self.pre_show = Some(hook);
        self
    }

    /// Runs exactly once when an admitted run ends, whatever the reason.
    pub fn with_post_show(mut self, hook: Hook<ShowCall<C>>) -> Self {
        self.post_show = Some(hook);
        self
    }

    pub fn with_on_event(mut self, hook: Hook<EventCall<C>>) -> Self {
        self.on_event = Some(hook);
        self
    }

    pub fn with_on_error(mut self, hook: Hook<ErrorCall<C>>) -> Self {
        self.on_error = Some(hook);
        self
    }
}

impl<C> fmt::Debug for Hooks<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("can_run", &self.can_run.is_some())
            .field("pre_show", &self.pre_show.is_some())
            .field("post_show", &self.post_show.is_some())
            .field("on_event", &self.on_event.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
