//! Arguments handed to lifecycle hooks.
//!
//! Every payload carries the show and the caller context of the current run. They
//! are cheap to clone (`Arc`s only) and do not require `C: Clone`.

use std::sync::Arc;

use crate::error::ShowError;
use crate::show::Show;
use crate::timeline::TimelineEvent;

/// Payload of `can_run`, `pre_show` and `post_show`.
#[derive(Debug)]
pub struct ShowCall<C> {
    pub show: Arc<Show>,
    pub context: Arc<C>,
}

impl<C> Clone for ShowCall<C> {
    fn clone(&self) -> Self {
        Self {
            show: Arc::clone(&self.show),
            context: Arc::clone(&self.context),
        }
    }
}

/// Payload of `on_event`: the event that was just dispatched successfully.
#[derive(Debug)]
pub struct EventCall<C> {
    pub event: Arc<TimelineEvent>,
    pub show: Arc<Show>,
    pub context: Arc<C>,
}

impl<C> Clone for EventCall<C> {
    fn clone(&self) -> Self {
        Self {
            event: Arc::clone(&self.event),
            show: Arc::clone(&self.show),
            context: Arc::clone(&self.context),
        }
    }
}

/// Where a reported failure originated.
#[derive(Debug, Clone)]
pub enum ErrorSite {
    /// A timeline event (dispatch failure or `on_event` failure).
    Event(Arc<TimelineEvent>),
    /// The show itself (pre-show failure).
    Show,
}

/// Payload of `on_error`.
#[derive(Debug)]
pub struct ErrorCall<C> {
    pub error: ShowError,
    pub site: ErrorSite,
    pub show: Arc<Show>,
    pub context: Arc<C>,
}

impl<C> Clone for ErrorCall<C> {
    fn clone(&self) -> Self {
        Self {
            error: self.error.clone(),
            site: self.site.clone(),
            show: Arc::clone(&self.show),
            context: Arc::clone(&self.context),
        }
    }
}

/// Decision of the `can_run` gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny { reason: String },
}

impl Admission {
    /// Denies the run with a reason shown in reports and logs.
    pub fn deny(reason: impl Into<String>) -> Self {
        Admission::Deny {
            reason: reason.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allow)
    }
}

impl From<bool> for Admission {
    fn from(allowed: bool) -> Self {
        if allowed {
            Admission::Allow
        } else {
            Admission::deny("denied by can_run")
        }
    }
}
