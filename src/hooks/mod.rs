//! # Lifecycle hooks.
//!
//! - [`Hook`] - tagged blocking / non-blocking callback
//! - [`Hooks`] - optional capability table consulted by every run
//! - [`ShowCall`], [`EventCall`], [`ErrorCall`] - hook payloads
//! - [`Admission`] - result of the `can_run` gate

mod call;
mod hook;
mod set;

pub use call::{Admission, ErrorCall, ErrorSite, EventCall, ShowCall};
pub use hook::Hook;
pub use set::Hooks;
