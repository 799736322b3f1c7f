//! Trigger system: lifecycle events routed to rules and callbacks.
//!
//! ## Key Components
//!
//! - [`TriggerLabel`]: the closed set of lifecycle events
//! - [`TriggerContext`]: what a firing is about
//! - [`TriggerDispatcher`]: per-label rule indexes plus external callbacks
//!
//! The firing pass itself (pre-check, ordered execution, "rule activated"
//! recursion) is driven by `scheduler::MatchScheduler`.

pub mod context;
pub mod dispatcher;
pub mod label;

pub use context::TriggerContext;
pub use dispatcher::{TriggerCallback, TriggerDispatcher};
pub use label::TriggerLabel;
