//! # tabletop-engine
//!
//! A turn-based tabletop match engine whose rules are authored as short
//! textual clauses rather than hard-coded logic.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: No hardcoded phases, zones, or component types.
//!    Matches configure these at startup via `MatchSetup`.
//!
//! 2. **Text Is the Wire Format**: Conditions, value expressions, entity
//!    selectors, and commands all compile from ASCII clauses at match
//!    start and are interpreted against mutable match state.
//!
//! 3. **Graceful Degradation**: A broken clause is logged and dropped, a
//!    runtime miss yields a sentinel value - the match keeps running. The
//!    single fatal case is a reserved-variable collision at setup.
//!
//! 4. **Cooperative Execution**: The scheduler advances one suspension
//!    point per tick; cancellation is flag-based and observed at
//!    checkpoints, never unwound through panics.
//!
//! ## Modules
//!
//! - `core`: identifiers, fields, tags, variables, RNG, setup, errors
//! - `components`: the tagged, fielded entities rules act upon
//! - `zones`: ordered/positional containers of components
//! - `script`: the embedded language (getter, condition, selector, command)
//! - `rules`: trigger label + condition tree + command list
//! - `triggers`: lifecycle labels, firing context, dispatcher indexes
//! - `scheduler`: match state and the turn/phase/subphase loop

pub mod components;
pub mod core;
pub mod rules;
pub mod scheduler;
pub mod script;
pub mod triggers;
pub mod zones;

// Re-export commonly used types
pub use crate::core::{
    reserved, ComponentId, ComponentSpec, FieldValue, Fields, MatchRng, MatchSetup, RuleId,
    RuleSpec, ScriptError, SetupError, TagSet, VariableStore, ZoneId, ZoneSpec,
};

pub use crate::components::Component;

pub use crate::zones::{Placement, Zone, ZoneLayout};

pub use crate::script::{
    ArithOp, CmpOp, Command, CommandRegistry, ComponentSelector, Condition, EvalContext, Getter,
    GetterRegistry, MoveOptions, RuleSelector, Value, ZoneSelector,
};

pub use crate::rules::Rule;

pub use crate::triggers::{TriggerCallback, TriggerContext, TriggerDispatcher, TriggerLabel};

pub use crate::scheduler::{CommandQueue, MatchScheduler, MatchState, Tick};
