//! Core engine types: identities, fields, tags, variables, RNG, setup.
//!
//! This module contains the fundamental building blocks that are
//! game-agnostic. Matches configure structure via `MatchSetup` rather than
//! modifying the core.

pub mod entity;
pub mod error;
pub mod fields;
pub mod rng;
pub mod setup;
pub mod tags;
pub mod vars;

pub use entity::{ComponentId, RuleId, ZoneId};
pub use error::{ScriptError, SetupError};
pub use fields::{format_number, FieldValue, Fields};
pub use rng::MatchRng;
pub use setup::{ComponentSpec, MatchSetup, RuleSpec, ZoneSpec};
pub use tags::TagSet;
pub use vars::{reserved, VariableStore};
