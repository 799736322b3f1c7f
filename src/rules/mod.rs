//! Text-authored rules.
//!
//! A rule pairs a trigger label with a compiled condition tree and command
//! list. The engine never interprets game-specific concepts directly - all
//! game behavior arrives as rule text.

pub mod rule;

pub use rule::Rule;
