//! Zone system - ordered, positional containers.
//!
//! Zones are **match-configured**, not hardcoded. The entity provider
//! defines them ("Play", "Hand", "DiscardPile", a 3x3 board grid, ...) via
//! `ZoneSpec` at setup.
//!
//! ## Key Types
//!
//! - `Zone`: occupant order, tags, layout, push/pop/shuffle
//! - `ZoneLayout`: linear or grid-addressed
//! - `Placement`: top / bottom / requested grid slot

pub mod zone;

pub use zone::{Placement, Zone, ZoneLayout};
