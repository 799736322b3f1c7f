//! Entity identification.
//!
//! Components, zones, and rules each get a sequential identifier at match
//! start. Identities are immutable for the life of the match: the scheduler
//! assigns them in declaration order when `MatchScheduler::start` indexes
//! the pools, and scripts may refer to them by number (the `i:` selector
//! filter) or through variables holding an id.

use serde::{Deserialize, Serialize};

/// Unique identifier for a component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

impl ComponentId {
    /// Create a new component ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Component({})", self.0)
    }
}

/// Unique identifier for a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

impl ZoneId {
    /// Create a new zone ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Zone({})", self.0)
    }
}

/// Unique identifier for a rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(pub u32);

impl RuleId {
    /// Create a new rule ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rule({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_construction() {
        assert_eq!(ComponentId::new(5).raw(), 5);
        assert_eq!(ZoneId::new(3).raw(), 3);
        assert_eq!(RuleId::new(9).raw(), 9);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ComponentId(42)), "Component(42)");
        assert_eq!(format!("{}", ZoneId(1)), "Zone(1)");
        assert_eq!(format!("{}", RuleId(7)), "Rule(7)");
    }

    #[test]
    fn test_serialization() {
        let id = ComponentId(123);
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: ComponentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
