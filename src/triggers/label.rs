//! Trigger labels.
//!
//! The closed set of lifecycle events the engine fires. Rules and external
//! callbacks are both dispatched by label; the "what just happened"
//! context for each firing is written into the reserved variables before
//! rules evaluate (see `core::vars::reserved`).

use serde::{Deserialize, Serialize};

/// A lifecycle event used as the dispatch key for rules and callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerLabel {
    /// The match began.
    MatchStarted,
    /// The match finished.
    MatchEnded,
    /// A turn began.
    TurnStarted,
    /// A turn finished.
    TurnEnded,
    /// A phase (or subphase) began.
    PhaseStarted,
    /// A phase (or subphase) finished.
    PhaseEnded,
    /// A component was used.
    ComponentUsed,
    /// A zone was used.
    ZoneUsed,
    /// A component was pushed into a zone.
    ComponentEnteredZone,
    /// A component was popped from a zone.
    ComponentLeftZone,
    /// A message was sent.
    MessageSent,
    /// A named action was used.
    ActionUsed,
    /// A variable changed value.
    VariableChanged,
    /// A rule matched and is about to run its commands.
    RuleActivated,
}

impl std::fmt::Display for TriggerLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TriggerLabel::MatchStarted => "MatchStarted",
            TriggerLabel::MatchEnded => "MatchEnded",
            TriggerLabel::TurnStarted => "TurnStarted",
            TriggerLabel::TurnEnded => "TurnEnded",
            TriggerLabel::PhaseStarted => "PhaseStarted",
            TriggerLabel::PhaseEnded => "PhaseEnded",
            TriggerLabel::ComponentUsed => "ComponentUsed",
            TriggerLabel::ZoneUsed => "ZoneUsed",
            TriggerLabel::ComponentEnteredZone => "ComponentEnteredZone",
            TriggerLabel::ComponentLeftZone => "ComponentLeftZone",
            TriggerLabel::MessageSent => "MessageSent",
            TriggerLabel::ActionUsed => "ActionUsed",
            TriggerLabel::VariableChanged => "VariableChanged",
            TriggerLabel::RuleActivated => "RuleActivated",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", TriggerLabel::PhaseStarted), "PhaseStarted");
        assert_eq!(
            format!("{}", TriggerLabel::ComponentEnteredZone),
            "ComponentEnteredZone"
        );
    }

    #[test]
    fn test_serialization() {
        let label = TriggerLabel::RuleActivated;
        let json = serde_json::to_string(&label).unwrap();
        let deserialized: TriggerLabel = serde_json::from_str(&json).unwrap();
        assert_eq!(label, deserialized);
    }
}
