//! Match setup configuration.
//!
//! The entity provider describes a match with these spec types, then hands
//! the lot to `MatchScheduler::start`. The engine never hardcodes phases,
//! zones, or rule vocabularies beyond the command keywords - matches define
//! their structure here.
//!
//! Specs are pre-identity: the scheduler assigns sequential ids in
//! declaration order when the match starts.

use serde::{Deserialize, Serialize};

use crate::core::fields::FieldValue;
use crate::triggers::TriggerLabel;
use crate::zones::ZoneLayout;

/// Description of one component supplied by the entity provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Tags (types, keywords, markers).
    pub tags: Vec<String>,

    /// Named fields with typed values.
    pub fields: Vec<(String, FieldValue)>,

    /// Starting zone, as an index into `MatchSetup::zones`.
    /// `None` leaves the component outside every zone.
    pub zone: Option<usize>,

    /// Component-level rules (abilities carried by this component).
    pub rules: Vec<RuleSpec>,
}

impl ComponentSpec {
    /// Create an empty component spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add a field (builder pattern).
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Place the component in a starting zone (builder pattern).
    #[must_use]
    pub fn in_zone(mut self, zone_index: usize) -> Self {
        self.zone = Some(zone_index);
        self
    }

    /// Attach a component-level rule (builder pattern).
    #[must_use]
    pub fn with_rule(mut self, rule: RuleSpec) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Description of one zone supplied by the entity provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ZoneSpec {
    /// Tags ("Play", "Hand", "Deck", ...).
    pub tags: Vec<String>,

    /// Linear (default) or grid-addressed layout.
    pub layout: ZoneLayout,
}

impl ZoneSpec {
    /// Create a linear zone spec.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tags: Vec::new(),
            layout: ZoneLayout::Linear,
        }
    }

    /// Add a tag (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Use a grid layout (builder pattern).
    #[must_use]
    pub fn grid(mut self, columns: u32, rows: u32) -> Self {
        self.layout = ZoneLayout::Grid { columns, rows };
        self
    }
}

impl Default for ZoneSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// Description of one rule: a trigger label plus condition and command text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Human-readable name (for logs and the `activatedRule` variable).
    pub name: String,

    /// Tags, queryable through `r(...)` selectors.
    pub tags: Vec<String>,

    /// Lifecycle event this rule listens for.
    pub trigger: TriggerLabel,

    /// Boolean clause; empty means "always".
    pub condition: String,

    /// `;`-separated command clauses to run when the condition holds.
    pub commands: String,
}

impl RuleSpec {
    /// Create a rule spec for a trigger, with no condition or commands.
    pub fn new(name: impl Into<String>, trigger: TriggerLabel) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            trigger,
            condition: String::new(),
            commands: String::new(),
        }
    }

    /// Set the condition clause (builder pattern).
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    /// Set the command clauses (builder pattern).
    #[must_use]
    pub fn with_commands(mut self, commands: impl Into<String>) -> Self {
        self.commands = commands.into();
        self
    }

    /// Add a tag (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Everything `MatchScheduler::start` needs to run a match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchSetup {
    /// Phase names, run in order every turn.
    pub phases: Vec<String>,

    /// Game-level rules, fired in declaration order.
    pub rules: Vec<RuleSpec>,

    /// Components, identity-assigned in declaration order.
    pub components: Vec<ComponentSpec>,

    /// Zones, identity-assigned in declaration order.
    pub zones: Vec<ZoneSpec>,

    /// Game-level variables. Names must not collide with reserved
    /// built-ins; a collision aborts `start`.
    pub variables: Vec<(String, String)>,

    /// Which match in a series this is (exposed as `matchNumber`).
    pub match_number: u32,

    /// RNG seed for shuffles and `rn(a,b)`.
    pub seed: u64,
}

impl MatchSetup {
    /// Create a setup with the given phases and nothing else.
    pub fn new(phases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            phases: phases.into_iter().map(Into::into).collect(),
            rules: Vec::new(),
            components: Vec::new(),
            zones: Vec::new(),
            variables: Vec::new(),
            match_number: 1,
            seed: 0,
        }
    }

    /// Add a game-level rule (builder pattern).
    #[must_use]
    pub fn with_rule(mut self, rule: RuleSpec) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add a component (builder pattern).
    #[must_use]
    pub fn with_component(mut self, component: ComponentSpec) -> Self {
        self.components.push(component);
        self
    }

    /// Add a zone (builder pattern).
    #[must_use]
    pub fn with_zone(mut self, zone: ZoneSpec) -> Self {
        self.zones.push(zone);
        self
    }

    /// Add a game-level variable (builder pattern).
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }

    /// Set the match number (builder pattern).
    #[must_use]
    pub fn with_match_number(mut self, n: u32) -> Self {
        self.match_number = n;
        self
    }

    /// Set the RNG seed (builder pattern).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_spec_builder() {
        let spec = ComponentSpec::new()
            .with_tag("Creature")
            .with_field("Power", 3)
            .in_zone(0)
            .with_rule(RuleSpec::new("OnEnter", TriggerLabel::ComponentEnteredZone));

        assert_eq!(spec.tags, vec!["Creature"]);
        assert_eq!(spec.fields.len(), 1);
        assert_eq!(spec.zone, Some(0));
        assert_eq!(spec.rules.len(), 1);
    }

    #[test]
    fn test_zone_spec_builder() {
        let spec = ZoneSpec::new().with_tag("Board").grid(3, 3);
        assert_eq!(spec.tags, vec!["Board"]);
        assert_eq!(spec.layout, ZoneLayout::Grid { columns: 3, rows: 3 });
    }

    #[test]
    fn test_match_setup_builder() {
        let setup = MatchSetup::new(["Main", "End"])
            .with_zone(ZoneSpec::new().with_tag("Play"))
            .with_component(ComponentSpec::new().with_tag("Token").in_zone(0))
            .with_variable("score", "0")
            .with_match_number(3)
            .with_seed(42);

        assert_eq!(setup.phases, vec!["Main", "End"]);
        assert_eq!(setup.zones.len(), 1);
        assert_eq!(setup.components.len(), 1);
        assert_eq!(setup.variables, vec![("score".to_string(), "0".to_string())]);
        assert_eq!(setup.match_number, 3);
        assert_eq!(setup.seed, 42);
    }

    #[test]
    fn test_setup_serialization() {
        let setup = MatchSetup::new(["Main"])
            .with_rule(RuleSpec::new("End", TriggerLabel::PhaseStarted).with_commands("EndCurrentPhase"));
        let json = serde_json::to_string(&setup).unwrap();
        let deserialized: MatchSetup = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.rules[0].name, "End");
    }
}
