//! Trigger context.
//!
//! What a firing is about: the label plus the entities and text involved.
//! The scheduler mirrors this into the reserved variables before rules
//! evaluate, and external callbacks receive it directly.

use serde::{Deserialize, Serialize};

use crate::core::entity::{ComponentId, RuleId, ZoneId};

use super::label::TriggerLabel;

/// Context for one trigger firing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerContext {
    /// The event being fired.
    pub label: TriggerLabel,

    /// Component involved (used, moved), if any.
    pub component: Option<ComponentId>,

    /// Zone involved (used, entered, left), if any.
    pub zone: Option<ZoneId>,

    /// Rule involved (the activating rule), if any.
    pub rule: Option<RuleId>,

    /// Phase name for phase events.
    pub phase: Option<String>,

    /// Message, action name, or changed-variable name.
    pub text: Option<String>,

    /// New value for variable-changed events.
    pub value: Option<String>,
}

impl TriggerContext {
    /// Context with just a label.
    #[must_use]
    pub fn new(label: TriggerLabel) -> Self {
        Self {
            label,
            component: None,
            zone: None,
            rule: None,
            phase: None,
            text: None,
            value: None,
        }
    }

    /// Set the involved component (builder pattern).
    #[must_use]
    pub fn with_component(mut self, component: ComponentId) -> Self {
        self.component = Some(component);
        self
    }

    /// Set the involved zone (builder pattern).
    #[must_use]
    pub fn with_zone(mut self, zone: ZoneId) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Set the involved rule (builder pattern).
    #[must_use]
    pub fn with_rule(mut self, rule: RuleId) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Set the phase name (builder pattern).
    #[must_use]
    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    /// Set the text payload (builder pattern).
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the new-value payload (builder pattern).
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}
