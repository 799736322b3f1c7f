//! Trigger dispatcher indexes.
//!
//! For each trigger label the dispatcher indexes three things: game-level
//! rules, component-level rules, and a chainable list of external
//! callbacks. Rules are indexed in declaration order, which is the order
//! they fire in; callbacks run after all matching rules.
//!
//! The firing pass itself lives in the scheduler (it needs mutable match
//! state and recursion through "rule activated"); this type is the pure
//! routing table.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::core::entity::RuleId;
use crate::rules::Rule;
use crate::scheduler::state::MatchState;

use super::context::TriggerContext;
use super::label::TriggerLabel;

/// An external callback subscribed to a trigger label.
///
/// Callbacks fire inside an active trigger pass: a presentation layer must
/// not assume it can mutate match state re-entrantly without considering
/// what else is mid-flight.
pub type TriggerCallback = Rc<dyn Fn(&TriggerContext, &mut MatchState)>;

/// Routing table from trigger labels to rules and callbacks.
#[derive(Clone, Default)]
pub struct TriggerDispatcher {
    game_rules: FxHashMap<TriggerLabel, Vec<RuleId>>,
    component_rules: FxHashMap<TriggerLabel, Vec<RuleId>>,
    callbacks: FxHashMap<TriggerLabel, Vec<TriggerCallback>>,
}

impl TriggerDispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a rule under its trigger label. Game-level rules (no owner)
    /// and component-level rules keep separate, ordered lists.
    pub fn index_rule(&mut self, rule: &Rule) {
        let index = if rule.owner.is_some() {
            &mut self.component_rules
        } else {
            &mut self.game_rules
        };
        index.entry(rule.trigger).or_default().push(rule.id);
    }

    /// Chain an external callback onto a label.
    pub fn on(&mut self, label: TriggerLabel, callback: TriggerCallback) {
        self.callbacks.entry(label).or_default().push(callback);
    }

    /// Game-level rules for a label, in declaration order.
    #[must_use]
    pub fn game_rules(&self, label: TriggerLabel) -> &[RuleId] {
        self.game_rules.get(&label).map_or(&[], Vec::as_slice)
    }

    /// Component-level rules for a label, in declaration order.
    #[must_use]
    pub fn component_rules(&self, label: TriggerLabel) -> &[RuleId] {
        self.component_rules.get(&label).map_or(&[], Vec::as_slice)
    }

    /// Callbacks for a label, in subscription order.
    #[must_use]
    pub fn callbacks(&self, label: TriggerLabel) -> &[TriggerCallback] {
        self.callbacks.get(&label).map_or(&[], Vec::as_slice)
    }

    /// Is anything at all listening on this label?
    #[must_use]
    pub fn has_callbacks(&self, label: TriggerLabel) -> bool {
        self.callbacks.get(&label).is_some_and(|list| !list.is_empty())
    }
}

impl std::fmt::Debug for TriggerDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerDispatcher")
            .field("game_rules", &self.game_rules)
            .field("component_rules", &self.component_rules)
            .field(
                "callbacks",
                &self
                    .callbacks
                    .iter()
                    .map(|(label, list)| (*label, list.len()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
