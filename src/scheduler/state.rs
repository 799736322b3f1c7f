//! Match state - the mutable world every script evaluates against.
//!
//! One `MatchState` per match, owned by the scheduler and passed
//! explicitly into every collaborator: there is no ambient "current match"
//! global, and each test constructs its own isolated instance.
//!
//! The state owns the entity pools (components, zones, rules), the
//! variable store, the RNG, the command queue, the script registries, and
//! the cooperative-cancellation flags the loop observes at its
//! checkpoints. Execution is single-threaded; the RNG sits behind a
//! `RefCell` only so random expressions can evaluate against shared state.

use std::cell::{RefCell, RefMut};

use crate::components::Component;
use crate::core::entity::{ComponentId, RuleId, ZoneId};
use crate::core::rng::MatchRng;
use crate::core::setup::{ComponentSpec, RuleSpec, ZoneSpec};
use crate::core::vars::VariableStore;
use crate::rules::Rule;
use crate::script::{CommandRegistry, GetterRegistry};
use crate::zones::{Placement, Zone};

use super::queue::CommandQueue;

/// The mutable state of one running match.
#[derive(Debug)]
pub struct MatchState {
    components: Vec<Component>,
    zones: Vec<Zone>,
    rules: Vec<Rule>,
    vars: VariableStore,
    rng: RefCell<MatchRng>,
    queue: CommandQueue,
    getters: GetterRegistry,
    commands: CommandRegistry,

    end_phase: bool,
    end_match: bool,
    end_subphase: bool,
    subphase_request: Option<Vec<String>>,
}

impl MatchState {
    /// Create empty state with seeded RNG, built-in variables, and the
    /// standard script registries.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            components: Vec::new(),
            zones: Vec::new(),
            rules: Vec::new(),
            vars: VariableStore::with_builtins(),
            rng: RefCell::new(MatchRng::new(seed)),
            queue: CommandQueue::new(),
            getters: GetterRegistry::standard(),
            commands: CommandRegistry::standard(),
            end_phase: false,
            end_match: false,
            end_subphase: false,
            subphase_request: None,
        }
    }

    // === Pools ===

    /// Add a component, assigning the next sequential id.
    pub fn add_component(&mut self, spec: &ComponentSpec) -> ComponentId {
        let id = ComponentId::new(self.components.len() as u32);
        self.components.push(Component::from_spec(id, spec));
        id
    }

    /// Add a zone, assigning the next sequential id.
    pub fn add_zone(&mut self, spec: &ZoneSpec) -> ZoneId {
        let id = ZoneId::new(self.zones.len() as u32);
        self.zones.push(Zone::from_spec(id, spec));
        id
    }

    /// Add an uncompiled rule, assigning the next sequential id.
    pub fn add_rule(&mut self, spec: &RuleSpec, owner: Option<ComponentId>) -> RuleId {
        let id = RuleId::new(self.rules.len() as u32);
        self.rules.push(Rule::from_spec(id, spec, owner));
        id
    }

    /// Look up a component.
    #[must_use]
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.raw() as usize)
    }

    /// Look up a component mutably.
    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(id.raw() as usize)
    }

    /// Look up a zone.
    #[must_use]
    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(id.raw() as usize)
    }

    /// Look up a zone mutably.
    pub fn zone_mut(&mut self, id: ZoneId) -> Option<&mut Zone> {
        self.zones.get_mut(id.raw() as usize)
    }

    /// Look up a rule.
    #[must_use]
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.raw() as usize)
    }

    /// The component pool, in id order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// The zone pool, in id order.
    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// The rule pool, in id order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Take the rule pool out for compilation (rules borrow the state
    /// immutably while compiling).
    pub(crate) fn take_rules(&mut self) -> Vec<Rule> {
        std::mem::take(&mut self.rules)
    }

    /// Put the compiled rule pool back.
    pub(crate) fn restore_rules(&mut self, rules: Vec<Rule>) {
        self.rules = rules;
    }

    // === Variables, RNG, registries ===

    /// The variable store.
    #[must_use]
    pub fn vars(&self) -> &VariableStore {
        &self.vars
    }

    /// The variable store, mutably.
    pub fn vars_mut(&mut self) -> &mut VariableStore {
        &mut self.vars
    }

    /// Borrow the match RNG.
    ///
    /// # Panics
    /// Panics if re-borrowed while already held, which a single-threaded
    /// evaluation pass never does.
    pub fn rng(&self) -> RefMut<'_, MatchRng> {
        self.rng.borrow_mut()
    }

    /// The expression prefix registry.
    #[must_use]
    pub fn getters(&self) -> &GetterRegistry {
        &self.getters
    }

    /// The expression prefix registry, mutably (to register new kinds).
    pub fn getters_mut(&mut self) -> &mut GetterRegistry {
        &mut self.getters
    }

    /// The command keyword registry.
    #[must_use]
    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// The command keyword registry, mutably (to register new kinds).
    pub fn commands_mut(&mut self) -> &mut CommandRegistry {
        &mut self.commands
    }

    // === Zone membership ===

    /// Put a component into a zone, updating the back-reference. A
    /// component already in some zone is detached first (silently - the
    /// scheduler fires zone events around explicit detach/attach pairs).
    pub fn attach(&mut self, component: ComponentId, zone: ZoneId, placement: Placement) {
        if self.component(component).is_some_and(|c| c.zone.is_some()) {
            self.detach(component);
        }
        let Some(zone_ref) = self.zones.get_mut(zone.raw() as usize) else {
            return;
        };
        zone_ref.push(component, placement);
        if let Some(c) = self.components.get_mut(component.raw() as usize) {
            c.zone = Some(zone);
        }
    }

    /// Remove a component from its current zone, clearing the
    /// back-reference. Returns the zone it left.
    pub fn detach(&mut self, component: ComponentId) -> Option<ZoneId> {
        let old = self.components.get_mut(component.raw() as usize)?.zone.take()?;
        if let Some(zone) = self.zones.get_mut(old.raw() as usize) {
            zone.pop(component);
        }
        Some(old)
    }

    /// A component's position in its zone.
    #[must_use]
    pub fn position_of(&self, component: ComponentId) -> Option<usize> {
        let zone = self.component(component)?.zone?;
        self.zone(zone)?.index_of(component)
    }

    /// The zone holding a component.
    #[must_use]
    pub fn zone_of(&self, component: ComponentId) -> Option<&Zone> {
        self.zone(self.component(component)?.zone?)
    }

    /// Shuffle one zone with the match RNG.
    pub fn shuffle_zone(&mut self, zone: ZoneId) {
        let Self { zones, rng, .. } = self;
        if let Some(zone) = zones.get_mut(zone.raw() as usize) {
            zone.shuffle(&mut rng.borrow_mut());
        }
    }

    // === Command queue ===

    /// The pending command queue.
    #[must_use]
    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// The pending command queue, mutably.
    pub fn queue_mut(&mut self) -> &mut CommandQueue {
        &mut self.queue
    }

    /// Compile a `;`-separated command sequence and enqueue the clauses
    /// that compiled. Returns how many were enqueued.
    pub fn enqueue(&mut self, text: &str) -> usize {
        let compiled = self.commands.compile_sequence(text, self);
        let count = compiled.len();
        for command in compiled {
            self.queue.push(command);
        }
        count
    }

    // === Cooperative cancellation flags ===

    /// Ask the loop to end the current phase at its next checkpoint.
    pub fn request_end_phase(&mut self) {
        self.end_phase = true;
    }

    /// Ask the loop to end the match at its next checkpoint.
    pub fn request_end_match(&mut self) {
        self.end_match = true;
    }

    /// Ask the loop to end the running subphase loop at its next cycle
    /// boundary.
    pub fn request_end_subphase_loop(&mut self) {
        self.end_subphase = true;
    }

    /// Ask the loop to start cycling the named subphases once the current
    /// phase ends.
    pub fn request_subphase_loop(&mut self, phases: Vec<String>) {
        self.subphase_request = Some(phases);
    }

    pub(crate) fn take_end_phase(&mut self) -> bool {
        std::mem::take(&mut self.end_phase)
    }

    pub(crate) fn end_match_requested(&self) -> bool {
        self.end_match
    }

    pub(crate) fn take_end_subphase(&mut self) -> bool {
        std::mem::take(&mut self.end_subphase)
    }

    pub(crate) fn take_subphase_request(&mut self) -> Option<Vec<String>> {
        self.subphase_request.take()
    }
}
