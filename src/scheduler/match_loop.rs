//! The match scheduler.
//!
//! Drives the turn/phase/subphase loop as an explicit state machine,
//! advanced one suspension point per `tick()`: one trigger firing, one
//! queued command, or one flow transition. Cancellation (`EndCurrentPhase`,
//! `EndSubphaseLoop`, `EndTheMatch`) is flag-based and observed at the next
//! checkpoint - a command already dispatched this tick always completes.
//!
//! The scheduler also owns the trigger firing pass: a pre-check records
//! which candidate rules match, then game-level matches run their commands
//! in declaration order, then component-level matches, then external
//! callbacks. Every matching rule first announces "rule activated"
//! (synchronously and recursively) before its own commands run.

use tracing::warn;

use crate::core::entity::RuleId;
use crate::core::error::SetupError;
use crate::core::setup::MatchSetup;
use crate::core::vars::reserved;
use crate::script::{Command, EvalContext, Getter};
use crate::triggers::{TriggerCallback, TriggerContext, TriggerDispatcher, TriggerLabel};
use crate::zones::Placement;

use super::state::MatchState;

/// Nested "rule activated" firings beyond this depth are skipped with a
/// warning. Avoiding unbounded recursion is the rule author's job; this
/// guard keeps a mis-authored set from overflowing the stack.
const MAX_TRIGGER_DEPTH: u32 = 32;

/// Outcome of one scheduler tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tick {
    /// The loop advanced one suspension point.
    Advanced,
    /// The command queue is empty; the match is waiting for input.
    Idle,
    /// A `Wait` command is pending; the payload is the remaining logical
    /// time. Drive it down with [`MatchScheduler::elapse`].
    Waiting(f64),
    /// The match has ended.
    Ended,
}

/// Position in the turn/phase/subphase loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    MatchStart,
    TurnStart,
    PhaseStart(usize),
    PhaseBody(usize),
    PhaseEnd(usize),
    SubphaseStart { after: usize, sub: usize },
    SubphaseBody { after: usize, sub: usize },
    SubphaseEnd { after: usize, sub: usize },
    TurnEnd,
    MatchEnd,
    Ended,
}

/// The match execution engine.
///
/// Owns the match state and the trigger dispatcher; everything else
/// (rules, commands, expressions) operates through them.
pub struct MatchScheduler {
    state: MatchState,
    dispatcher: TriggerDispatcher,
    flow: Flow,
    phases: Vec<String>,
    subphases: Vec<String>,
    current_phase: String,
    turn: u32,
    wait_remaining: f64,
    depth: u32,
}

impl MatchScheduler {
    /// Set up a match: assign identities, compile rules, index triggers.
    ///
    /// The one fatal case is a game-level variable colliding with a
    /// reserved built-in name. The first "match started" firing happens on
    /// the first `tick()`, so callbacks can be registered in between.
    pub fn start(setup: MatchSetup) -> Result<Self, SetupError> {
        let mut state = MatchState::new(setup.seed);

        for (name, value) in &setup.variables {
            state.vars_mut().define(name, value.clone())?;
        }

        let zone_ids: Vec<_> = setup.zones.iter().map(|spec| state.add_zone(spec)).collect();

        for spec in &setup.components {
            let id = state.add_component(spec);
            if let Some(&zone) = spec.zone.and_then(|index| zone_ids.get(index)) {
                state.attach(id, zone, Placement::Top);
            }
        }

        // Game-level rules first, then component-level, declaration order.
        for spec in &setup.rules {
            state.add_rule(spec, None);
        }
        for (index, component) in setup.components.iter().enumerate() {
            let owner = state.components()[index].id;
            for spec in &component.rules {
                state.add_rule(spec, Some(owner));
            }
        }

        let mut rules = state.take_rules();
        for rule in &mut rules {
            rule.initialize(&state);
        }
        state.restore_rules(rules);

        let mut dispatcher = TriggerDispatcher::new();
        for rule in state.rules() {
            dispatcher.index_rule(rule);
        }

        state
            .vars_mut()
            .set(reserved::MATCH_NUMBER, setup.match_number.to_string());
        state.vars_mut().set(reserved::TURN_NUMBER, "0");

        Ok(Self {
            state,
            dispatcher,
            flow: Flow::MatchStart,
            phases: setup.phases,
            subphases: Vec::new(),
            current_phase: String::new(),
            turn: 0,
            wait_remaining: 0.0,
            depth: 0,
        })
    }

    // === Driving ===

    /// Advance one suspension point.
    pub fn tick(&mut self) -> Tick {
        // End-of-match is observed at the next checkpoint, wherever the
        // loop is nested.
        if self.state.end_match_requested() && !matches!(self.flow, Flow::MatchEnd | Flow::Ended) {
            self.flow = Flow::MatchEnd;
        }

        match self.flow {
            Flow::MatchStart => {
                self.fire(&TriggerContext::new(TriggerLabel::MatchStarted));
                self.flow = Flow::TurnStart;
                Tick::Advanced
            }

            Flow::TurnStart => {
                self.turn += 1;
                self.state
                    .vars_mut()
                    .set(reserved::TURN_NUMBER, self.turn.to_string());
                self.fire(&TriggerContext::new(TriggerLabel::TurnStarted));
                self.flow = if self.phases.is_empty() {
                    Flow::TurnEnd
                } else {
                    Flow::PhaseStart(0)
                };
                Tick::Advanced
            }

            Flow::PhaseStart(index) => {
                let name = self.phases[index].clone();
                self.begin_phase(&name);
                self.flow = Flow::PhaseBody(index);
                Tick::Advanced
            }

            Flow::PhaseBody(index) => self.body_tick(Flow::PhaseEnd(index)),

            Flow::PhaseEnd(index) => {
                let name = self.phases[index].clone();
                self.fire(&TriggerContext::new(TriggerLabel::PhaseEnded).with_phase(name));
                // A stale end-subphase flag outside any loop is dropped.
                let _ = self.state.take_end_subphase();
                let requested = self
                    .state
                    .take_subphase_request()
                    .filter(|subphases| !subphases.is_empty());
                self.flow = if let Some(subphases) = requested {
                    self.subphases = subphases;
                    Flow::SubphaseStart { after: index, sub: 0 }
                } else if index + 1 < self.phases.len() {
                    Flow::PhaseStart(index + 1)
                } else {
                    Flow::TurnEnd
                };
                Tick::Advanced
            }

            Flow::SubphaseStart { after, sub } => {
                let name = self.subphases[sub].clone();
                self.begin_phase(&name);
                self.flow = Flow::SubphaseBody { after, sub };
                Tick::Advanced
            }

            Flow::SubphaseBody { after, sub } => self.body_tick(Flow::SubphaseEnd { after, sub }),

            Flow::SubphaseEnd { after, sub } => {
                let name = self.subphases[sub].clone();
                self.fire(&TriggerContext::new(TriggerLabel::PhaseEnded).with_phase(name));
                let replacement = self
                    .state
                    .take_subphase_request()
                    .filter(|subphases| !subphases.is_empty());
                self.flow = if self.state.take_end_subphase() {
                    self.subphases.clear();
                    if after + 1 < self.phases.len() {
                        Flow::PhaseStart(after + 1)
                    } else {
                        Flow::TurnEnd
                    }
                } else if let Some(subphases) = replacement {
                    self.subphases = subphases;
                    Flow::SubphaseStart { after, sub: 0 }
                } else {
                    Flow::SubphaseStart {
                        after,
                        sub: (sub + 1) % self.subphases.len(),
                    }
                };
                Tick::Advanced
            }

            Flow::TurnEnd => {
                self.fire(&TriggerContext::new(TriggerLabel::TurnEnded));
                self.flow = Flow::TurnStart;
                Tick::Advanced
            }

            Flow::MatchEnd => {
                self.fire(&TriggerContext::new(TriggerLabel::MatchEnded));
                self.flow = Flow::Ended;
                Tick::Ended
            }

            Flow::Ended => Tick::Ended,
        }
    }

    /// One tick inside a phase body: end-flag checkpoint, pending wait,
    /// then at most one queued command; otherwise idle.
    fn body_tick(&mut self, on_end: Flow) -> Tick {
        if self.state.take_end_phase() {
            self.flow = on_end;
            return Tick::Advanced;
        }
        if self.wait_remaining > 0.0 {
            return Tick::Waiting(self.wait_remaining);
        }
        if let Some(command) = self.state.queue_mut().pop() {
            self.execute(&command);
            return Tick::Advanced;
        }
        Tick::Idle
    }

    /// Tick until the match idles (awaiting input) or ends. Pending waits
    /// are elapsed in full - logical time costs nothing here.
    pub fn run_until_idle(&mut self) -> Tick {
        loop {
            match self.tick() {
                Tick::Advanced => {}
                Tick::Waiting(units) => self.elapse(units),
                outcome @ (Tick::Idle | Tick::Ended) => return outcome,
            }
        }
    }

    /// Tick exactly `count` times, returning the last outcome.
    pub fn run_for_ticks(&mut self, count: usize) -> Tick {
        let mut last = Tick::Idle;
        for _ in 0..count {
            last = self.tick();
        }
        last
    }

    /// Reduce a pending `Wait` by `units` of logical time. The embedding
    /// presentation layer maps this onto whatever timer it has.
    pub fn elapse(&mut self, units: f64) {
        self.wait_remaining = (self.wait_remaining - units).max(0.0);
    }

    // === External interface ===

    /// Compile and enqueue a command sequence (player input). Returns how
    /// many clauses were enqueued.
    pub fn enqueue(&mut self, text: &str) -> usize {
        self.state.enqueue(text)
    }

    /// Enqueue an already-compiled command.
    pub fn enqueue_command(&mut self, command: Command) {
        self.state.queue_mut().push(command);
    }

    /// Chain an external callback onto a trigger label.
    pub fn on(
        &mut self,
        label: TriggerLabel,
        callback: impl Fn(&TriggerContext, &mut MatchState) + 'static,
    ) {
        self.dispatcher.on(label, std::rc::Rc::new(callback));
    }

    /// Fire a trigger from outside the loop (e.g. the input layer
    /// reporting a component being used).
    pub fn fire(&mut self, ctx: &TriggerContext) {
        if self.depth >= MAX_TRIGGER_DEPTH {
            warn!(label = %ctx.label, "trigger depth limit reached, skipping nested firing");
            return;
        }
        self.depth += 1;
        self.fire_pass(ctx);
        self.depth -= 1;
    }

    /// The match state (read-only variable introspection lives here too).
    #[must_use]
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// The match state, mutably.
    pub fn state_mut(&mut self) -> &mut MatchState {
        &mut self.state
    }

    /// Does a variable exist?
    #[must_use]
    pub fn has_variable(&self, name: &str) -> bool {
        self.state.vars().is_defined(name)
    }

    /// Current value of a variable.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.state.vars().get(name)
    }

    /// Name of the phase currently running.
    #[must_use]
    pub fn current_phase(&self) -> &str {
        &self.current_phase
    }

    /// Current turn number, starting at 1 on the first turn.
    #[must_use]
    pub fn turn_number(&self) -> u32 {
        self.turn
    }

    /// Has the match ended?
    #[must_use]
    pub fn is_ended(&self) -> bool {
        matches!(self.flow, Flow::Ended)
    }

    // === Trigger firing ===

    fn begin_phase(&mut self, name: &str) {
        self.current_phase = name.to_string();
        self.fire(&TriggerContext::new(TriggerLabel::PhaseStarted).with_phase(name));
    }

    /// One full firing pass: context variables, pre-check, game rules,
    /// component rules, callbacks.
    fn fire_pass(&mut self, ctx: &TriggerContext) {
        self.write_context_vars(ctx);

        let game_candidates = self.dispatcher.game_rules(ctx.label).to_vec();
        let component_candidates = self.dispatcher.component_rules(ctx.label).to_vec();

        // Pre-check: evaluate each candidate's condition once; skip the
        // whole pass when nothing matched and nobody is listening.
        let matched_game = self.matching_rules(&game_candidates, ctx);
        let matched_component = self.matching_rules(&component_candidates, ctx);
        if matched_game.is_empty()
            && matched_component.is_empty()
            && !self.dispatcher.has_callbacks(ctx.label)
        {
            return;
        }

        for &rule in matched_game.iter().chain(&matched_component) {
            self.run_rule(rule, ctx);
        }

        let callbacks: Vec<TriggerCallback> = self.dispatcher.callbacks(ctx.label).to_vec();
        for callback in callbacks {
            callback.as_ref()(ctx, &mut self.state);
        }
    }

    /// Evaluate candidate conditions once, recording the matches.
    fn matching_rules(&mut self, candidates: &[RuleId], ctx: &TriggerContext) -> Vec<RuleId> {
        let mut matched = Vec::new();
        for &id in candidates {
            let owner = self.state.rule(id).and_then(|rule| rule.owner);
            if let Some(owner) = owner {
                self.state
                    .vars_mut()
                    .set(reserved::THIS, owner.raw().to_string());
            }

            let Some(rule) = self.state.rule(id) else {
                continue;
            };
            // The condition's candidate: the component the event is about,
            // or the owning component for component-level rules.
            let candidate = ctx.component.or(rule.owner);
            let eval_ctx = EvalContext {
                state: &self.state,
                tags: candidate
                    .and_then(|c| self.state.component(c))
                    .map(|c| &c.tags),
                component: candidate,
            };
            if rule.matches(&eval_ctx) {
                matched.push(id);
            }
        }
        matched
    }

    /// Run one matched rule: announce "rule activated", then execute its
    /// commands in order.
    fn run_rule(&mut self, id: RuleId, ctx: &TriggerContext) {
        if ctx.label != TriggerLabel::RuleActivated {
            let mut activation = TriggerContext::new(TriggerLabel::RuleActivated).with_rule(id);
            if let Some(component) = ctx.component {
                activation = activation.with_component(component);
            }
            if let Some(zone) = ctx.zone {
                activation = activation.with_zone(zone);
            }
            self.fire(&activation);
        }

        if let Some(owner) = self.state.rule(id).and_then(|rule| rule.owner) {
            self.state
                .vars_mut()
                .set(reserved::THIS, owner.raw().to_string());
        }

        let commands = self
            .state
            .rule(id)
            .map(|rule| rule.commands().to_vec())
            .unwrap_or_default();
        for command in &commands {
            self.execute(command);
        }
    }

    /// Mirror "what just happened" into the reserved variables so rule
    /// conditions and command operands can reference it.
    fn write_context_vars(&mut self, ctx: &TriggerContext) {
        let vars = self.state.vars_mut();
        match ctx.label {
            TriggerLabel::ComponentUsed => {
                if let Some(component) = ctx.component {
                    vars.set(reserved::USED_COMPONENT, component.raw().to_string());
                }
            }
            TriggerLabel::ZoneUsed => {
                if let Some(zone) = ctx.zone {
                    vars.set(reserved::USED_ZONE, zone.raw().to_string());
                }
            }
            TriggerLabel::ComponentEnteredZone => {
                if let Some(component) = ctx.component {
                    vars.set(reserved::MOVED_COMPONENT, component.raw().to_string());
                }
                if let Some(zone) = ctx.zone {
                    vars.set(reserved::ENTERED_ZONE, zone.raw().to_string());
                }
            }
            TriggerLabel::ComponentLeftZone => {
                if let Some(component) = ctx.component {
                    vars.set(reserved::MOVED_COMPONENT, component.raw().to_string());
                }
                if let Some(zone) = ctx.zone {
                    vars.set(reserved::LEFT_ZONE, zone.raw().to_string());
                }
            }
            TriggerLabel::MessageSent => {
                if let Some(text) = &ctx.text {
                    vars.set(reserved::MESSAGE, text.clone());
                }
            }
            TriggerLabel::ActionUsed => {
                if let Some(text) = &ctx.text {
                    vars.set(reserved::ACTION_NAME, text.clone());
                }
            }
            TriggerLabel::VariableChanged => {
                if let Some(text) = &ctx.text {
                    vars.set(reserved::VARIABLE, text.clone());
                }
                if let Some(value) = &ctx.value {
                    vars.set(reserved::NEW_VALUE, value.clone());
                }
            }
            TriggerLabel::RuleActivated => {
                if let Some(rule) = ctx.rule {
                    vars.set(reserved::ACTIVATED_RULE, rule.raw().to_string());
                }
            }
            TriggerLabel::PhaseStarted | TriggerLabel::PhaseEnded => {
                if let Some(phase) = &ctx.phase {
                    vars.set(reserved::PHASE, phase.clone());
                }
            }
            _ => {}
        }
    }

    // === Command execution ===

    /// Execute one command against the match.
    pub fn execute(&mut self, command: &Command) {
        match command {
            Command::EndCurrentPhase => self.state.request_end_phase(),

            Command::EndTheMatch => self.state.request_end_match(),

            Command::EndSubphaseLoop => self.state.request_end_subphase_loop(),

            Command::StartSubphaseLoop { phases } => {
                self.state.request_subphase_loop(phases.clone());
            }

            Command::SendMessage { message } => {
                self.fire(
                    &TriggerContext::new(TriggerLabel::MessageSent).with_text(message.clone()),
                );
            }

            Command::UseAction { action } => {
                self.fire(&TriggerContext::new(TriggerLabel::ActionUsed).with_text(action.clone()));
            }

            Command::Wait { units } => {
                let units = units.evaluate(&self.state).number();
                if units.is_finite() && units > 0.0 {
                    self.wait_remaining += units;
                } else {
                    warn!("ignoring Wait with non-positive duration");
                }
            }

            Command::UseComponent { components } => {
                for id in components.select(&self.state) {
                    self.fire(
                        &TriggerContext::new(TriggerLabel::ComponentUsed).with_component(id),
                    );
                }
            }

            Command::UseZone { zones } => {
                for id in zones.select(&self.state) {
                    self.fire(&TriggerContext::new(TriggerLabel::ZoneUsed).with_zone(id));
                }
            }

            Command::Shuffle { zones } => {
                for id in zones.select(&self.state) {
                    self.state.shuffle_zone(id);
                }
            }

            Command::MoveComponentToZone {
                components,
                zones,
                options,
            } => {
                let selected = components.select(&self.state);
                let destinations = zones.select(&self.state);
                let placement = if let Some((column, row)) = options.grid_slot {
                    Placement::Slot { column, row }
                } else if options.to_bottom {
                    Placement::Bottom
                } else {
                    Placement::Top
                };

                // Zones outer, components inner. Back-to-front iteration
                // preserves the selection's relative order when repeated
                // single-item pushes would otherwise reverse it.
                for zone in destinations {
                    let ordered: Vec<_> = if options.keep_order {
                        selected.iter().rev().copied().collect()
                    } else {
                        selected.clone()
                    };
                    for component in ordered {
                        if let Some(left) = self.state.detach(component) {
                            self.fire(
                                &TriggerContext::new(TriggerLabel::ComponentLeftZone)
                                    .with_component(component)
                                    .with_zone(left),
                            );
                        }
                        self.state.attach(component, zone, placement);
                        self.fire(
                            &TriggerContext::new(TriggerLabel::ComponentEnteredZone)
                                .with_component(component)
                                .with_zone(zone),
                        );
                    }
                }
            }

            Command::SetComponentFieldValue {
                components,
                field,
                value,
            } => {
                let text = value.evaluate(&self.state).text();
                for id in components.select(&self.state) {
                    if let Some(component) = self.state.component_mut(id) {
                        component.set_field_text(field.as_str(), &text);
                    }
                }
            }

            Command::SetVariable { name, value } => {
                let new_value = match value.combine() {
                    // Combine: current value, operator, operand - evaluated
                    // through the same arithmetic engine. There is no
                    // separate increment path.
                    Some(op) => {
                        let current = self.state.vars().get(name).unwrap_or("").to_string();
                        let operand = value.evaluate(&self.state).text();
                        let expression = format!("{current}{}{operand}", op.symbol());
                        match Getter::compile(&expression, &self.state) {
                            Ok(combined) => combined.evaluate(&self.state).text(),
                            Err(error) => {
                                warn!(%expression, %error, "combine expression failed");
                                operand
                            }
                        }
                    }
                    None => value.evaluate(&self.state).text(),
                };

                if self.state.vars_mut().set(name, new_value.clone()) {
                    self.fire(
                        &TriggerContext::new(TriggerLabel::VariableChanged)
                            .with_text(name.clone())
                            .with_value(new_value),
                    );
                }
            }

            Command::AddTagToComponent { components, tag } => {
                for id in components.select(&self.state) {
                    if let Some(component) = self.state.component_mut(id) {
                        component.tags.add(tag.clone());
                    }
                }
            }

            Command::RemoveTagFromComponent { components, tag } => {
                for id in components.select(&self.state) {
                    if let Some(component) = self.state.component_mut(id) {
                        component.tags.remove(tag);
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for MatchScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchScheduler")
            .field("flow", &self.flow)
            .field("turn", &self.turn)
            .field("current_phase", &self.current_phase)
            .field("wait_remaining", &self.wait_remaining)
            .finish_non_exhaustive()
    }
}
