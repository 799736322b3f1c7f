//! Rules - a trigger label paired with a condition tree and command list.
//!
//! A rule is authored as text and compiled once at match start. The
//! compiled condition is re-walked on every firing (operands may reference
//! mutable state); the command list is bound once and cloned per run.

use tracing::warn;

use crate::core::entity::{ComponentId, RuleId};
use crate::core::setup::RuleSpec;
use crate::core::tags::TagSet;
use crate::scheduler::state::MatchState;
use crate::script::{Command, Condition, EvalContext};
use crate::triggers::TriggerLabel;

/// A compiled rule.
#[derive(Clone, Debug)]
pub struct Rule {
    /// Unique id, assigned sequentially at match start.
    pub id: RuleId,

    /// Human-readable name.
    pub name: String,

    /// Tags, queryable through `r(...)` selectors.
    pub tags: TagSet,

    /// Lifecycle event this rule listens for.
    pub trigger: TriggerLabel,

    /// Owning component; `None` for game-level rules.
    pub owner: Option<ComponentId>,

    /// Source text of the condition clause.
    pub condition_text: String,

    /// Source text of the command sequence.
    pub command_text: String,

    /// Compiled condition. `None` until initialized, or when the text
    /// failed to compile (the rule then silently never matches).
    condition: Option<Condition>,

    /// Compiled commands. Broken clauses are dropped at compile time.
    commands: Vec<Command>,
}

impl Rule {
    /// Build an uncompiled rule from a spec.
    #[must_use]
    pub fn from_spec(id: RuleId, spec: &RuleSpec, owner: Option<ComponentId>) -> Self {
        Self {
            id,
            name: spec.name.clone(),
            tags: spec.tags.iter().cloned().collect(),
            trigger: spec.trigger,
            owner,
            condition_text: spec.condition.clone(),
            command_text: spec.commands.clone(),
            condition: None,
            commands: Vec::new(),
        }
    }

    /// Compile condition and command text.
    ///
    /// Idempotent: re-running discards the previous compilation and
    /// rebuilds from the same text. A condition that fails to compile
    /// disables the rule (logged); broken command clauses are dropped
    /// individually by the command compiler.
    pub fn initialize(&mut self, state: &MatchState) {
        self.condition = match Condition::parse(&self.condition_text, state) {
            Ok(condition) => Some(condition),
            Err(error) => {
                warn!(rule = %self.name, %error, "condition failed to compile, rule disabled");
                None
            }
        };
        self.commands = state.commands().compile_sequence(&self.command_text, state);
    }

    /// Has `initialize` produced a usable condition?
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.condition.is_some()
    }

    /// Evaluate the condition tree against a context. A disabled rule
    /// never matches.
    #[must_use]
    pub fn matches(&self, ctx: &EvalContext) -> bool {
        self.condition
            .as_ref()
            .is_some_and(|condition| condition.evaluate(ctx))
    }

    /// The compiled command list.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}
