//! The command compiler.
//!
//! A command clause is `Keyword(arg1,arg2,...)`; sequences are separated
//! by top-level `;`. Compilation splits the clause into a head keyword and
//! comma-separated arguments (respecting nested parentheses, so commas
//! inside a selector never split the clause) and dispatches through a
//! keyword registry to one of a small set of operand shapes.
//!
//! A build failure - unknown keyword, wrong arity, malformed operand - is
//! logged and the clause dropped; the rest of the batch keeps compiling.
//! Execution lives in the scheduler, which owns trigger dispatch; a
//! `Command` is pure bound data.

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::core::error::ScriptError;
use crate::scheduler::state::MatchState;

use super::getter::Getter;
use super::scan;
use super::selector::{ComponentSelector, ZoneSelector};

/// Options for a compound move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveOptions {
    /// Insert at the destination's bottom instead of its top.
    pub to_bottom: bool,
    /// Iterate components back-to-front so repeated single-item pushes
    /// preserve their original relative order at the destination.
    pub keep_order: bool,
    /// Request a grid slot at the destination.
    pub grid_slot: Option<(u32, u32)>,
}

/// A compiled command with operands bound at build time.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Flag the current phase as finished.
    EndCurrentPhase,
    /// Flag the match as finished; unwinds every nested loop.
    EndTheMatch,
    /// Flag the running subphase loop as finished.
    EndSubphaseLoop,
    /// Enqueue a subphase loop over the named phases.
    StartSubphaseLoop {
        /// Phase names to cycle through.
        phases: Vec<String>,
    },
    /// Fire "message sent".
    SendMessage {
        /// The message text.
        message: String,
    },
    /// Fire "action used".
    UseAction {
        /// The action name.
        action: String,
    },
    /// Suspend the scheduler for N logical time units.
    Wait {
        /// Duration expression.
        units: Getter,
    },
    /// Fire "component used" for every selected component.
    UseComponent {
        /// Components to use.
        components: ComponentSelector,
    },
    /// Fire "zone used" for every selected zone.
    UseZone {
        /// Zones to use.
        zones: ZoneSelector,
    },
    /// Shuffle every selected zone.
    Shuffle {
        /// Zones to shuffle.
        zones: ZoneSelector,
    },
    /// Move N components into M zones; zones outer, components inner.
    MoveComponentToZone {
        /// Components to move.
        components: ComponentSelector,
        /// Destination zones.
        zones: ZoneSelector,
        /// Placement options.
        options: MoveOptions,
    },
    /// Set a field on every selected component.
    SetComponentFieldValue {
        /// Components to modify.
        components: ComponentSelector,
        /// Field name.
        field: String,
        /// Value expression.
        value: Getter,
    },
    /// Set a variable, with combine semantics when the value expression
    /// carried a leading combine operator.
    SetVariable {
        /// Variable name.
        name: String,
        /// Value expression.
        value: Getter,
    },
    /// Add a tag to every selected component.
    AddTagToComponent {
        /// Components to tag.
        components: ComponentSelector,
        /// The tag.
        tag: String,
    },
    /// Remove a tag from every selected component.
    RemoveTagFromComponent {
        /// Components to untag.
        components: ComponentSelector,
        /// The tag.
        tag: String,
    },
}

/// Builder signature for keyword-dispatched commands.
pub type CommandBuilder = fn(&str, &[&str], &MatchState) -> Result<Command, ScriptError>;

/// Keyword-dispatch registry for the command compiler.
///
/// New command kinds can be registered without editing a central dispatch
/// block.
#[derive(Clone, Debug)]
pub struct CommandRegistry {
    builders: FxHashMap<&'static str, CommandBuilder>,
}

impl CommandRegistry {
    /// Registry with the standard command vocabulary.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self {
            builders: FxHashMap::default(),
        };
        registry.register("EndCurrentPhase", build_end_current_phase);
        registry.register("EndTheMatch", build_end_the_match);
        registry.register("EndSubphaseLoop", build_end_subphase_loop);
        registry.register("StartSubphaseLoop", build_start_subphase_loop);
        registry.register("SendMessage", build_send_message);
        registry.register("UseAction", build_use_action);
        registry.register("Wait", build_wait);
        registry.register("UseComponent", build_use_component);
        registry.register("UseZone", build_use_zone);
        registry.register("Shuffle", build_shuffle);
        registry.register("MoveComponentToZone", build_move_component_to_zone);
        registry.register("SetComponentFieldValue", build_set_component_field_value);
        registry.register("SetVariable", build_set_variable);
        registry.register("AddTagToComponent", build_add_tag);
        registry.register("RemoveTagFromComponent", build_remove_tag);
        registry
    }

    /// Register a keyword.
    pub fn register(&mut self, keyword: &'static str, builder: CommandBuilder) {
        self.builders.insert(keyword, builder);
    }

    /// Compile a single clause.
    pub fn compile_clause(&self, clause: &str, state: &MatchState) -> Result<Command, ScriptError> {
        let (keyword, args) = scan::head_and_args(clause)?;
        let builder = self
            .builders
            .get(keyword)
            .ok_or_else(|| ScriptError::UnknownKeyword(keyword.to_string()))?;
        builder(keyword, &args, state)
    }

    /// Compile a `;`-separated sequence. Failing clauses are logged and
    /// dropped; the survivors keep their original order.
    pub fn compile_sequence(&self, text: &str, state: &MatchState) -> Vec<Command> {
        let text = scan::strip_whitespace(text);
        let mut commands = Vec::new();
        for clause in scan::split_top_level(&text, &[';']) {
            match self.compile_clause(clause, state) {
                Ok(command) => commands.push(command),
                Err(error) => {
                    warn!(clause = %clause, %error, "dropping command clause");
                }
            }
        }
        commands
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn expect_args(
    keyword: &str,
    args: &[&str],
    expected: usize,
    what: &'static str,
) -> Result<(), ScriptError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ScriptError::WrongArgCount {
            keyword: keyword.to_string(),
            expected: what,
            got: args.len(),
        })
    }
}

/// Interpret an argument as a component selector.
fn component_selector_arg(text: &str, state: &MatchState) -> Result<ComponentSelector, ScriptError> {
    if text == "allcomponents" {
        return Ok(ComponentSelector::all());
    }
    if let Some(inner) = text
        .strip_prefix("c(")
        .and_then(|_| scan::is_wrapped(&text[1..]).then(|| &text[2..text.len() - 1]))
    {
        return ComponentSelector::parse(inner, state);
    }
    Err(ScriptError::ExpectedSelector(text.to_string()))
}

/// Interpret an argument as a zone selector.
fn zone_selector_arg(text: &str, state: &MatchState) -> Result<ZoneSelector, ScriptError> {
    if text == "allzones" {
        return Ok(ZoneSelector::all());
    }
    if let Some(inner) = text
        .strip_prefix("z(")
        .and_then(|_| scan::is_wrapped(&text[1..]).then(|| &text[2..text.len() - 1]))
    {
        return ZoneSelector::parse(inner, state);
    }
    Err(ScriptError::ExpectedSelector(text.to_string()))
}

fn build_end_current_phase(kw: &str, args: &[&str], _: &MatchState) -> Result<Command, ScriptError> {
    expect_args(kw, args, 0, "no arguments")?;
    Ok(Command::EndCurrentPhase)
}

fn build_end_the_match(kw: &str, args: &[&str], _: &MatchState) -> Result<Command, ScriptError> {
    expect_args(kw, args, 0, "no arguments")?;
    Ok(Command::EndTheMatch)
}

fn build_end_subphase_loop(kw: &str, args: &[&str], _: &MatchState) -> Result<Command, ScriptError> {
    expect_args(kw, args, 0, "no arguments")?;
    Ok(Command::EndSubphaseLoop)
}

fn build_start_subphase_loop(
    kw: &str,
    args: &[&str],
    _: &MatchState,
) -> Result<Command, ScriptError> {
    if args.is_empty() {
        return Err(ScriptError::WrongArgCount {
            keyword: kw.to_string(),
            expected: "at least 1 phase name",
            got: 0,
        });
    }
    Ok(Command::StartSubphaseLoop {
        phases: args.iter().map(|s| (*s).to_string()).collect(),
    })
}

fn build_send_message(kw: &str, args: &[&str], _: &MatchState) -> Result<Command, ScriptError> {
    expect_args(kw, args, 1, "1 message")?;
    Ok(Command::SendMessage {
        message: args[0].to_string(),
    })
}

fn build_use_action(kw: &str, args: &[&str], _: &MatchState) -> Result<Command, ScriptError> {
    expect_args(kw, args, 1, "1 action name")?;
    Ok(Command::UseAction {
        action: args[0].to_string(),
    })
}

fn build_wait(kw: &str, args: &[&str], state: &MatchState) -> Result<Command, ScriptError> {
    expect_args(kw, args, 1, "1 duration")?;
    Ok(Command::Wait {
        units: Getter::compile(args[0], state)?,
    })
}

fn build_use_component(kw: &str, args: &[&str], state: &MatchState) -> Result<Command, ScriptError> {
    expect_args(kw, args, 1, "1 component selector")?;
    Ok(Command::UseComponent {
        components: component_selector_arg(args[0], state)?,
    })
}

fn build_use_zone(kw: &str, args: &[&str], state: &MatchState) -> Result<Command, ScriptError> {
    expect_args(kw, args, 1, "1 zone selector")?;
    Ok(Command::UseZone {
        zones: zone_selector_arg(args[0], state)?,
    })
}

fn build_shuffle(kw: &str, args: &[&str], state: &MatchState) -> Result<Command, ScriptError> {
    expect_args(kw, args, 1, "1 zone selector")?;
    Ok(Command::Shuffle {
        zones: zone_selector_arg(args[0], state)?,
    })
}

fn build_move_component_to_zone(
    kw: &str,
    args: &[&str],
    state: &MatchState,
) -> Result<Command, ScriptError> {
    if args.len() < 2 {
        return Err(ScriptError::WrongArgCount {
            keyword: kw.to_string(),
            expected: "2 selectors plus options",
            got: args.len(),
        });
    }
    let components = component_selector_arg(args[0], state)?;
    let zones = zone_selector_arg(args[1], state)?;

    let mut options = MoveOptions::default();
    for option in &args[2..] {
        match *option {
            "bottom" => options.to_bottom = true,
            "ordered" => options.keep_order = true,
            _ if option.starts_with("grid(") => {
                let (_, slot_args) = scan::head_and_args(option)?;
                if slot_args.len() != 2 {
                    return Err(ScriptError::BadOption((*option).to_string()));
                }
                let column = slot_args[0]
                    .parse()
                    .map_err(|_| ScriptError::BadOption((*option).to_string()))?;
                let row = slot_args[1]
                    .parse()
                    .map_err(|_| ScriptError::BadOption((*option).to_string()))?;
                options.grid_slot = Some((column, row));
            }
            _ => return Err(ScriptError::BadOption((*option).to_string())),
        }
    }

    Ok(Command::MoveComponentToZone {
        components,
        zones,
        options,
    })
}

fn build_set_component_field_value(
    kw: &str,
    args: &[&str],
    state: &MatchState,
) -> Result<Command, ScriptError> {
    expect_args(kw, args, 3, "selector, field, value")?;
    Ok(Command::SetComponentFieldValue {
        components: component_selector_arg(args[0], state)?,
        field: args[1].to_string(),
        value: Getter::compile(args[2], state)?,
    })
}

fn build_set_variable(kw: &str, args: &[&str], state: &MatchState) -> Result<Command, ScriptError> {
    expect_args(kw, args, 2, "name, value")?;
    if args[0].is_empty() {
        return Err(ScriptError::EmptyClause);
    }
    Ok(Command::SetVariable {
        name: args[0].to_string(),
        value: Getter::compile(args[1], state)?,
    })
}

fn build_add_tag(kw: &str, args: &[&str], state: &MatchState) -> Result<Command, ScriptError> {
    expect_args(kw, args, 2, "selector, tag")?;
    Ok(Command::AddTagToComponent {
        components: component_selector_arg(args[0], state)?,
        tag: args[1].to_string(),
    })
}

fn build_remove_tag(kw: &str, args: &[&str], state: &MatchState) -> Result<Command, ScriptError> {
    expect_args(kw, args, 2, "selector, tag")?;
    Ok(Command::RemoveTagFromComponent {
        components: component_selector_arg(args[0], state)?,
        tag: args[1].to_string(),
    })
}
