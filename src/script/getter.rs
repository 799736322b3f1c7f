//! The expression engine.
//!
//! A `Getter` compiles one textual expression into a reusable node that
//! produces a number, a string, or an ordered entity selection when
//! evaluated against match state. Compilation dispatches on prefix/shape,
//! most specific first:
//!
//! 1. a known variable name - variable reference
//! 2. a parseable number - numeric literal
//! 3. an arithmetic operator outside protected sub-clauses - arithmetic run
//! 4. a registered prefix: `nc(`, `c(`/`allcomponents`, `cf(`, `ic(`,
//!    `nz(`, `rn(`, `z(`/`allzones`, `r(`/`allrules`
//! 5. anything else - string literal
//!
//! A leading combine operator (`+ * / % ^`) is stripped and stored
//! separately: it means "combine with the previous value" and is consumed
//! by variable assignment, not by evaluation.

use tracing::warn;

use crate::core::error::ScriptError;
use crate::scheduler::state::MatchState;

use super::arith::{self, ArithOp};
use super::scan;
use super::selector::{ComponentSelector, RuleSelector, ZoneSelector};
use super::value::Value;

/// A compiled, reusable expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Getter {
    combine: Option<ArithOp>,
    node: Box<GetterNode>,
}

impl Getter {
    /// Compile expression text. Whitespace is stripped first.
    ///
    /// Only malformed selector sub-clauses fail; anything else degrades to
    /// a string literal, matching the language's lenient surface.
    pub fn compile(text: &str, state: &MatchState) -> Result<Self, ScriptError> {
        let text = scan::strip_whitespace(text);
        let (combine, rest) = split_combine(&text);
        let node = GetterNode::compile(rest, state)?;
        Ok(Self { combine, node: Box::new(node) })
    }

    /// The stored combine operator, if the text led with one.
    #[must_use]
    pub fn combine(&self) -> Option<ArithOp> {
        self.combine
    }

    /// Evaluate against match state. The combine operator is not applied
    /// here - it is metadata for variable assignment.
    #[must_use]
    pub fn evaluate(&self, state: &MatchState) -> Value {
        self.node.evaluate(state)
    }

    /// Does any part of this expression read a match variable?
    #[must_use]
    pub fn uses_variables(&self) -> bool {
        self.node.uses_variables()
    }
}

/// Split a leading combine operator off expression text.
///
/// `-` is not a combine operator: a leading minus is a sign.
fn split_combine(text: &str) -> (Option<ArithOp>, &str) {
    let mut chars = text.chars();
    match chars.next() {
        Some(c @ ('+' | '*' | '/' | '%' | '^')) => (ArithOp::from_char(c), chars.as_str()),
        _ => (None, text),
    }
}

/// One node of a compiled expression.
#[derive(Clone, Debug, PartialEq)]
pub enum GetterNode {
    /// Numeric literal.
    Number(f64),
    /// String literal.
    Literal(String),
    /// Variable reference, resolved per evaluation.
    Variable(String),
    /// Operand/operator run in original order.
    Arithmetic {
        /// Operands, one more than operators.
        operands: Vec<GetterNode>,
        /// Operators between consecutive operands.
        operators: Vec<ArithOp>,
    },
    /// `rn(a,b)`: random in [a,b]; integer unless a bound is fractional.
    Random {
        /// Lower bound expression.
        low: Box<GetterNode>,
        /// Upper bound expression.
        high: Box<GetterNode>,
    },
    /// `nc(...)`: how many components match.
    ComponentCount(ComponentSelector),
    /// `c(...)` / `allcomponents`: component selection.
    Components(ComponentSelector),
    /// `cf(field,...)`: field value of the first selected component.
    ComponentField {
        /// Field name, resolved on the first selected component.
        field: String,
        /// Selection to take the first component from.
        selector: ComponentSelector,
    },
    /// `ic(...)`: zone index of the first selected component.
    ComponentIndex(ComponentSelector),
    /// `nz(...)`: how many zones match.
    ZoneCount(ZoneSelector),
    /// `z(...)` / `allzones`: zone selection.
    Zones(ZoneSelector),
    /// `r(...)` / `allrules`: rule selection.
    Rules(RuleSelector),
}

impl GetterNode {
    /// Compile already-stripped expression text.
    pub fn compile(text: &str, state: &MatchState) -> Result<Self, ScriptError> {
        if text.is_empty() {
            return Ok(GetterNode::Literal(String::new()));
        }
        if scan::is_wrapped(text) {
            return Self::compile(&text[1..text.len() - 1], state);
        }
        if state.vars().is_defined(text) {
            return Ok(GetterNode::Variable(text.to_string()));
        }
        if let Ok(n) = text.parse::<f64>() {
            return Ok(GetterNode::Number(n));
        }
        if let Some(node) = Self::compile_arithmetic(text, state)? {
            return Ok(node);
        }
        if let Some(builder) = state.getters().lookup(text) {
            return builder(text, state);
        }
        Ok(GetterNode::Literal(text.to_string()))
    }

    /// Tokenize an arithmetic run, or report `None` when the text has no
    /// top-level operator. Parenthesized sub-clauses are protected spans:
    /// operator characters inside them never split the run.
    fn compile_arithmetic(text: &str, state: &MatchState) -> Result<Option<Self>, ScriptError> {
        let mut operand_spans: Vec<&str> = Vec::new();
        let mut operators: Vec<ArithOp> = Vec::new();
        let mut depth = 0i32;
        let mut start = 0;

        for (i, c) in text.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ if depth == 0 && i > start => {
                    // An operator character right after another operator is
                    // a sign, which stays inside its operand.
                    if let Some(op) = ArithOp::from_char(c) {
                        operand_spans.push(&text[start..i]);
                        operators.push(op);
                        start = i + 1;
                    }
                }
                _ => {}
            }
        }
        if operators.is_empty() {
            return Ok(None);
        }
        operand_spans.push(&text[start..]);

        let operands = operand_spans
            .into_iter()
            .map(|span| Self::compile(span, state))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(GetterNode::Arithmetic { operands, operators }))
    }

    /// Evaluate against match state.
    #[must_use]
    pub fn evaluate(&self, state: &MatchState) -> Value {
        match self {
            GetterNode::Number(n) => Value::Number(*n),

            GetterNode::Literal(s) => Value::Text(s.clone()),

            GetterNode::Variable(name) => match state.vars().get(name) {
                Some(v) => Value::Text(v.to_string()),
                None => {
                    warn!(variable = %name, "undefined variable, using empty value");
                    Value::Text(String::new())
                }
            },

            GetterNode::Arithmetic { operands, operators } => {
                let nums: Vec<f64> = operands
                    .iter()
                    .map(|operand| operand.evaluate(state).number())
                    .collect();
                Value::Number(arith::evaluate_run(&nums, operators))
            }

            GetterNode::Random { low, high } => {
                let low = low.evaluate(state).number();
                let high = high.evaluate(state).number();
                if low.is_nan() || high.is_nan() {
                    warn!("non-numeric bound for rn(a,b)");
                    return Value::Number(f64::NAN);
                }
                let mut rng = state.rng();
                if low.fract() == 0.0 && high.fract() == 0.0 {
                    Value::Number(rng.int_in(low as i64, high as i64) as f64)
                } else {
                    Value::Number(rng.real_in(low, high))
                }
            }

            GetterNode::ComponentCount(selector) => {
                Value::Number(selector.count(state) as f64)
            }

            GetterNode::Components(selector) => Value::Components(selector.select(state)),

            GetterNode::ComponentField { field, selector } => {
                let Some(first) = selector.select(state).first().copied() else {
                    warn!(field = %field, "cf() selected nothing, using empty value");
                    return Value::Text(String::new());
                };
                match state.component(first).and_then(|c| c.field(field)) {
                    Some(value) => Value::from(value),
                    None => {
                        warn!(field = %field, component = %first, "missing field, using empty value");
                        Value::Text(String::new())
                    }
                }
            }

            GetterNode::ComponentIndex(selector) => {
                let Some(first) = selector.select(state).first().copied() else {
                    warn!("ic() selected nothing, using NaN");
                    return Value::Number(f64::NAN);
                };
                match state.position_of(first) {
                    Some(index) => Value::Number(index as f64),
                    None => Value::Number(f64::NAN),
                }
            }

            GetterNode::ZoneCount(selector) => Value::Number(selector.count(state) as f64),

            GetterNode::Zones(selector) => Value::Zones(selector.select(state)),

            GetterNode::Rules(selector) => Value::Rules(selector.select(state)),
        }
    }

    /// Does any part of this node read a match variable?
    #[must_use]
    pub fn uses_variables(&self) -> bool {
        match self {
            GetterNode::Number(_) | GetterNode::Literal(_) => false,
            GetterNode::Variable(_) => true,
            GetterNode::Arithmetic { operands, .. } => {
                operands.iter().any(GetterNode::uses_variables)
            }
            GetterNode::Random { low, high } => low.uses_variables() || high.uses_variables(),
            GetterNode::ComponentCount(s)
            | GetterNode::Components(s)
            | GetterNode::ComponentIndex(s) => s.uses_variables(),
            GetterNode::ComponentField { selector, .. } => selector.uses_variables(),
            GetterNode::ZoneCount(s) | GetterNode::Zones(s) => s.uses_variables(),
            GetterNode::Rules(s) => s.uses_variables(),
        }
    }
}

/// Builder signature for prefix-dispatched getters.
pub type PrefixBuilder = fn(&str, &MatchState) -> Result<GetterNode, ScriptError>;

/// Prefix-dispatch registry for selection/aggregate getters.
///
/// Entries are matched in registration order: a prefix ending in `(`
/// matches the start of the text, anything else must match exactly. The
/// standard set registers most specific first, and new kinds can be added
/// without touching the compiler.
#[derive(Clone, Debug)]
pub struct GetterRegistry {
    entries: Vec<(&'static str, PrefixBuilder)>,
}

impl GetterRegistry {
    /// Registry with the standard expression vocabulary.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self { entries: Vec::new() };
        registry.register("nc(", build_component_count);
        registry.register("cf(", build_component_field);
        registry.register("ic(", build_component_index);
        registry.register("nz(", build_zone_count);
        registry.register("rn(", build_random);
        registry.register("allcomponents", build_all_components);
        registry.register("allzones", build_all_zones);
        registry.register("allrules", build_all_rules);
        registry.register("c(", build_components);
        registry.register("z(", build_zones);
        registry.register("r(", build_rules);
        registry
    }

    /// Register a prefix. Later registrations lose to earlier ones, so
    /// specific prefixes must be registered before the ones they shadow.
    pub fn register(&mut self, prefix: &'static str, builder: PrefixBuilder) {
        self.entries.push((prefix, builder));
    }

    /// Find the builder for a piece of expression text.
    #[must_use]
    pub fn lookup(&self, text: &str) -> Option<PrefixBuilder> {
        self.entries
            .iter()
            .find(|(prefix, _)| {
                if prefix.ends_with('(') {
                    text.starts_with(prefix)
                } else {
                    text == *prefix
                }
            })
            .map(|(_, builder)| *builder)
    }
}

/// Extract the argument text of `prefix(args)`, requiring the closing
/// parenthesis to end the clause.
fn clause_args<'a>(text: &'a str, prefix: &str) -> Result<&'a str, ScriptError> {
    let open = prefix.len() - 1;
    match scan::matching_paren(text, open) {
        Some(close) if close == text.len() - 1 => Ok(&text[prefix.len()..close]),
        _ => Err(ScriptError::UnbalancedParens(text.to_string())),
    }
}

fn build_component_count(text: &str, state: &MatchState) -> Result<GetterNode, ScriptError> {
    let args = clause_args(text, "nc(")?;
    Ok(GetterNode::ComponentCount(ComponentSelector::parse(args, state)?))
}

fn build_components(text: &str, state: &MatchState) -> Result<GetterNode, ScriptError> {
    let args = clause_args(text, "c(")?;
    Ok(GetterNode::Components(ComponentSelector::parse(args, state)?))
}

fn build_all_components(_text: &str, _state: &MatchState) -> Result<GetterNode, ScriptError> {
    Ok(GetterNode::Components(ComponentSelector::all()))
}

fn build_component_field(text: &str, state: &MatchState) -> Result<GetterNode, ScriptError> {
    let args = clause_args(text, "cf(")?;
    let parts = scan::split_top_level(args, &[',']);
    let Some((field, filters)) = parts.split_first() else {
        return Err(ScriptError::WrongArgCount {
            keyword: "cf".to_string(),
            expected: "a field name plus filters",
            got: 0,
        });
    };
    Ok(GetterNode::ComponentField {
        field: (*field).to_string(),
        selector: ComponentSelector::parse(&filters.join(","), state)?,
    })
}

fn build_component_index(text: &str, state: &MatchState) -> Result<GetterNode, ScriptError> {
    let args = clause_args(text, "ic(")?;
    Ok(GetterNode::ComponentIndex(ComponentSelector::parse(args, state)?))
}

fn build_zone_count(text: &str, state: &MatchState) -> Result<GetterNode, ScriptError> {
    let args = clause_args(text, "nz(")?;
    Ok(GetterNode::ZoneCount(ZoneSelector::parse(args, state)?))
}

fn build_zones(text: &str, state: &MatchState) -> Result<GetterNode, ScriptError> {
    let args = clause_args(text, "z(")?;
    Ok(GetterNode::Zones(ZoneSelector::parse(args, state)?))
}

fn build_all_zones(_text: &str, _state: &MatchState) -> Result<GetterNode, ScriptError> {
    Ok(GetterNode::Zones(ZoneSelector::all()))
}

fn build_rules(text: &str, state: &MatchState) -> Result<GetterNode, ScriptError> {
    let args = clause_args(text, "r(")?;
    Ok(GetterNode::Rules(RuleSelector::parse(args, state)?))
}

fn build_all_rules(_text: &str, _state: &MatchState) -> Result<GetterNode, ScriptError> {
    Ok(GetterNode::Rules(RuleSelector::all()))
}

fn build_random(text: &str, state: &MatchState) -> Result<GetterNode, ScriptError> {
    let args = clause_args(text, "rn(")?;
    let parts = scan::split_top_level(args, &[',']);
    if parts.len() != 2 {
        return Err(ScriptError::WrongArgCount {
            keyword: "rn".to_string(),
            expected: "2 bounds",
            got: parts.len(),
        });
    }
    Ok(GetterNode::Random {
        low: Box::new(GetterNode::compile(parts[0], state)?),
        high: Box::new(GetterNode::compile(parts[1], state)?),
    })
}
