//! Boolean condition trees.
//!
//! A condition clause compiles into an immutable tagged-union tree built
//! bottom-up by a single left-to-right recursive-descent pass. Each `&` or
//! `|` binds to the immediately preceding completed token - that pass
//! order IS the precedence, so `a&b|c` means `(a&b)|c` and `a|b&c` means
//! `(a|b)&c`. Parentheses open nested sub-trees, unary `!` negates the
//! token it precedes.
//!
//! Leaves are either tag-membership tests (a literal tag, or a variable
//! resolved per evaluation) against the context's candidate tag set, or
//! comparisons between two expressions. Comparison sides resolve against
//! the candidate component's own fields first, so `Power>=3` means "this
//! candidate's Power" inside a filter predicate and an absolute expression
//! everywhere else.
//!
//! Evaluation is structural recursion and short-circuits.

use crate::core::entity::ComponentId;
use crate::core::error::ScriptError;
use crate::core::tags::TagSet;
use crate::scheduler::state::MatchState;

use super::getter::Getter;
use super::scan;
use super::value::Value;

/// Comparison operators, longest spelling first where it matters.
const COMPARISON_OPS: &[(&str, CmpOp)] = &[
    (">=", CmpOp::Ge),
    ("<=", CmpOp::Le),
    ("!=", CmpOp::Ne),
    ("=", CmpOp::Eq),
    (">", CmpOp::Gt),
    ("<", CmpOp::Lt),
];

/// A comparison operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `<`
    Lt,
}

impl CmpOp {
    /// Strip a leading comparison operator off text, e.g. for the `n:`
    /// selector filter (`n:>=3`).
    #[must_use]
    pub fn strip_prefix(text: &str) -> Option<(CmpOp, &str)> {
        COMPARISON_OPS
            .iter()
            .find_map(|(symbol, op)| text.strip_prefix(symbol).map(|rest| (*op, rest)))
    }

    /// Compare two numbers. Any NaN operand fails ordering comparisons.
    #[must_use]
    pub fn compare_numbers(self, left: f64, right: f64) -> bool {
        match self {
            CmpOp::Eq => left == right,
            CmpOp::Ne => left != right,
            CmpOp::Ge => left >= right,
            CmpOp::Le => left <= right,
            CmpOp::Gt => left > right,
            CmpOp::Lt => left < right,
        }
    }

    /// Compare two values: numeric when both sides parse as numbers,
    /// structural (including selection membership) otherwise.
    #[must_use]
    pub fn compare_values(self, left: &Value, right: &Value) -> bool {
        match self {
            CmpOp::Eq => left.loosely_equals(right),
            CmpOp::Ne => !left.loosely_equals(right),
            _ => self.compare_numbers(left.number(), right.number()),
        }
    }
}

/// Evaluation context for a condition tree.
///
/// The candidate tag set is polymorphic: a component's own tags, a zone's
/// tags, or any externally supplied string list. The candidate component
/// enables the field specialization of comparison leaves.
pub struct EvalContext<'a> {
    /// Match state for variables, pools, and expression evaluation.
    pub state: &'a MatchState,
    /// Candidate tag set for membership leaves.
    pub tags: Option<&'a TagSet>,
    /// Candidate component for field-first comparison resolution.
    pub component: Option<ComponentId>,
}

impl<'a> EvalContext<'a> {
    /// Context with no candidate: membership leaves are false and
    /// comparisons are absolute.
    #[must_use]
    pub fn bare(state: &'a MatchState) -> Self {
        Self {
            state,
            tags: None,
            component: None,
        }
    }

    /// Context for a candidate component: its tags for membership, its
    /// fields for comparisons.
    #[must_use]
    pub fn for_component(state: &'a MatchState, component: ComponentId) -> Self {
        Self {
            state,
            tags: state.component(component).map(|c| &c.tags),
            component: Some(component),
        }
    }

    /// Context for an arbitrary tag set.
    #[must_use]
    pub fn for_tags(state: &'a MatchState, tags: &'a TagSet) -> Self {
        Self {
            state,
            tags: Some(tags),
            component: None,
        }
    }
}

/// A compiled comparison leaf.
#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    left_text: String,
    left: Getter,
    op: CmpOp,
    right_text: String,
    right: Getter,
}

impl Comparison {
    /// Resolve one side: the candidate component's field of that name if
    /// it has one, otherwise the compiled expression.
    fn side_value(text: &str, getter: &Getter, ctx: &EvalContext) -> Value {
        if let Some(component) = ctx.component.and_then(|id| ctx.state.component(id)) {
            if let Some(field) = component.field(text) {
                return Value::from(field);
            }
        }
        getter.evaluate(ctx.state)
    }

    /// Evaluate the comparison.
    #[must_use]
    pub fn evaluate(&self, ctx: &EvalContext) -> bool {
        let left = Self::side_value(&self.left_text, &self.left, ctx);
        let right = Self::side_value(&self.right_text, &self.right, ctx);
        self.op.compare_values(&left, &right)
    }

    fn uses_variables(&self) -> bool {
        self.left.uses_variables() || self.right.uses_variables()
    }
}

/// An immutable boolean condition tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Always true (the empty clause).
    True,
    /// Tag membership against the context's candidate tag set.
    Tag {
        /// Literal tag, or a variable name.
        text: String,
        /// Resolve `text` through the variable store per evaluation.
        is_variable: bool,
    },
    /// Expression comparison.
    Comparison(Box<Comparison>),
    /// Negation.
    Not(Box<Condition>),
    /// Both sides must hold; right side not evaluated when left fails.
    And(Box<Condition>, Box<Condition>),
    /// Either side may hold; right side not evaluated when left holds.
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    /// Compile a boolean clause. Empty text is always-true.
    pub fn parse(text: &str, state: &MatchState) -> Result<Self, ScriptError> {
        let text = scan::strip_whitespace(text);
        if text.is_empty() {
            return Ok(Condition::True);
        }
        if !scan::balanced(&text) {
            return Err(ScriptError::UnbalancedParens(text));
        }
        parse_expr(&text, state)
    }

    /// Evaluate against a context. Short-circuits.
    #[must_use]
    pub fn evaluate(&self, ctx: &EvalContext) -> bool {
        match self {
            Condition::True => true,
            Condition::Tag { text, is_variable } => {
                let resolved = if *is_variable {
                    ctx.state.vars().get(text).unwrap_or("")
                } else {
                    text.as_str()
                };
                ctx.tags.is_some_and(|tags| tags.has(resolved))
            }
            Condition::Comparison(cmp) => cmp.evaluate(ctx),
            Condition::Not(inner) => !inner.evaluate(ctx),
            Condition::And(left, right) => left.evaluate(ctx) && right.evaluate(ctx),
            Condition::Or(left, right) => left.evaluate(ctx) || right.evaluate(ctx),
        }
    }

    /// Does any part of this tree read a match variable?
    #[must_use]
    pub fn uses_variables(&self) -> bool {
        match self {
            Condition::True => false,
            Condition::Tag { is_variable, .. } => *is_variable,
            Condition::Comparison(cmp) => cmp.uses_variables(),
            Condition::Not(inner) => inner.uses_variables(),
            Condition::And(left, right) | Condition::Or(left, right) => {
                left.uses_variables() || right.uses_variables()
            }
        }
    }
}

/// The single left-to-right pass: parse a token, then fold each following
/// `&`/`|` with the next token into the tree built so far.
fn parse_expr(text: &str, state: &MatchState) -> Result<Condition, ScriptError> {
    let mut cursor = 0;
    let mut tree: Option<Condition> = None;
    let mut pending: Option<char> = None;

    while cursor < text.len() {
        let (node, next) = parse_token(text, cursor, state)?;
        tree = Some(match (tree.take(), pending.take()) {
            (None, _) => node,
            (Some(left), Some('&')) => Condition::And(Box::new(left), Box::new(node)),
            (Some(left), Some('|')) => Condition::Or(Box::new(left), Box::new(node)),
            (Some(_), None) => return Err(ScriptError::BadComparison(text.to_string())),
            (Some(_), Some(_)) => unreachable!("pending is only ever set to '&' or '|'"),
        });
        cursor = next;

        if cursor < text.len() {
            match text.as_bytes()[cursor] {
                b'&' => pending = Some('&'),
                b'|' => pending = Some('|'),
                _ => return Err(ScriptError::BadComparison(text.to_string())),
            }
            cursor += 1;
        }
    }
    if pending.is_some() {
        // A trailing connector has nothing to bind to.
        return Err(ScriptError::BadComparison(text.to_string()));
    }
    tree.ok_or(ScriptError::EmptyClause)
}

/// Parse one token at `start`: leading `!`s, then a parenthesized
/// sub-tree or a leaf running to the next top-level connector.
fn parse_token(
    text: &str,
    start: usize,
    state: &MatchState,
) -> Result<(Condition, usize), ScriptError> {
    let mut negations = 0usize;
    let mut i = start;
    // A `!` is negation at token start, comparison inside a leaf (`a!=b`).
    while text[i..].starts_with('!') && !text[i..].starts_with("!=") {
        negations += 1;
        i += 1;
    }
    if i >= text.len() {
        return Err(ScriptError::EmptyClause);
    }

    let leaf_end = next_connector(text, i);
    let (mut node, end) = if text[i..].starts_with('(') {
        let close = scan::matching_paren(text, i)
            .ok_or_else(|| ScriptError::UnbalancedParens(text.to_string()))?;
        if close + 1 < leaf_end {
            // `(2+3)>=4`: the group is an operand of a comparison leaf.
            (parse_leaf(&text[i..leaf_end], state)?, leaf_end)
        } else {
            (parse_expr(&text[i + 1..close], state)?, close + 1)
        }
    } else {
        (parse_leaf(&text[i..leaf_end], state)?, leaf_end)
    };

    for _ in 0..negations {
        node = Condition::Not(Box::new(node));
    }
    Ok((node, end))
}

/// First `&` or `|` at nesting depth zero, at or after `from`.
fn next_connector(text: &str, from: usize) -> usize {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '&' | '|' if depth == 0 && i >= from => return i,
            _ => {}
        }
    }
    text.len()
}

/// Parse a leaf: a comparison when a top-level comparison operator is
/// present, otherwise a tag-membership test.
fn parse_leaf(text: &str, state: &MatchState) -> Result<Condition, ScriptError> {
    if text.is_empty() {
        return Err(ScriptError::EmptyClause);
    }

    if let Some((pos, symbol, op)) = find_comparison(text) {
        let left_text = &text[..pos];
        let right_text = &text[pos + symbol.len()..];
        if left_text.is_empty() || right_text.is_empty() {
            return Err(ScriptError::BadComparison(text.to_string()));
        }
        return Ok(Condition::Comparison(Box::new(Comparison {
            left_text: left_text.to_string(),
            left: Getter::compile(left_text, state)?,
            op,
            right_text: right_text.to_string(),
            right: Getter::compile(right_text, state)?,
        })));
    }

    Ok(Condition::Tag {
        is_variable: state.vars().is_defined(text),
        text: text.to_string(),
    })
}

/// First top-level comparison operator, two-character spellings first.
fn find_comparison(text: &str) -> Option<(usize, &'static str, CmpOp)> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ if depth == 0 => {
                for (symbol, op) in COMPARISON_OPS {
                    if text[i..].starts_with(symbol) {
                        return Some((i, symbol, *op));
                    }
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::setup::ComponentSpec;

    fn state() -> MatchState {
        MatchState::new(0)
    }

    fn tags(list: &[&str]) -> TagSet {
        list.iter().copied().collect()
    }

    fn eval(clause: &str, state: &MatchState, tag_set: &TagSet) -> bool {
        Condition::parse(clause, state)
            .unwrap()
            .evaluate(&EvalContext::for_tags(state, tag_set))
    }

    #[test]
    fn test_single_tag() {
        let state = state();
        let t = tags(&["Creature"]);
        assert!(eval("Creature", &state, &t));
        assert!(!eval("Spell", &state, &t));
    }

    #[test]
    fn test_empty_clause_is_true() {
        let state = state();
        assert!(eval("", &state, &tags(&[])));
    }

    #[test]
    fn test_truth_table_and_or() {
        // a&b|c binds left-to-right: (a&b)|c
        let state = state();
        let cases = [
            (&["a", "b", "c"][..], true),
            (&["a", "b"][..], true),
            (&["c"][..], true),
            (&["a", "c"][..], true),
            (&["a"][..], false),
            (&["b"][..], false),
            (&[][..], false),
        ];
        for (present, expected) in cases {
            let t = tags(present);
            assert_eq!(
                eval("a&b|c", &state, &t),
                expected,
                "a&b|c with {present:?}"
            );
        }
    }

    #[test]
    fn test_truth_table_parenthesized() {
        // a&(b|c)
        let state = state();
        let cases = [
            (&["a", "b"][..], true),
            (&["a", "c"][..], true),
            (&["a"][..], false),
            (&["b", "c"][..], false),
            (&["a", "b", "c"][..], true),
            (&[][..], false),
        ];
        for (present, expected) in cases {
            let t = tags(present);
            assert_eq!(
                eval("a&(b|c)", &state, &t),
                expected,
                "a&(b|c) with {present:?}"
            );
        }
    }

    #[test]
    fn test_truth_table_negation() {
        // !a&b
        let state = state();
        let cases = [
            (&["b"][..], true),
            (&["a", "b"][..], false),
            (&["a"][..], false),
            (&[][..], false),
        ];
        for (present, expected) in cases {
            let t = tags(present);
            assert_eq!(eval("!a&b", &state, &t), expected, "!a&b with {present:?}");
        }
    }

    #[test]
    fn test_left_to_right_binding_differs_from_precedence_tables() {
        // a|b&c parses as (a|b)&c under single-pass binding, so `a` alone
        // is NOT enough.
        let state = state();
        assert!(!eval("a|b&c", &state, &tags(&["a"])));
        assert!(eval("a|b&c", &state, &tags(&["a", "c"])));
        assert!(eval("a|b&c", &state, &tags(&["b", "c"])));
    }

    #[test]
    fn test_negated_group() {
        let state = state();
        assert!(eval("!(a|b)", &state, &tags(&["c"])));
        assert!(!eval("!(a|b)", &state, &tags(&["a"])));
        assert!(eval("!!a", &state, &tags(&["a"])));
    }

    #[test]
    fn test_numeric_comparison() {
        let state = state();
        let t = tags(&[]);
        assert!(eval("3>=2", &state, &t));
        assert!(eval("2.5<3", &state, &t));
        assert!(!eval("2>3", &state, &t));
        assert!(eval("4=4", &state, &t));
        assert!(eval("4!=5", &state, &t));
    }

    #[test]
    fn test_text_comparison() {
        let state = state();
        let t = tags(&[]);
        assert!(eval("Fire=Fire", &state, &t));
        assert!(!eval("Fire=Water", &state, &t));
        assert!(eval("Fire!=Water", &state, &t));
    }

    #[test]
    fn test_comparison_with_variables() {
        let mut state = state();
        state.vars_mut().set("score", "10");
        let t = tags(&[]);
        assert!(eval("score>=10", &state, &t));
        assert!(!eval("score>10", &state, &t));
    }

    #[test]
    fn test_variable_tag_membership() {
        let mut state = state();
        state.vars_mut().set("wanted", "Creature");

        let cond = Condition::parse("wanted", &state).unwrap();
        assert!(cond.uses_variables());
        assert!(cond.evaluate(&EvalContext::for_tags(&state, &tags(&["Creature"]))));

        // Re-pointing the variable re-resolves per evaluation.
        state.vars_mut().set("wanted", "Spell");
        assert!(!cond.evaluate(&EvalContext::for_tags(&state, &tags(&["Creature"]))));
    }

    #[test]
    fn test_field_specialization() {
        let mut state = state();
        let id = state.add_component(
            &ComponentSpec::new()
                .with_tag("Creature")
                .with_field("Power", 5),
        );

        let cond = Condition::parse("Power>=3", &state).unwrap();
        assert!(cond.evaluate(&EvalContext::for_component(&state, id)));

        // Without a candidate component the same text is absolute: the
        // literal "Power" is not a number, so >= fails.
        assert!(!cond.evaluate(&EvalContext::bare(&state)));
    }

    #[test]
    fn test_comparison_against_selection() {
        let mut state = state();
        let a = state.add_component(&ComponentSpec::new().with_tag("Creature"));
        let _b = state.add_component(&ComponentSpec::new().with_tag("Spell"));

        let clause = format!("{}=c(t:Creature)", a.raw());
        let cond = Condition::parse(&clause, &state).unwrap();
        assert!(cond.evaluate(&EvalContext::bare(&state)));

        let clause = format!("{}=c(t:Creature)", _b.raw());
        let cond = Condition::parse(&clause, &state).unwrap();
        assert!(!cond.evaluate(&EvalContext::bare(&state)));
    }

    #[test]
    fn test_parenthesized_arithmetic_leaf() {
        let state = state();
        assert!(eval("(2+3)>=4", &state, &tags(&[])));
        assert!(!eval("(2+3)>=6", &state, &tags(&[])));
    }

    #[test]
    fn test_short_circuit_no_candidate() {
        // With no candidate tag set, membership is false; `|` still
        // reaches the second side.
        let state = state();
        let cond = Condition::parse("a|3>2", &state).unwrap();
        assert!(cond.evaluate(&EvalContext::bare(&state)));
    }

    #[test]
    fn test_parse_errors() {
        let state = state();
        assert!(Condition::parse("(a&b", &state).is_err());
        assert!(Condition::parse("a&", &state).is_err());
        assert!(Condition::parse("=5", &state).is_err());
        assert!(Condition::parse("!", &state).is_err());
    }

    #[test]
    fn test_no_candidate_tagset_is_false() {
        let state = state();
        let cond = Condition::parse("Creature", &state).unwrap();
        assert!(!cond.evaluate(&EvalContext::bare(&state)));
    }
}
