//! Entity selectors - compiled queries over the component/zone/rule pools.
//!
//! A clause like `c(z:Play&t:Creature,f:Power>=3,x:2)` compiles into an
//! AND of predicates plus an optional truncation. Filters are separated by
//! top-level `&` or `,` interchangeably; a filter value that needs its own
//! `&`/`|` algebra (a boolean tag expression) must parenthesize it:
//! `t:((Creature|Artifact)&!Token)`.
//!
//! Component filter keys: `i` (identity, literal or variable), `z` (owning
//! zone by tag expression or zone-id variable; always tested first as the
//! cheap reject), `t` (own tags), `f` (fields), `n` (zone index satisfies
//! a comparison), `x`/`b` (truncate to the first N from top/bottom).
//! Zone and rule selectors support the `i`/`t` analogues.
//!
//! Fast paths: no filters at all returns the whole pool; a variable-free
//! filter set is evaluated once and cached for the selector's lifetime
//! (lazily, on first evaluation - compiled selectors may exist before the
//! pools are fully indexed).

use std::cell::OnceCell;

use smallvec::SmallVec;
use tracing::warn;

use crate::core::entity::{ComponentId, RuleId, ZoneId};
use crate::core::error::ScriptError;
use crate::scheduler::state::MatchState;

use super::condition::{CmpOp, Condition, EvalContext};
use super::getter::Getter;
use super::scan;

/// An entity id written literally or held by a variable.
#[derive(Clone, Debug, PartialEq)]
enum IdRef {
    Literal(u32),
    Variable(String),
}

impl IdRef {
    fn parse(text: &str, state: &MatchState) -> Result<Self, ScriptError> {
        if state.vars().is_defined(text) {
            Ok(IdRef::Variable(text.to_string()))
        } else {
            text.parse::<u32>()
                .map(IdRef::Literal)
                .map_err(|_| ScriptError::BadFilter(format!("i:{text}")))
        }
    }

    fn resolve(&self, state: &MatchState) -> Option<u32> {
        match self {
            IdRef::Literal(id) => Some(*id),
            IdRef::Variable(name) => state.vars().get(name)?.parse().ok(),
        }
    }

    fn uses_variables(&self) -> bool {
        matches!(self, IdRef::Variable(_))
    }
}

/// Truncation: keep the first N occupants by zone position.
#[derive(Clone, Debug, PartialEq)]
enum Truncation {
    /// `x:N` - N highest zone indices, in descending order.
    FromTop(Getter),
    /// `b:N` - N lowest zone indices, in ascending order.
    FromBottom(Getter),
}

impl Truncation {
    fn count(&self, state: &MatchState) -> usize {
        let getter = match self {
            Truncation::FromTop(g) | Truncation::FromBottom(g) => g,
        };
        let n = getter.evaluate(state).number();
        if n.is_nan() || n < 0.0 {
            warn!("non-numeric truncation count, selecting nothing");
            0
        } else {
            n as usize
        }
    }

    fn uses_variables(&self) -> bool {
        match self {
            Truncation::FromTop(g) | Truncation::FromBottom(g) => g.uses_variables(),
        }
    }
}

/// One compiled component predicate.
#[derive(Clone, Debug, PartialEq)]
enum ComponentFilter {
    /// `i:` - identity.
    Identity(IdRef),
    /// `z:` - owning zone's id held by a variable.
    ZoneVar(String),
    /// `z:` - owning zone's tags match.
    ZoneTags(Condition),
    /// `t:` - own tags match.
    Tags(Condition),
    /// `f:` - fields satisfy a comparison.
    Fields(Condition),
    /// `n:` - zone index satisfies a comparison.
    Index(CmpOp, Getter),
}

impl ComponentFilter {
    fn matches(&self, id: ComponentId, state: &MatchState) -> bool {
        let Some(component) = state.component(id) else {
            return false;
        };
        match self {
            ComponentFilter::Identity(id_ref) => id_ref.resolve(state) == Some(id.raw()),
            ComponentFilter::ZoneVar(name) => {
                let Some(zone_id) = state.vars().get(name).and_then(|v| v.parse::<u32>().ok())
                else {
                    return false;
                };
                component.zone == Some(ZoneId(zone_id))
            }
            ComponentFilter::ZoneTags(condition) => {
                let Some(zone) = component.zone.and_then(|z| state.zone(z)) else {
                    return false;
                };
                condition.evaluate(&EvalContext::for_tags(state, &zone.tags))
            }
            ComponentFilter::Tags(condition) => {
                condition.evaluate(&EvalContext::for_component(state, id))
            }
            ComponentFilter::Fields(condition) => {
                condition.evaluate(&EvalContext::for_component(state, id))
            }
            ComponentFilter::Index(op, count) => {
                let Some(index) = state.position_of(id) else {
                    return false;
                };
                op.compare_numbers(index as f64, count.evaluate(state).number())
            }
        }
    }

    fn uses_variables(&self) -> bool {
        match self {
            ComponentFilter::Identity(id_ref) => id_ref.uses_variables(),
            ComponentFilter::ZoneVar(_) => true,
            ComponentFilter::ZoneTags(c) | ComponentFilter::Tags(c) | ComponentFilter::Fields(c) => {
                c.uses_variables()
            }
            ComponentFilter::Index(_, g) => g.uses_variables(),
        }
    }

    /// Zone filters run first: rejecting on the owning zone is cheaper
    /// than tag/field condition walks.
    fn order(&self) -> u8 {
        match self {
            ComponentFilter::ZoneVar(_) | ComponentFilter::ZoneTags(_) => 0,
            _ => 1,
        }
    }
}

/// A compiled query over the component pool.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentSelector {
    filters: SmallVec<[ComponentFilter; 4]>,
    truncation: Option<Truncation>,
    uses_variables: bool,
    cache: OnceCell<Vec<ComponentId>>,
}

impl ComponentSelector {
    /// The whole-pool selector (`allcomponents`).
    #[must_use]
    pub fn all() -> Self {
        Self {
            filters: SmallVec::new(),
            truncation: None,
            uses_variables: false,
            cache: OnceCell::new(),
        }
    }

    /// Compile the filter text inside `c(...)`.
    pub fn parse(filters_text: &str, state: &MatchState) -> Result<Self, ScriptError> {
        let text = scan::strip_whitespace(filters_text);
        if !scan::balanced(&text) {
            return Err(ScriptError::UnbalancedParens(text));
        }

        let mut filters: SmallVec<[ComponentFilter; 4]> = SmallVec::new();
        let mut truncation = None;

        for part in scan::split_top_level(&text, &['&', ',']) {
            let Some((key, value)) = part.split_once(':') else {
                return Err(ScriptError::BadFilter(part.to_string()));
            };
            match key {
                "i" => filters.push(ComponentFilter::Identity(IdRef::parse(value, state)?)),
                "z" => {
                    if state.vars().is_defined(value) {
                        filters.push(ComponentFilter::ZoneVar(value.to_string()));
                    } else {
                        filters.push(ComponentFilter::ZoneTags(Condition::parse(value, state)?));
                    }
                }
                "t" => filters.push(ComponentFilter::Tags(Condition::parse(value, state)?)),
                "f" => filters.push(ComponentFilter::Fields(Condition::parse(value, state)?)),
                "n" => {
                    let (op, rest) = CmpOp::strip_prefix(value).unwrap_or((CmpOp::Eq, value));
                    filters.push(ComponentFilter::Index(op, Getter::compile(rest, state)?));
                }
                "x" => truncation = Some(Truncation::FromTop(Getter::compile(value, state)?)),
                "b" => truncation = Some(Truncation::FromBottom(Getter::compile(value, state)?)),
                _ => return Err(ScriptError::BadFilter(part.to_string())),
            }
        }

        filters.sort_by_key(ComponentFilter::order);
        let uses_variables = filters.iter().any(ComponentFilter::uses_variables)
            || truncation.as_ref().is_some_and(Truncation::uses_variables);

        Ok(Self {
            filters,
            truncation,
            uses_variables,
            cache: OnceCell::new(),
        })
    }

    /// Run the query.
    #[must_use]
    pub fn select(&self, state: &MatchState) -> Vec<ComponentId> {
        if self.filters.is_empty() && self.truncation.is_none() {
            return state.components().iter().map(|c| c.id).collect();
        }
        if !self.uses_variables {
            return self.cache.get_or_init(|| self.scan(state)).clone();
        }
        self.scan(state)
    }

    /// Count matches without materializing or truncating a selection.
    #[must_use]
    pub fn count(&self, state: &MatchState) -> usize {
        state
            .components()
            .iter()
            .filter(|c| self.matches(c.id, state))
            .count()
    }

    /// Does the filter set reference a mutable match variable?
    #[must_use]
    pub fn uses_variables(&self) -> bool {
        self.uses_variables
    }

    fn matches(&self, id: ComponentId, state: &MatchState) -> bool {
        self.filters.iter().all(|f| f.matches(id, state))
    }

    fn scan(&self, state: &MatchState) -> Vec<ComponentId> {
        let mut matched: Vec<ComponentId> = state
            .components()
            .iter()
            .filter(|c| self.matches(c.id, state))
            .map(|c| c.id)
            .collect();

        // Sorting is skipped entirely when there is no truncation.
        match &self.truncation {
            None => matched,
            Some(t @ Truncation::FromTop(_)) => {
                matched.sort_by_key(|&id| std::cmp::Reverse(position_key(id, state)));
                matched.truncate(t.count(state));
                matched
            }
            Some(t @ Truncation::FromBottom(_)) => {
                matched.sort_by_key(|&id| position_key(id, state));
                matched.truncate(t.count(state));
                matched
            }
        }
    }
}

/// Zone position as a sort key; components outside every zone sort lowest.
fn position_key(id: ComponentId, state: &MatchState) -> i64 {
    state.position_of(id).map_or(-1, |p| p as i64)
}

/// One compiled zone predicate.
#[derive(Clone, Debug, PartialEq)]
enum ZoneFilter {
    Identity(IdRef),
    Tags(Condition),
}

impl ZoneFilter {
    fn matches(&self, id: ZoneId, state: &MatchState) -> bool {
        let Some(zone) = state.zone(id) else {
            return false;
        };
        match self {
            ZoneFilter::Identity(id_ref) => id_ref.resolve(state) == Some(id.raw()),
            ZoneFilter::Tags(condition) => {
                condition.evaluate(&EvalContext::for_tags(state, &zone.tags))
            }
        }
    }

    fn uses_variables(&self) -> bool {
        match self {
            ZoneFilter::Identity(id_ref) => id_ref.uses_variables(),
            ZoneFilter::Tags(c) => c.uses_variables(),
        }
    }
}

/// A compiled query over the zone pool.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneSelector {
    filters: SmallVec<[ZoneFilter; 2]>,
    uses_variables: bool,
    cache: OnceCell<Vec<ZoneId>>,
}

impl ZoneSelector {
    /// The whole-pool selector (`allzones`).
    #[must_use]
    pub fn all() -> Self {
        Self {
            filters: SmallVec::new(),
            uses_variables: false,
            cache: OnceCell::new(),
        }
    }

    /// Compile the filter text inside `z(...)`.
    pub fn parse(filters_text: &str, state: &MatchState) -> Result<Self, ScriptError> {
        let text = scan::strip_whitespace(filters_text);
        if !scan::balanced(&text) {
            return Err(ScriptError::UnbalancedParens(text));
        }

        let mut filters: SmallVec<[ZoneFilter; 2]> = SmallVec::new();
        for part in scan::split_top_level(&text, &['&', ',']) {
            let Some((key, value)) = part.split_once(':') else {
                return Err(ScriptError::BadFilter(part.to_string()));
            };
            match key {
                "i" => filters.push(ZoneFilter::Identity(IdRef::parse(value, state)?)),
                "t" => filters.push(ZoneFilter::Tags(Condition::parse(value, state)?)),
                _ => return Err(ScriptError::BadFilter(part.to_string())),
            }
        }

        let uses_variables = filters.iter().any(ZoneFilter::uses_variables);
        Ok(Self {
            filters,
            uses_variables,
            cache: OnceCell::new(),
        })
    }

    /// Run the query.
    #[must_use]
    pub fn select(&self, state: &MatchState) -> Vec<ZoneId> {
        if self.filters.is_empty() {
            return state.zones().iter().map(|z| z.id).collect();
        }
        if !self.uses_variables {
            return self.cache.get_or_init(|| self.scan(state)).clone();
        }
        self.scan(state)
    }

    /// Count matches without materializing a selection.
    #[must_use]
    pub fn count(&self, state: &MatchState) -> usize {
        state
            .zones()
            .iter()
            .filter(|z| self.filters.iter().all(|f| f.matches(z.id, state)))
            .count()
    }

    /// Does the filter set reference a mutable match variable?
    #[must_use]
    pub fn uses_variables(&self) -> bool {
        self.uses_variables
    }

    fn scan(&self, state: &MatchState) -> Vec<ZoneId> {
        state
            .zones()
            .iter()
            .filter(|z| self.filters.iter().all(|f| f.matches(z.id, state)))
            .map(|z| z.id)
            .collect()
    }
}

/// One compiled rule predicate.
#[derive(Clone, Debug, PartialEq)]
enum RuleFilter {
    Identity(IdRef),
    Tags(Condition),
}

impl RuleFilter {
    fn matches(&self, id: RuleId, state: &MatchState) -> bool {
        let Some(rule) = state.rule(id) else {
            return false;
        };
        match self {
            RuleFilter::Identity(id_ref) => id_ref.resolve(state) == Some(id.raw()),
            RuleFilter::Tags(condition) => {
                condition.evaluate(&EvalContext::for_tags(state, &rule.tags))
            }
        }
    }

    fn uses_variables(&self) -> bool {
        match self {
            RuleFilter::Identity(id_ref) => id_ref.uses_variables(),
            RuleFilter::Tags(c) => c.uses_variables(),
        }
    }
}

/// A compiled query over the rule pool.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleSelector {
    filters: SmallVec<[RuleFilter; 2]>,
    uses_variables: bool,
    cache: OnceCell<Vec<RuleId>>,
}

impl RuleSelector {
    /// The whole-pool selector (`allrules`).
    #[must_use]
    pub fn all() -> Self {
        Self {
            filters: SmallVec::new(),
            uses_variables: false,
            cache: OnceCell::new(),
        }
    }

    /// Compile the filter text inside `r(...)`.
    pub fn parse(filters_text: &str, state: &MatchState) -> Result<Self, ScriptError> {
        let text = scan::strip_whitespace(filters_text);
        if !scan::balanced(&text) {
            return Err(ScriptError::UnbalancedParens(text));
        }

        let mut filters: SmallVec<[RuleFilter; 2]> = SmallVec::new();
        for part in scan::split_top_level(&text, &['&', ',']) {
            let Some((key, value)) = part.split_once(':') else {
                return Err(ScriptError::BadFilter(part.to_string()));
            };
            match key {
                "i" => filters.push(RuleFilter::Identity(IdRef::parse(value, state)?)),
                "t" => filters.push(RuleFilter::Tags(Condition::parse(value, state)?)),
                _ => return Err(ScriptError::BadFilter(part.to_string())),
            }
        }

        let uses_variables = filters.iter().any(RuleFilter::uses_variables);
        Ok(Self {
            filters,
            uses_variables,
            cache: OnceCell::new(),
        })
    }

    /// Run the query.
    #[must_use]
    pub fn select(&self, state: &MatchState) -> Vec<RuleId> {
        if self.filters.is_empty() {
            return state.rules().iter().map(|r| r.id).collect();
        }
        if !self.uses_variables {
            return self.cache.get_or_init(|| self.scan(state)).clone();
        }
        self.scan(state)
    }

    /// Does the filter set reference a mutable match variable?
    #[must_use]
    pub fn uses_variables(&self) -> bool {
        self.uses_variables
    }

    fn scan(&self, state: &MatchState) -> Vec<RuleId> {
        state
            .rules()
            .iter()
            .filter(|r| self.filters.iter().all(|f| f.matches(r.id, state)))
            .map(|r| r.id)
            .collect()
    }
}
