//! Engine error types.
//!
//! Two tiers, matching the engine's graceful-degradation policy:
//!
//! - [`ScriptError`]: parse-time failures in rule text. Never fatal - the
//!   compilers log the error and drop the offending clause, and the rest of
//!   the rule set keeps functioning.
//! - [`SetupError`]: the one genuinely fatal case, raised from
//!   `MatchScheduler::start` before any trigger has fired.
//!
//! Runtime misses (empty selection where a value was expected, unknown
//! field or variable) are not errors at all: they produce sentinel values
//! (empty string, NaN) with a logged warning, and execution continues.

use thiserror::Error;

/// A parse-time failure in clause text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// Command keyword not present in the registry.
    #[error("unknown keyword `{0}`")]
    UnknownKeyword(String),

    /// Right keyword, wrong number of arguments.
    #[error("`{keyword}` expects {expected}, got {got} argument(s)")]
    WrongArgCount {
        /// The keyword being compiled.
        keyword: String,
        /// Human-readable arity description, e.g. `"2 selectors"`.
        expected: &'static str,
        /// Argument count actually supplied.
        got: usize,
    },

    /// Parenthesis nesting never closes (or closes too often).
    #[error("unbalanced parentheses in `{0}`")]
    UnbalancedParens(String),

    /// Nothing left to compile after whitespace stripping.
    #[error("empty clause")]
    EmptyClause,

    /// A selector filter that isn't `key:value` or uses an unknown key.
    #[error("malformed selector filter `{0}`")]
    BadFilter(String),

    /// A selector argument where `c(...)`/`z(...)` was required.
    #[error("expected a selector, got `{0}`")]
    ExpectedSelector(String),

    /// A comparison clause with no recognizable operator or operands.
    #[error("malformed comparison `{0}`")]
    BadComparison(String),

    /// An unrecognized trailing option on a command clause.
    #[error("unrecognized option `{0}`")]
    BadOption(String),
}

/// A fatal failure during `MatchScheduler::start`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SetupError {
    /// A game-level variable collides with a reserved built-in name.
    #[error("variable `{0}` collides with a reserved built-in name")]
    ReservedVariable(String),
}
