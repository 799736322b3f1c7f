//! The embedded rule language.
//!
//! Rules are authored as short ASCII clauses; this module holds the whole
//! pipeline from text to bound, evaluable objects:
//!
//! - `scan`: whitespace stripping and protected-span splitting
//! - `value`: what expressions produce (number / text / selection)
//! - `arith`: infix numeric evaluation
//! - `getter`: the expression compiler (prefix-dispatched)
//! - `condition`: boolean condition trees (single-pass left-to-right)
//! - `selector`: entity queries over the component/zone/rule pools
//! - `command`: the imperative clause compiler (keyword-dispatched)

pub mod arith;
pub mod command;
pub mod condition;
pub mod getter;
pub mod scan;
pub mod selector;
pub mod value;

pub use arith::ArithOp;
pub use command::{Command, CommandBuilder, CommandRegistry, MoveOptions};
pub use condition::{CmpOp, Comparison, Condition, EvalContext};
pub use getter::{Getter, GetterNode, GetterRegistry, PrefixBuilder};
pub use selector::{ComponentSelector, RuleSelector, ZoneSelector};
pub use value::Value;
