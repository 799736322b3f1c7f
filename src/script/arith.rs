//! Infix numeric evaluation.
//!
//! The getter compiler tokenizes an arithmetic clause into operand and
//! operator runs (in original order, never descending into parenthesized
//! sub-clauses); this module evaluates such a run with conventional
//! precedence: `^` before `*` `/` `%` before `+` `-`, left to right within
//! a level.

use serde::{Deserialize, Serialize};

/// A binary arithmetic operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `^`
    Pow,
}

impl ArithOp {
    /// Map an operator character.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(ArithOp::Add),
            '-' => Some(ArithOp::Sub),
            '*' => Some(ArithOp::Mul),
            '/' => Some(ArithOp::Div),
            '%' => Some(ArithOp::Mod),
            '^' => Some(ArithOp::Pow),
            _ => None,
        }
    }

    /// The operator's source character.
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            ArithOp::Add => '+',
            ArithOp::Sub => '-',
            ArithOp::Mul => '*',
            ArithOp::Div => '/',
            ArithOp::Mod => '%',
            ArithOp::Pow => '^',
        }
    }

    /// Binding strength; higher binds tighter.
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            ArithOp::Pow => 3,
            ArithOp::Mul | ArithOp::Div | ArithOp::Mod => 2,
            ArithOp::Add | ArithOp::Sub => 1,
        }
    }

    /// Apply to two operands.
    #[must_use]
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            ArithOp::Add => left + right,
            ArithOp::Sub => left - right,
            ArithOp::Mul => left * right,
            ArithOp::Div => left / right,
            ArithOp::Mod => left % right,
            ArithOp::Pow => left.powf(right),
        }
    }
}

/// Evaluate an operand/operator run in original order.
///
/// `operands.len()` must be `operators.len() + 1`; a malformed run yields
/// NaN rather than panicking, in keeping with the sentinel error model.
#[must_use]
pub fn evaluate_run(operands: &[f64], operators: &[ArithOp]) -> f64 {
    if operands.is_empty() || operands.len() != operators.len() + 1 {
        return f64::NAN;
    }

    let mut nums = operands.to_vec();
    let mut ops = operators.to_vec();

    for level in (1..=3u8).rev() {
        let mut i = 0;
        while i < ops.len() {
            if ops[i].precedence() == level {
                let folded = ops[i].apply(nums[i], nums[i + 1]);
                nums[i] = folded;
                nums.remove(i + 1);
                ops.remove(i);
            } else {
                i += 1;
            }
        }
    }
    nums[0]
}
