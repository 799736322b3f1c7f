//! Typed field values for components.
//!
//! Fields are game-specific properties like "Power", "Cost", or "Faction".
//! The engine doesn't interpret them - rules do, through comparison clauses
//! and the `f:` selector filter.
//!
//! ## FieldValue Types
//!
//! - `Number`: numeric values (power, cost); stored as `f64` so script
//!   arithmetic and field values share one numeric model
//! - `Text`: everything else

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Value for a component field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Numeric value (power, cost, count).
    Number(f64),
    /// Text value (faction, subtype).
    Text(String),
}

impl FieldValue {
    /// Parse script text into a field value.
    ///
    /// Text that parses as a number becomes `Number`, so `"3"` written by a
    /// rule and `3.0` supplied by the entity provider compare equal.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text.parse::<f64>() {
            Ok(n) => FieldValue::Number(n),
            Err(_) => FieldValue::Text(text.to_string()),
        }
    }

    /// Get as a number if this is a Number value.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as a string reference if this is a Text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render for scripts: numbers drop a trailing `.0`, text is verbatim.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Number(f64::from(v))
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

/// Collection of named fields.
pub type Fields = FxHashMap<String, FieldValue>;

/// Render a number the way scripts write them: integral values without a
/// fractional part, NaN (the numeric miss sentinel) as the empty string.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        String::new()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
