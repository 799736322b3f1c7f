//! Script values.
//!
//! Everything a getter can produce: a number, a piece of text, or an
//! ordered entity selection. Values convert loosely - text that parses as
//! a number is numeric where a number is wanted, and the numeric miss
//! sentinel is NaN (rendered as the empty string).

use crate::core::entity::{ComponentId, RuleId, ZoneId};
use crate::core::fields::{format_number, FieldValue};

/// A value produced by evaluating a getter.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A number.
    Number(f64),
    /// A piece of text.
    Text(String),
    /// An ordered component selection.
    Components(Vec<ComponentId>),
    /// An ordered zone selection.
    Zones(Vec<ZoneId>),
    /// An ordered rule selection.
    Rules(Vec<RuleId>),
}

impl Value {
    /// Numeric view. Text parses leniently; selections have no numeric
    /// value and yield NaN.
    #[must_use]
    pub fn number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(s) => s.parse().unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }

    /// Text view. Numbers render without a trailing `.0`; selections render
    /// as comma-joined ids.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Components(ids) => join_ids(ids.iter().map(|id| id.raw())),
            Value::Zones(ids) => join_ids(ids.iter().map(|id| id.raw())),
            Value::Rules(ids) => join_ids(ids.iter().map(|id| id.raw())),
        }
    }

    /// Is this an entity selection?
    #[must_use]
    pub fn is_selection(&self) -> bool {
        matches!(
            self,
            Value::Components(_) | Value::Zones(_) | Value::Rules(_)
        )
    }

    /// Loose equality, the way comparison clauses are defined:
    ///
    /// - against a selection, every item of the left value must be
    ///   contained in the right selection (a scalar counts as a one-item
    ///   selection matched by id);
    /// - otherwise numeric comparison when both sides parse as numbers;
    /// - otherwise exact text.
    #[must_use]
    pub fn loosely_equals(&self, other: &Value) -> bool {
        if other.is_selection() {
            return contained_in(self, other);
        }
        if self.is_selection() {
            return contained_in(other, self);
        }

        let (l, r) = (self.number(), other.number());
        if !l.is_nan() && !r.is_nan() {
            return l == r;
        }
        self.text() == other.text()
    }
}

impl From<&FieldValue> for Value {
    fn from(field: &FieldValue) -> Self {
        match field {
            FieldValue::Number(n) => Value::Number(*n),
            FieldValue::Text(s) => Value::Text(s.clone()),
        }
    }
}

fn join_ids(ids: impl Iterator<Item = u32>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}

/// Is every item of `left` contained in the `right` selection?
///
/// A scalar left operand is matched against the selection's raw ids.
fn contained_in(left: &Value, right: &Value) -> bool {
    match right {
        Value::Components(pool) => items_of(left).is_some_and(|items| {
            items.iter().all(|id| pool.iter().any(|c| c.raw() == *id))
        }),
        Value::Zones(pool) => items_of(left).is_some_and(|items| {
            items.iter().all(|id| pool.iter().any(|z| z.raw() == *id))
        }),
        Value::Rules(pool) => items_of(left).is_some_and(|items| {
            items.iter().all(|id| pool.iter().any(|r| r.raw() == *id))
        }),
        _ => false,
    }
}

/// The raw ids a value stands for when used in containment: a selection's
/// ids, or a scalar parsed as a single id.
fn items_of(value: &Value) -> Option<Vec<u32>> {
    match value {
        Value::Components(ids) => Some(ids.iter().map(|id| id.raw()).collect()),
        Value::Zones(ids) => Some(ids.iter().map(|id| id.raw()).collect()),
        Value::Rules(ids) => Some(ids.iter().map(|id| id.raw()).collect()),
        Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 => Some(vec![*n as u32]),
        Value::Text(s) => s.parse::<u32>().ok().map(|id| vec![id]),
        Value::Number(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_view() {
        assert_eq!(Value::Number(3.0).number(), 3.0);
        assert_eq!(Value::Text("4.5".to_string()).number(), 4.5);
        assert!(Value::Text("abc".to_string()).number().is_nan());
        assert!(Value::Components(vec![]).number().is_nan());
    }

    #[test]
    fn test_text_view() {
        assert_eq!(Value::Number(3.0).text(), "3");
        assert_eq!(Value::Number(3.5).text(), "3.5");
        assert_eq!(Value::Text("hi".to_string()).text(), "hi");
        assert_eq!(
            Value::Components(vec![ComponentId(1), ComponentId(4)]).text(),
            "1,4"
        );
    }

    #[test]
    fn test_numeric_equality() {
        let a = Value::Text("3".to_string());
        let b = Value::Number(3.0);
        assert!(a.loosely_equals(&b));
        assert!(b.loosely_equals(&a));
    }

    #[test]
    fn test_text_equality() {
        let a = Value::Text("Fire".to_string());
        assert!(a.loosely_equals(&Value::Text("Fire".to_string())));
        assert!(!a.loosely_equals(&Value::Text("Water".to_string())));
    }

    #[test]
    fn test_selection_containment() {
        let pool = Value::Components(vec![ComponentId(1), ComponentId(2), ComponentId(3)]);
        let subset = Value::Components(vec![ComponentId(2), ComponentId(3)]);
        let outside = Value::Components(vec![ComponentId(2), ComponentId(9)]);

        assert!(subset.loosely_equals(&pool));
        assert!(!outside.loosely_equals(&pool));

        // A scalar is a one-item selection matched by id.
        assert!(Value::Number(2.0).loosely_equals(&pool));
        assert!(Value::Text("3".to_string()).loosely_equals(&pool));
        assert!(!Value::Number(9.0).loosely_equals(&pool));
    }

    #[test]
    fn test_containment_is_by_raw_id() {
        // Kinds don't matter for containment, only raw ids; mixing kinds is
        // the rule author's mistake but is well-defined.
        let components = Value::Components(vec![ComponentId(1)]);
        let zones = Value::Zones(vec![ZoneId(1), ZoneId(2)]);
        assert!(components.loosely_equals(&zones));
    }

    #[test]
    fn test_from_field_value() {
        assert_eq!(Value::from(&FieldValue::Number(2.0)), Value::Number(2.0));
        assert_eq!(
            Value::from(&FieldValue::Text("x".to_string())),
            Value::Text("x".to_string())
        );
    }
}
