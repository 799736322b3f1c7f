//! Tag sets.
//!
//! Every component, zone, and rule carries a set of string tags. Tags are
//! the cheapest script predicate: condition leaves test membership, and the
//! `t:` selector filter runs a boolean expression over them.

use serde::{Deserialize, Serialize};

/// An insertion-ordered set of string tags.
///
/// Duplicates are rejected on insert; order is preserved so displays and
/// serialized forms stay stable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    /// Create an empty tag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check membership.
    #[must_use]
    pub fn has(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Add a tag. Returns `false` if it was already present.
    pub fn add(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.has(&tag) {
            false
        } else {
            self.tags.push(tag);
            true
        }
    }

    /// Remove a tag. Returns `false` if it was absent.
    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    /// Iterate tags in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.add(tag);
        }
        set
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> Self {
        tags.into_iter().collect()
    }
}

impl std::fmt::Display for TagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tags.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_has() {
        let mut tags = TagSet::new();
        assert!(tags.add("Creature"));
        assert!(tags.add("Fast"));
        assert!(!tags.add("Creature"));

        assert!(tags.has("Creature"));
        assert!(tags.has("Fast"));
        assert!(!tags.has("Slow"));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut tags: TagSet = ["Creature", "Fast"].into_iter().collect();
        assert!(tags.remove("Fast"));
        assert!(!tags.remove("Fast"));
        assert!(!tags.has("Fast"));
        assert!(tags.has("Creature"));
    }

    #[test]
    fn test_order_preserved() {
        let tags: TagSet = ["b", "a", "c"].into_iter().collect();
        let collected: Vec<_> = tags.iter().collect();
        assert_eq!(collected, vec!["b", "a", "c"]);
        assert_eq!(format!("{tags}"), "b,a,c");
    }

    #[test]
    fn test_serialization() {
        let tags: TagSet = ["Creature", "Fast"].into_iter().collect();
        let json = serde_json::to_string(&tags).unwrap();
        let deserialized: TagSet = serde_json::from_str(&json).unwrap();
        assert_eq!(tags, deserialized);
    }
}
