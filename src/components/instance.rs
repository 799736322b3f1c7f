//! Components - the tagged, fielded entities rules act upon.
//!
//! A component tracks its tag set, its typed fields, and a back-reference
//! to the zone currently holding it (at most one). Construction happens at
//! match start from a `ComponentSpec`; the component then lives for the
//! whole match.

use serde::{Deserialize, Serialize};

use crate::core::entity::{ComponentId, ZoneId};
use crate::core::fields::{FieldValue, Fields};
use crate::core::setup::ComponentSpec;
use crate::core::tags::TagSet;

/// A component in a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Unique id, assigned sequentially at match start.
    pub id: ComponentId,

    /// Tag set (types, keywords, markers).
    pub tags: TagSet,

    /// Named fields with typed values.
    fields: Fields,

    /// Zone currently holding this component, if any.
    pub zone: Option<ZoneId>,
}

impl Component {
    /// Create an empty component.
    #[must_use]
    pub fn new(id: ComponentId) -> Self {
        Self {
            id,
            tags: TagSet::new(),
            fields: Fields::default(),
            zone: None,
        }
    }

    /// Build a component from a provider spec. The starting zone is wired
    /// up by the scheduler, not here.
    #[must_use]
    pub fn from_spec(id: ComponentId, spec: &ComponentSpec) -> Self {
        let mut component = Self::new(id);
        for tag in &spec.tags {
            component.tags.add(tag.clone());
        }
        for (name, value) in &spec.fields {
            component.fields.insert(name.clone(), value.clone());
        }
        component
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Set a field, creating it if absent.
    pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Set a field from script text, coercing numeric text to a number.
    pub fn set_field_text(&mut self, name: impl Into<String>, text: &str) {
        self.fields.insert(name.into(), FieldValue::parse(text));
    }

    /// Check a tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.has(tag)
    }

    /// Iterate fields in arbitrary order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
