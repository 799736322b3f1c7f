//! Zones - ordered, positional containers of components.
//!
//! Zone order is authoritative for position queries: index 0 is the bottom,
//! the last index is the top. Grid zones additionally assign each occupant
//! a (column, row) slot; the linear order is still maintained underneath so
//! position queries and truncation keep working.
//!
//! A zone only manages its own occupant list. The component's `zone`
//! back-reference is kept consistent by `MatchState`, which wraps push/pop
//! into placement operations.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::entity::{ComponentId, ZoneId};
use crate::core::rng::MatchRng;
use crate::core::setup::ZoneSpec;
use crate::core::tags::TagSet;

/// How a zone arranges its occupants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneLayout {
    /// A single ordered stack/row.
    Linear,
    /// Grid-addressed slots, filled row-major when no slot is requested.
    Grid {
        /// Number of columns.
        columns: u32,
        /// Number of rows.
        rows: u32,
    },
}

impl Default for ZoneLayout {
    fn default() -> Self {
        ZoneLayout::Linear
    }
}

/// Where to insert a component into a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// Append at the top (last index).
    Top,
    /// Insert at the bottom (index 0).
    Bottom,
    /// Request a grid slot. Falls back to the first free slot when taken,
    /// ignored entirely for linear zones.
    Slot {
        /// Requested column.
        column: u32,
        /// Requested row.
        row: u32,
    },
}

/// An ordered container of components.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Zone {
    /// Unique id, assigned sequentially at match start.
    pub id: ZoneId,

    /// Tag set ("Play", "Hand", "DiscardPile", ...).
    pub tags: TagSet,

    /// Layout mode.
    pub layout: ZoneLayout,

    /// Occupants, bottom to top.
    order: Vec<ComponentId>,

    /// Grid slot per occupant. Empty for linear zones.
    slots: FxHashMap<ComponentId, (u32, u32)>,
}

impl Zone {
    /// Create an empty linear zone.
    #[must_use]
    pub fn new(id: ZoneId) -> Self {
        Self {
            id,
            tags: TagSet::new(),
            layout: ZoneLayout::Linear,
            order: Vec::new(),
            slots: FxHashMap::default(),
        }
    }

    /// Build a zone from a provider spec.
    #[must_use]
    pub fn from_spec(id: ZoneId, spec: &ZoneSpec) -> Self {
        let mut zone = Self::new(id);
        for tag in &spec.tags {
            zone.tags.add(tag.clone());
        }
        zone.layout = spec.layout;
        zone
    }

    /// Insert a component.
    ///
    /// Linear zones honor `Top`/`Bottom` (a `Slot` request degrades to
    /// `Top`). Grid zones take the requested slot when free, otherwise the
    /// first free slot row-major; a full grid still records the occupant in
    /// the linear order so it remains queryable.
    pub fn push(&mut self, component: ComponentId, placement: Placement) {
        if self.order.contains(&component) {
            return;
        }

        match placement {
            Placement::Bottom => self.order.insert(0, component),
            Placement::Top | Placement::Slot { .. } => self.order.push(component),
        }

        if let ZoneLayout::Grid { columns, rows } = self.layout {
            let requested = match placement {
                Placement::Slot { column, row } if column < columns && row < rows => {
                    Some((column, row))
                }
                _ => None,
            };
            let slot = requested
                .filter(|slot| !self.slot_taken(*slot))
                .or_else(|| self.first_free_slot());
            if let Some(slot) = slot {
                self.slots.insert(component, slot);
            }
        }
    }

    /// Remove a component. Frees its grid slot and keeps the remaining
    /// occupants' recorded order consistent. Returns `false` if absent.
    pub fn pop(&mut self, component: ComponentId) -> bool {
        let before = self.order.len();
        self.order.retain(|&c| c != component);
        self.slots.remove(&component);
        self.order.len() != before
    }

    /// Randomly reorder occupants in place.
    pub fn shuffle(&mut self, rng: &mut MatchRng) {
        rng.shuffle(&mut self.order);
    }

    /// Zone-relative position of a component, or `None` if absent.
    #[must_use]
    pub fn index_of(&self, component: ComponentId) -> Option<usize> {
        self.order.iter().position(|&c| c == component)
    }

    /// Grid slot of a component, if the zone is a grid and the slot fit.
    #[must_use]
    pub fn slot_of(&self, component: ComponentId) -> Option<(u32, u32)> {
        self.slots.get(&component).copied()
    }

    /// Occupants, bottom to top.
    #[must_use]
    pub fn components(&self) -> &[ComponentId] {
        &self.order
    }

    /// Topmost occupant (last index).
    #[must_use]
    pub fn top(&self) -> Option<ComponentId> {
        self.order.last().copied()
    }

    /// Bottommost occupant (index 0).
    #[must_use]
    pub fn bottom(&self) -> Option<ComponentId> {
        self.order.first().copied()
    }

    /// Number of occupants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the zone is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Check membership.
    #[must_use]
    pub fn contains(&self, component: ComponentId) -> bool {
        self.order.contains(&component)
    }

    fn slot_taken(&self, slot: (u32, u32)) -> bool {
        self.slots.values().any(|&s| s == slot)
    }

    fn first_free_slot(&self) -> Option<(u32, u32)> {
        let ZoneLayout::Grid { columns, rows } = self.layout else {
            return None;
        };
        for row in 0..rows {
            for column in 0..columns {
                if !self.slot_taken((column, row)) {
                    return Some((column, row));
                }
            }
        }
        None
    }
}
