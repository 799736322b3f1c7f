//! Match variables.
//!
//! A flat name-to-text map shared by every script in a match. The scheduler
//! seeds it with the reserved built-ins below and keeps them current as the
//! match progresses ("what just happened" context for rule conditions and
//! command operands); `SetVariable` extends it with game-defined names.
//!
//! Variable names are unique. Game-level names are validated against the
//! reserved list at match start - a collision is the engine's one fatal
//! setup error.

use rustc_hash::FxHashMap;

use super::error::SetupError;

/// Reserved built-in variable names, maintained by the engine.
pub mod reserved {
    /// Match number passed to `MatchScheduler::start`.
    pub const MATCH_NUMBER: &str = "matchNumber";
    /// Current turn, starting at 1.
    pub const TURN_NUMBER: &str = "turnNumber";
    /// Name of the phase currently running.
    pub const PHASE: &str = "phase";
    /// Component most recently used.
    pub const USED_COMPONENT: &str = "usedComponent";
    /// Zone most recently used.
    pub const USED_ZONE: &str = "usedZone";
    /// Component most recently moved between zones.
    pub const MOVED_COMPONENT: &str = "movedComponent";
    /// Zone that component entered.
    pub const ENTERED_ZONE: &str = "enteredZone";
    /// Zone that component left.
    pub const LEFT_ZONE: &str = "leftZone";
    /// Last message sent.
    pub const MESSAGE: &str = "message";
    /// Last action used.
    pub const ACTION_NAME: &str = "actionName";
    /// Name of the variable last changed by `SetVariable`.
    pub const VARIABLE: &str = "variable";
    /// Value that variable was changed to.
    pub const NEW_VALUE: &str = "newValue";
    /// Rule whose activation is being announced.
    pub const ACTIVATED_RULE: &str = "activatedRule";
    /// Owning component while a component-level rule runs.
    pub const THIS: &str = "this";

    /// Every reserved name, for collision checks.
    pub const ALL: &[&str] = &[
        MATCH_NUMBER,
        TURN_NUMBER,
        PHASE,
        USED_COMPONENT,
        USED_ZONE,
        MOVED_COMPONENT,
        ENTERED_ZONE,
        LEFT_ZONE,
        MESSAGE,
        ACTION_NAME,
        VARIABLE,
        NEW_VALUE,
        ACTIVATED_RULE,
        THIS,
    ];
}

/// The match-wide variable store.
#[derive(Clone, Debug, Default)]
pub struct VariableStore {
    values: FxHashMap<String, String>,
}

impl VariableStore {
    /// Create a store with every reserved built-in seeded to `""`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut store = Self::default();
        for name in reserved::ALL {
            store.values.insert((*name).to_string(), String::new());
        }
        store
    }

    /// Check whether a name is reserved for the engine.
    #[must_use]
    pub fn is_reserved(name: &str) -> bool {
        reserved::ALL.contains(&name)
    }

    /// Define a game-level variable at setup time.
    ///
    /// Fails on reserved-name collision - the one fatal setup case.
    pub fn define(&mut self, name: &str, value: impl Into<String>) -> Result<(), SetupError> {
        if Self::is_reserved(name) {
            return Err(SetupError::ReservedVariable(name.to_string()));
        }
        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Set a variable, creating it if absent. Returns `true` if the stored
    /// value actually changed.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        match self.values.get(name) {
            Some(current) if *current == value => false,
            _ => {
                self.values.insert(name.to_string(), value);
                true
            }
        }
    }

    /// Current value of a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Does the variable exist?
    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of variables (built-ins included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate name/value pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
