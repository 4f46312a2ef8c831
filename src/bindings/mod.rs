//! The fixed capability set a session exposes to scripts.

use tracing::warn;

use crate::script::{GlobalResolver, Value};

/// Immutable, insertion-ordered name to capability mapping.
///
/// Built once per session via [`BindingsBuilder`] and never mutated after;
/// names are unique.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: Vec<(String, Value)>,
}

impl Bindings {
    pub fn builder() -> BindingsBuilder {
        BindingsBuilder {
            entries: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Capability names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GlobalResolver for Bindings {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Accumulates capability bindings before a session starts.
pub struct BindingsBuilder {
    entries: Vec<(String, Value)>,
}

impl BindingsBuilder {
    /// Register `value` under `name`.
    ///
    /// Rebinding an existing name replaces the earlier value in place, so
    /// the registry stays name-unique and keeps first-registration order.
    /// A collision is a wiring mistake and is logged.
    pub fn bind(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            warn!(name = %name, "duplicate capability binding replaced");
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
        self
    }

    pub fn build(self) -> Bindings {
        Bindings {
            entries: self.entries,
        }
    }
}
