//! Locally cached properties of one remote entity.

use crate::error::{ClientError, Result};
use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};
use tracing::trace;

/// Protocol annotations that ride along with entity payloads but are not properties.
fn is_metadata_key(name: &str) -> bool {
    name == "__metadata" || name.starts_with("odata.") || name.contains("@odata.")
}

/// Navigation properties the server did not expand arrive as `{"__deferred": {...}}`.
fn is_deferred_stub(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| obj.len() == 1 && obj.contains_key("__deferred"))
        .unwrap_or(false)
}

/// Name → value map plus the names whose changes still have to be persisted.
///
/// A name is available exactly when it has an entry; JSON `null` is a defined
/// value, while `get` returning `None` means the property was never loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    values: IndexMap<String, Value>,
    changed: IndexSet<String>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Like `get`, but an unloaded property is an error rather than `None`.
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| ClientError::not_loaded(name))
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value, persist_changes: bool) {
        let name = name.into();
        if persist_changes {
            self.changed.insert(name.clone());
        }
        self.values.insert(name, value);
    }

    /// Merges a server payload object. Returns the names that were stored.
    ///
    /// Merged values are not marked for persistence.
    pub fn merge(&mut self, payload: &Map<String, Value>) -> Vec<String> {
        let mut stored = Vec::with_capacity(payload.len());
        for (name, value) in payload {
            if is_metadata_key(name) || is_deferred_stub(value) {
                trace!("Skipping '{}' while merging payload", name);
                continue;
            }
            self.values.insert(name.clone(), value.clone());
            stored.push(name.clone());
        }
        trace!("Merged {} of {} payload properties", stored.len(), payload.len());
        stored
    }

    /// Records an available property for persistence again. Unknown names are ignored.
    pub fn mark_changed(&mut self, name: &str) {
        if self.values.contains_key(name) {
            self.changed.insert(name.to_string());
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    pub fn changed_names(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    /// Snapshot of the pending changes, each with its latest value.
    pub fn changes(&self) -> Map<String, Value> {
        self.changed
            .iter()
            .filter_map(|name| {
                self.values
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }

    /// Removes and returns the pending changes.
    pub fn take_changes(&mut self) -> Map<String, Value> {
        let changes = self.changes();
        self.changed.clear();
        changes
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}
