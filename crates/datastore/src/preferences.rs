//! Snapshot of a store's key set

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::key::Key;
use crate::value::{PreferenceValue, StorableValue};

/// An owned snapshot of every key/value pair in a store
///
/// Snapshots are plain values. Mutating one does nothing to the store until
/// it is returned from a transform passed to
/// [`DataStore::update_data`](crate::DataStore::update_data).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preferences {
    entries: BTreeMap<String, PreferenceValue>,
}

impl Preferences {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a snapshot from raw entries
    pub fn from_map(entries: BTreeMap<String, PreferenceValue>) -> Self {
        Self { entries }
    }

    /// Get the typed value stored under `key`
    ///
    /// Returns `None` when the slot is empty or holds a value of another kind.
    pub fn get<R: StorableValue>(&self, key: &Key<R>) -> Option<R> {
        let value = self.entries.get(key.name())?;
        let typed = R::from_value(value);
        if typed.is_none() {
            tracing::warn!(
                "Preference {} holds a {} value, expected {}",
                key.name(),
                value.kind(),
                R::KIND
            );
        }
        typed
    }

    /// Check whether any value is stored under the key's name
    pub fn contains<R: StorableValue>(&self, key: &Key<R>) -> bool {
        self.entries.contains_key(key.name())
    }

    /// Store a value, returning the previous raw value if any
    pub fn set<R: StorableValue>(&mut self, key: &Key<R>, value: R) -> Option<PreferenceValue> {
        self.entries.insert(key.name().to_string(), value.into_value())
    }

    /// Remove the slot, returning its typed value if it held one of the key's kind
    pub fn remove<R: StorableValue>(&mut self, key: &Key<R>) -> Option<R> {
        self.entries
            .remove(key.name())
            .and_then(|value| R::from_value(&value))
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over raw entries in key order
    pub fn iter(&self) -> btree_map::Iter<'_, String, PreferenceValue> {
        self.entries.iter()
    }

    /// Get the raw entries
    pub fn as_map(&self) -> &BTreeMap<String, PreferenceValue> {
        &self.entries
    }

    /// Consume the snapshot, returning its raw entries
    pub fn into_map(self) -> BTreeMap<String, PreferenceValue> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Preferences {
    type Item = (&'a String, &'a PreferenceValue);
    type IntoIter = btree_map::Iter<'a, String, PreferenceValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
