//! In-memory configuration store.

use std::collections::BTreeMap;
use std::collections::btree_map;

use super::{ConfigStore, StoreError, StoreValue};

/// A `ConfigStore` backed by an ordered map. Never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    values: BTreeMap<String, StoreValue>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether `key` holds a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<StoreValue> {
        self.values.remove(key)
    }

    /// Inserts a value directly, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<StoreValue>,
    ) -> Option<StoreValue> {
        self.values.insert(key.into(), value.into())
    }

    /// Iterates stored entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, StoreValue> {
        self.values.iter()
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoreValue>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: StoreValue) -> Result<(), StoreError> {
        let _ = self.values.insert(key.to_owned(), value);
        Ok(())
    }
}

impl<K: Into<String>, V: Into<StoreValue>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MemoryStore {
    type Item = (&'a String, &'a StoreValue);
    type IntoIter = btree_map::Iter<'a, String, StoreValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
