//! String-keyed map type for LLSD maps.
//!
//! [`LlsdMap`] wraps an [`IndexMap`] so that formatters emit keys in a
//! deterministic order (insertion order), while equality stays order-insensitive:
//! two maps holding the same key/value pairs compare equal however they were built.
//!
//! ## Examples
//!
//! ```rust
//! use serde_llsd::{LlsdMap, LlsdValue};
//!
//! let mut a = LlsdMap::new();
//! a.insert("amy".to_string(), LlsdValue::from(23));
//! a.insert("bob".to_string(), LlsdValue::Undefined);
//!
//! let mut b = LlsdMap::new();
//! b.insert("bob".to_string(), LlsdValue::Undefined);
//! b.insert("amy".to_string(), LlsdValue::from(23));
//!
//! assert_eq!(a, b);
//! assert_eq!(a.get("amy").and_then(|v| v.as_integer()), Some(23));
//! ```

use crate::LlsdValue;
use indexmap::IndexMap;
use std::collections::HashMap;

/// A map of unique string keys to LLSD values, iterated in insertion order.
///
/// Re-inserting an existing key replaces its value and keeps its position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LlsdMap(IndexMap<String, LlsdValue>);

impl LlsdMap {
    /// Creates an empty `LlsdMap`.
    #[must_use]
    pub fn new() -> Self {
        LlsdMap(IndexMap::new())
    }

    /// Creates an empty `LlsdMap` with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        LlsdMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair, returning the value previously stored under the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_llsd::{LlsdMap, LlsdValue};
    ///
    /// let mut map = LlsdMap::new();
    /// assert!(map.insert("key".to_string(), LlsdValue::from(42)).is_none());
    /// assert_eq!(map.insert("key".to_string(), LlsdValue::from(43)), Some(LlsdValue::from(42)));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: String, value: LlsdValue) -> Option<LlsdValue> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LlsdValue> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut LlsdValue> {
        self.0.get_mut(key)
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<LlsdValue> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, LlsdValue> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, LlsdValue> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, LlsdValue> {
        self.0.iter()
    }

    /// Sorts the entries by key, so that formatting no longer depends on how
    /// the map was built.
    pub fn sort_keys(&mut self) {
        self.0.sort_keys();
    }
}

impl From<HashMap<String, LlsdValue>> for LlsdMap {
    fn from(map: HashMap<String, LlsdValue>) -> Self {
        LlsdMap(map.into_iter().collect())
    }
}

impl From<LlsdMap> for HashMap<String, LlsdValue> {
    fn from(map: LlsdMap) -> Self {
        map.0.into_iter().collect()
    }
}

impl IntoIterator for LlsdMap {
    type Item = (String, LlsdValue);
    type IntoIter = indexmap::map::IntoIter<String, LlsdValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a LlsdMap {
    type Item = (&'a String, &'a LlsdValue);
    type IntoIter = indexmap::map::Iter<'a, String, LlsdValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, LlsdValue)> for LlsdMap {
    fn from_iter<T: IntoIterator<Item = (String, LlsdValue)>>(iter: T) -> Self {
        LlsdMap(IndexMap::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_kept() {
        let map: LlsdMap = vec![
            ("cam".to_string(), LlsdValue::from(1.23)),
            ("amy".to_string(), LlsdValue::from(23)),
        ]
        .into_iter()
        .collect();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["cam", "amy"]);
    }

    #[test]
    fn test_sort_keys() {
        let mut map = LlsdMap::new();
        map.insert("zed".to_string(), LlsdValue::Undefined);
        map.insert("amy".to_string(), LlsdValue::Undefined);
        map.sort_keys();
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["amy", "zed"]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut map = LlsdMap::new();
        for key in ["a", "b", "c"] {
            map.insert(key.to_string(), LlsdValue::from(true));
        }
        assert!(map.remove("b").is_some());
        assert!(!map.contains_key("b"));
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_hashmap_conversion() {
        let mut hash = HashMap::new();
        hash.insert("k".to_string(), LlsdValue::from("v"));
        let map = LlsdMap::from(hash.clone());
        assert_eq!(HashMap::from(map), hash);
    }
}
