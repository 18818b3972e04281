//! Insertion-ordered string map with optional case-insensitive keys.
//!
//! Headers and request-scoped variables are looked up case-insensitively but
//! must keep the order (and spelling) they were written in, which neither
//! `HashMap` nor `BTreeMap` provide. File-scoped variables use the same type
//! in case-sensitive mode.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// An ordered `String -> String` map backed by a vector of pairs and a
/// normalized-key index.
///
/// Writing an existing key (after case folding, when enabled) replaces the
/// value in place; the entry keeps its original position and spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
    fold_case: bool,
}

impl OrderedMap {
    /// Creates an empty map whose keys compare case-insensitively.
    pub fn case_insensitive() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            fold_case: true,
        }
    }

    /// Creates an empty map whose keys compare exactly.
    pub fn case_sensitive() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            fold_case: false,
        }
    }

    /// Returns `true` if keys are compared case-insensitively.
    pub fn is_case_insensitive(&self) -> bool {
        self.fold_case
    }

    fn normalize(&self, key: &str) -> String {
        if self.fold_case {
            key.to_lowercase()
        } else {
            key.to_string()
        }
    }

    /// Inserts or overwrites a value, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        let normalized = self.normalize(&key);

        match self.index.get(&normalized) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position].1, value)),
            None => {
                self.index.insert(normalized, self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(&self.normalize(key))
            .map(|&position| self.entries[position].1.as_str())
    }

    /// Looks up a value by key for in-place modification.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut String> {
        let position = *self.index.get(&self.normalize(key))?;
        Some(&mut self.entries[position].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(&self.normalize(key))
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let position = self.index.remove(&self.normalize(key))?;
        let (_, value) = self.entries.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keys in insertion order, spelled as first inserted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Default for OrderedMap {
    fn default() -> Self {
        Self::case_sensitive()
    }
}

impl Serialize for OrderedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
