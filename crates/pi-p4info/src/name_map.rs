//! String-keyed map for name to id resolution.
//!
//! `NameMap` never creates or overwrites entries implicitly:
//! - `get()` returns `Option<V>` and leaves the map untouched
//! - `insert()` refuses a name that is already present
//!
//! Names are unique within one map, so each registry keeps one map per
//! naming scope (all fields, all actions, the params of one action, ...).

use std::collections::{HashMap, TryReserveError};

use thiserror::Error;

/// Returned when inserting a name that is already present.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("name '{0}' already present")]
pub struct DuplicateName(pub String);

/// Map from resource names to ids (or positional indices).
///
/// # Example
///
/// ```
/// use pi_p4info::NameMap;
///
/// let mut names: NameMap<u32> = NameMap::new();
/// assert!(names.get("ingress.fwd").is_none());
///
/// names.insert("ingress.fwd", 7).unwrap();
/// assert_eq!(names.get("ingress.fwd"), Some(7));
/// assert!(names.insert("ingress.fwd", 8).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct NameMap<V> {
    inner: HashMap<String, V>,
}

impl<V: Copy> NameMap<V> {
    /// Creates a new empty map.
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// Creates a new map with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: HashMap::with_capacity(capacity),
        }
    }

    /// Reserves room for at least `additional` more names.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.inner.try_reserve(additional)
    }

    /// Returns the number of names in the map.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns true if the map contains `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Returns the value registered for `name`.
    pub fn get(&self, name: &str) -> Option<V> {
        self.inner.get(name).copied()
    }

    /// Registers `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateName`] and keeps the existing value if `name`
    /// is already present.
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> Result<(), DuplicateName> {
        use std::collections::hash_map::Entry;

        match self.inner.entry(name.into()) {
            Entry::Occupied(occupied) => Err(DuplicateName(occupied.key().clone())),
            Entry::Vacant(vacant) => {
                vacant.insert(value);
                Ok(())
            }
        }
    }

    /// Returns an iterator over `(name, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, V)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Removes every name.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<V: Copy> Default for NameMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_basic_operations() {
        let mut map: NameMap<usize> = NameMap::new();

        assert!(map.is_empty());
        assert!(map.get("f0").is_none());

        map.insert("f0", 0).unwrap();
        map.insert(String::from("f1"), 1).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("f0"), Some(0));
        assert_eq!(map.get("f1"), Some(1));
        assert!(map.contains("f1"));
    }

    #[test]
    fn test_get_never_creates() {
        let map: NameMap<usize> = NameMap::new();
        assert!(map.get("missing").is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn test_duplicate_keeps_original() {
        let mut map: NameMap<usize> = NameMap::with_capacity(4);
        map.insert("a0", 3).unwrap();

        let err = map.insert("a0", 4).unwrap_err();
        assert_eq!(err, DuplicateName("a0".to_string()));
        assert_eq!(map.get("a0"), Some(3));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut map: NameMap<usize> = NameMap::new();
        map.insert("Ingress.t", 0).unwrap();
        map.insert("ingress.t", 1).unwrap();
        assert_eq!(map.get("Ingress.t"), Some(0));
        assert_eq!(map.get("ingress.t"), Some(1));
    }

    #[test]
    fn test_try_reserve_overflow() {
        let mut map: NameMap<usize> = NameMap::new();
        assert!(map.try_reserve(usize::MAX).is_err());
        assert!(map.try_reserve(16).is_ok());
    }

    #[test]
    fn test_clear() {
        let mut map: NameMap<usize> = NameMap::new();
        map.insert("t0", 0).unwrap();
        map.clear();
        assert!(map.is_empty());
        map.insert("t0", 1).unwrap();
        assert_eq!(map.get("t0"), Some(1));
    }
}
