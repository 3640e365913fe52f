//! `ChainSet`: keys-only adapter over [`ChainMap`].

use crate::config::MapConfig;
use crate::error::MapError;
use crate::iter::Keys;
use crate::map::ChainMap;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Set backed by a [`ChainMap`] with unit values. Shares the map's
/// ordering modes and tree bins.
pub struct ChainSet<T, S = DefaultHashBuilder> {
    map: ChainMap<T, (), S>,
}

impl<T> ChainSet<T> {
    pub fn new() -> Self {
        Self { map: ChainMap::new() }
    }

    pub fn with_config(config: MapConfig) -> Result<Self, MapError> {
        Ok(Self {
            map: ChainMap::with_config(config)?,
        })
    }
}

impl<T, S> ChainSet<T, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            map: ChainMap::with_hasher(hasher),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Elements in set order: bucket order, or insertion order when the set
    /// was configured with one.
    pub fn iter(&self) -> Keys<'_, T, ()> {
        self.map.keys()
    }
}

impl<T, S> ChainSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    /// Add `value`; returns `false` if it was already present (the stored
    /// element is kept).
    pub fn insert(&mut self, value: T) -> bool {
        self.map.put_if_absent(value, ()).is_none()
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(value)
    }

    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.remove(value).is_some()
    }
}

impl<T, S: Default> Default for ChainSet<T, S> {
    fn default() -> Self {
        Self {
            map: ChainMap::default(),
        }
    }
}

impl<T: Clone, S: Clone> Clone for ChainSet<T, S> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<T: fmt::Debug, S> fmt::Debug for ChainSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> PartialEq for ChainSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<T: Eq + Hash, S: BuildHasher> Eq for ChainSet<T, S> {}

impl<T, S> Extend<T> for ChainSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.map.reserve(iter.size_hint().0);
        for v in iter {
            self.insert(v);
        }
    }
}

impl<T, S> FromIterator<T> for ChainSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<'a, T, S> IntoIterator for &'a ChainSet<T, S> {
    type Item = &'a T;
    type IntoIter = Keys<'a, T, ()>;

    fn into_iter(self) -> Keys<'a, T, ()> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OrderMode;

    #[test]
    fn insert_is_idempotent() {
        let mut s: ChainSet<String> = ChainSet::new();
        assert!(s.insert("a".to_string()));
        assert!(!s.insert("a".to_string()));
        assert_eq!(s.len(), 1);
        assert!(s.contains("a"));
        assert!(s.remove("a"));
        assert!(!s.remove("a"));
        assert!(s.is_empty());
    }

    #[test]
    fn insertion_ordered_set() {
        let mut s: ChainSet<u32> =
            ChainSet::with_config(MapConfig::default().with_order(OrderMode::Insertion)).unwrap();
        s.extend([30, 10, 20, 10]);
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), [30, 10, 20]);
        assert_eq!(format!("{s:?}"), "{30, 10, 20}");
    }

    #[test]
    fn collect_and_compare() {
        let a: ChainSet<u8> = (0..10).collect();
        let b: ChainSet<u8> = (0..10).rev().collect();
        assert_eq!(a, b);
        let c = a.clone();
        assert_eq!(c.len(), 10);
    }
}
