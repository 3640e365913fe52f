//! Traversal: borrowing iterators and the fail-fast [`Cursor`].
//!
//! Maps without an order list are walked bucket by bucket, each chain in
//! link order. Ordered maps are walked along the order list from eldest to
//! newest. Borrowing iterators hold the map borrow, so the compiler rules
//! out structural changes while they are alive. The [`Cursor`] does not
//! borrow the map between steps and instead detects foreign changes through
//! the shared modification counter.

use crate::error::MapError;
use crate::map::ChainMap;
use crate::node::{CellKey, Node};
use crate::table::{ModCount, RawTable};
use core::iter::FusedIterator;
use core::marker::PhantomData;
use slotmap::SecondaryMap;

/// Position of a traversal. The successor of a yielded cell is read before
/// the cell is handed out, so the caller may remove it (without moving a
/// tree root) and keep walking.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Walk {
    Buckets { index: usize, next: Option<CellKey> },
    Order { next: Option<CellKey> },
}

impl Walk {
    pub(crate) fn start<K, V>(raw: &RawTable<K, V>) -> Self {
        if raw.order.is_enabled() {
            Walk::Order {
                next: raw.order.head,
            }
        } else {
            Walk::Buckets {
                index: 0,
                next: None,
            }
        }
    }

    pub(crate) fn step<K, V>(&mut self, raw: &RawTable<K, V>) -> Option<CellKey> {
        match self {
            Walk::Order { next } => {
                let k = (*next)?;
                *next = raw.cells[k].after;
                Some(k)
            }
            Walk::Buckets { index, next } => loop {
                if let Some(k) = *next {
                    *next = raw.cells[k].next;
                    return Some(k);
                }
                *next = *raw.buckets.get(*index)?;
                *index += 1;
            },
        }
    }
}

/// Iterator over `(&K, &V)` in map order.
pub struct Iter<'a, K, V> {
    raw: &'a RawTable<K, V>,
    walk: Walk,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(raw: &'a RawTable<K, V>) -> Self {
        Self {
            raw,
            walk: Walk::start(raw),
            remaining: raw.len(),
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw,
            walk: self.walk,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.raw;
        let k = self.walk.step(raw)?;
        self.remaining -= 1;
        let node = &raw.cells[k];
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over keys in map order.
pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterator over values in map order.
pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in map order.
///
/// The arena hands out disjoint mutable borrows only in slot order, so the
/// traversal order is computed first and the borrows are then placed into
/// that order.
pub struct IterMut<'a, K, V> {
    inner: core::iter::Flatten<std::vec::IntoIter<Option<(&'a K, &'a mut V)>>>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(raw: &'a mut RawTable<K, V>) -> Self {
        let mut positions: SecondaryMap<CellKey, usize> = SecondaryMap::with_capacity(raw.len());
        let mut walk = Walk::start(raw);
        let mut n = 0;
        while let Some(k) = walk.step(raw) {
            positions.insert(k, n);
            n += 1;
        }
        let mut slots: Vec<Option<(&'a K, &'a mut V)>> = (0..n).map(|_| None).collect();
        for (k, node) in raw.cells.iter_mut() {
            let Node { key, value, .. } = node;
            if let Some(&pos) = positions.get(k) {
                slots[pos] = Some((&*key, value));
            }
        }
        Self {
            inner: slots.into_iter().flatten(),
            remaining: n,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Iterator over mutable values in map order.
pub struct ValuesMut<'a, K, V> {
    pub(crate) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// Owning iterator over `(K, V)` in map order.
pub struct IntoIter<K, V> {
    raw: RawTable<K, V>,
    walk: Walk,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(raw: RawTable<K, V>) -> Self {
        let walk = Walk::start(&raw);
        Self { raw, walk }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        // The walk has already read the successor and every bucket head it
        // has yet to visit is untouched, so freeing the cell is enough.
        let k = self.walk.step(&self.raw)?;
        let node = self.raw.cells.remove(k)?;
        Some((node.key, node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.raw.len();
        (n, Some(n))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// Draining iterator. The map is already empty (capacity kept) when this is
/// returned; entries not consumed are dropped with the iterator.
pub struct Drain<'a, K, V> {
    pub(crate) inner: IntoIter<K, V>,
    pub(crate) _map: PhantomData<&'a mut ()>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}
impl<K, V> FusedIterator for Drain<'_, K, V> {}

/// Fail-fast traversal that does not hold the map borrow.
///
/// A cursor remembers the map's modification count. Any structural change
/// made other than through [`Cursor::remove`], including reads that reorder
/// an access-ordered map, makes the next step fail with
/// [`MapError::ConcurrentModification`].
///
/// ```
/// use chain_map::{ChainMap, MapError};
///
/// let mut map: ChainMap<u32, &str> = ChainMap::new();
/// map.insert(1, "one");
/// map.insert(2, "two");
///
/// let mut cur = map.cursor();
/// while let Some((k, _)) = cur.next(&map)? {
///     if *k == 1 {
///         cur.remove(&mut map)?;
///     }
/// }
/// assert_eq!(map.len(), 1);
/// # Ok::<(), MapError>(())
/// ```
#[derive(Debug)]
pub struct Cursor {
    mods: ModCount,
    expected: u64,
    walk: Walk,
    current: Option<CellKey>,
}

impl Cursor {
    pub(crate) fn new<K, V>(raw: &RawTable<K, V>) -> Self {
        Self {
            mods: raw.mods.share(),
            expected: raw.mods.get(),
            walk: Walk::start(raw),
            current: None,
        }
    }

    fn sync_check<K, V>(&self, raw: &RawTable<K, V>) -> Result<(), MapError> {
        if !self.mods.same_counter(&raw.mods) {
            return Err(MapError::ForeignCursor);
        }
        let found = raw.mods.get();
        if found != self.expected {
            return Err(MapError::ConcurrentModification {
                expected: self.expected,
                found,
            });
        }
        Ok(())
    }

    /// Advance to the next entry. `Ok(None)` once the traversal is done.
    pub fn next<'m, K, V, S, E>(
        &mut self,
        map: &'m ChainMap<K, V, S, E>,
    ) -> Result<Option<(&'m K, &'m V)>, MapError> {
        let raw = &map.raw;
        self.sync_check(raw)?;
        self.current = self.walk.step(raw);
        Ok(self.current.map(|k| {
            let node = &raw.cells[k];
            (&node.key, &node.value)
        }))
    }

    /// Remove the entry last returned by [`next`](Self::next). The cursor
    /// stays valid and continues with the following entry.
    pub fn remove<K, V, S, E>(&mut self, map: &mut ChainMap<K, V, S, E>) -> Result<(K, V), MapError> {
        self.sync_check(&map.raw)?;
        let k = self.current.take().ok_or(MapError::NoCurrentEntry)?;
        let _g = map.reentrancy.enter("Cursor::remove");
        let entry = map
            .raw
            .remove_cell(k, false)
            .ok_or(MapError::NoCurrentEntry)?;
        self.expected = map.raw.mods.get();
        Ok(entry)
    }

    /// Mutable access to the value of the current entry. Not a structural
    /// change.
    pub fn value_mut<'m, K, V, S, E>(
        &self,
        map: &'m mut ChainMap<K, V, S, E>,
    ) -> Result<&'m mut V, MapError> {
        self.sync_check(&map.raw)?;
        let k = self.current.ok_or(MapError::NoCurrentEntry)?;
        map.raw
            .cells
            .get_mut(k)
            .map(|node| &mut node.value)
            .ok_or(MapError::NoCurrentEntry)
    }
}

#[cfg(test)]
mod tests {
    use crate::{ChainMap, MapConfig, MapError, OrderMode};

    #[test]
    fn bucket_walk_visits_every_entry_once() {
        let mut m: ChainMap<u32, u32> = ChainMap::new();
        for i in 0..100 {
            m.insert(i, i * 2);
        }
        let mut keys: Vec<u32> = m.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..100).collect::<Vec<_>>());
        assert_eq!(m.iter().len(), 100);
    }

    #[test]
    fn iter_mut_follows_insertion_order() {
        let config = MapConfig::default().with_order(OrderMode::Insertion);
        let mut m: ChainMap<&str, i32> = ChainMap::with_config(config).unwrap();
        for (i, k) in ["x", "a", "m"].into_iter().enumerate() {
            m.insert(k, i as i32);
        }
        let seen: Vec<&str> = m
            .iter_mut()
            .map(|(k, v)| {
                *v += 10;
                *k
            })
            .collect();
        assert_eq!(seen, ["x", "a", "m"]);
        assert_eq!(m.values().copied().collect::<Vec<_>>(), [10, 11, 12]);
    }

    #[test]
    fn into_iter_yields_owned_pairs_in_order() {
        let config = MapConfig::default().with_order(OrderMode::Insertion);
        let mut m: ChainMap<String, u8> = ChainMap::with_config(config).unwrap();
        m.insert("b".to_string(), 2);
        m.insert("a".to_string(), 1);
        let pairs: Vec<(String, u8)> = m.into_iter().collect();
        assert_eq!(pairs, [("b".to_string(), 2), ("a".to_string(), 1)]);
    }

    #[test]
    fn drain_empties_but_keeps_capacity() {
        let mut m: ChainMap<u32, u32> = ChainMap::new();
        m.extend((0..50).map(|i| (i, i)));
        let cap = m.capacity();
        let drained = m.drain().count();
        assert_eq!(drained, 50);
        assert!(m.is_empty());
        assert_eq!(m.capacity(), cap);
        m.check_invariants().unwrap();
    }

    #[test]
    fn cursor_rejects_other_map() {
        let mut a: ChainMap<u8, u8> = ChainMap::new();
        let b: ChainMap<u8, u8> = ChainMap::new();
        a.insert(1, 1);
        let mut cur = a.cursor();
        assert_eq!(cur.next(&b), Err(MapError::ForeignCursor));
        assert_eq!(cur.next(&a).unwrap(), Some((&1, &1)));
    }

    #[test]
    fn cursor_value_mut_is_not_structural() {
        let mut m: ChainMap<u8, u8> = ChainMap::new();
        m.insert(1, 1);
        m.insert(2, 2);
        let mut cur = m.cursor();
        assert_eq!(cur.value_mut(&mut m), Err(MapError::NoCurrentEntry));
        while cur.next(&m).unwrap().is_some() {
            *cur.value_mut(&mut m).unwrap() += 1;
        }
        assert_eq!(m.peek(&1), Some(&2));
        assert_eq!(m.peek(&2), Some(&3));
    }
}
