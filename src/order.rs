//! Global order list and the eviction hook.
//!
//! The list threads every live cell through `before`/`after`, independent
//! of bucket placement. Head is the eldest cell, tail the newest (or, in
//! access order, the most recently used). With [`OrderMode::Unordered`]
//! the list is not maintained and every operation here is a no-op.

use crate::node::{CellKey, Node};
use slotmap::SlotMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Secondary ordering over all entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderMode {
    /// No order list; iteration follows the bucket array.
    #[default]
    Unordered,
    /// Iteration follows first insertion; updates do not reorder.
    Insertion,
    /// Every successful read or update moves the entry to the back.
    Access,
}

/// Decides, after each insertion of a new entry, whether the eldest entry
/// should be dropped.
///
/// `len` counts the entry just inserted. Only consulted when the map keeps
/// an order list.
pub trait EvictionPolicy<K, V> {
    fn should_evict(&mut self, eldest_key: &K, eldest_value: &V, len: usize) -> bool;
}

/// Never evicts. The default policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeverEvict;

impl<K, V> EvictionPolicy<K, V> for NeverEvict {
    #[inline]
    fn should_evict(&mut self, _: &K, _: &V, _: usize) -> bool {
        false
    }
}

/// Evicts the eldest entry whenever the map holds more than `n` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxEntries(pub usize);

impl<K, V> EvictionPolicy<K, V> for MaxEntries {
    #[inline]
    fn should_evict(&mut self, _: &K, _: &V, len: usize) -> bool {
        len > self.0
    }
}

impl<K, V, F> EvictionPolicy<K, V> for F
where
    F: FnMut(&K, &V, usize) -> bool,
{
    #[inline]
    fn should_evict(&mut self, eldest_key: &K, eldest_value: &V, len: usize) -> bool {
        self(eldest_key, eldest_value, len)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct OrderList {
    pub(crate) head: Option<CellKey>,
    pub(crate) tail: Option<CellKey>,
    mode: OrderMode,
}

impl OrderList {
    pub(crate) fn new(mode: OrderMode) -> Self {
        Self {
            head: None,
            tail: None,
            mode,
        }
    }

    #[inline]
    pub(crate) fn mode(&self) -> OrderMode {
        self.mode
    }

    #[inline]
    pub(crate) fn is_enabled(&self) -> bool {
        self.mode != OrderMode::Unordered
    }

    pub(crate) fn link_last<K, V>(&mut self, cells: &mut SlotMap<CellKey, Node<K, V>>, k: CellKey) {
        if !self.is_enabled() {
            return;
        }
        let last = self.tail;
        {
            let node = &mut cells[k];
            node.before = last;
            node.after = None;
        }
        match last {
            None => self.head = Some(k),
            Some(l) => cells[l].after = Some(k),
        }
        self.tail = Some(k);
    }

    pub(crate) fn unlink<K, V>(&mut self, cells: &mut SlotMap<CellKey, Node<K, V>>, k: CellKey) {
        if !self.is_enabled() {
            return;
        }
        let (b, a) = {
            let node = &mut cells[k];
            (node.before.take(), node.after.take())
        };
        match b {
            None => self.head = a,
            Some(b) => cells[b].after = a,
        }
        match a {
            None => self.tail = b,
            Some(a) => cells[a].before = b,
        }
    }

    /// Move `k` to the tail in access order. Returns whether the list
    /// changed, which callers count as a modification.
    pub(crate) fn touch<K, V>(&mut self, cells: &mut SlotMap<CellKey, Node<K, V>>, k: CellKey) -> bool {
        if self.mode != OrderMode::Access || self.tail == Some(k) {
            return false;
        }
        self.unlink(cells, k);
        self.link_last(cells, k);
        true
    }

    pub(crate) fn clear(&mut self) {
        self.head = None;
        self.tail = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Links;

    fn keys_in_order(list: &OrderList, cells: &SlotMap<CellKey, Node<&'static str, ()>>) -> Vec<&'static str> {
        let mut out = Vec::new();
        let mut cur = list.head;
        while let Some(k) = cur {
            out.push(cells[k].key);
            cur = cells[k].after;
        }
        out
    }

    fn setup(mode: OrderMode) -> (OrderList, SlotMap<CellKey, Node<&'static str, ()>>, Vec<CellKey>) {
        let mut cells = SlotMap::with_key();
        let mut list = OrderList::new(mode);
        let mut ks = Vec::new();
        for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
            let k = cells.insert(Node::new(i as u32, name, (), Links::Plain));
            list.link_last(&mut cells, k);
            ks.push(k);
        }
        (list, cells, ks)
    }

    #[test]
    fn append_and_unlink_middle() {
        let (mut list, mut cells, ks) = setup(OrderMode::Insertion);
        assert_eq!(keys_in_order(&list, &cells), ["a", "b", "c"]);
        list.unlink(&mut cells, ks[1]);
        assert_eq!(keys_in_order(&list, &cells), ["a", "c"]);
        list.unlink(&mut cells, ks[0]);
        list.unlink(&mut cells, ks[2]);
        assert!(list.head.is_none() && list.tail.is_none());
    }

    #[test]
    fn touch_only_reorders_in_access_mode() {
        let (mut list, mut cells, ks) = setup(OrderMode::Insertion);
        assert!(!list.touch(&mut cells, ks[0]));
        assert_eq!(keys_in_order(&list, &cells), ["a", "b", "c"]);

        let (mut list, mut cells, ks) = setup(OrderMode::Access);
        assert!(list.touch(&mut cells, ks[0]));
        assert_eq!(keys_in_order(&list, &cells), ["b", "c", "a"]);
        // Already the tail: nothing moves.
        assert!(!list.touch(&mut cells, ks[0]));
    }

    #[test]
    fn unordered_keeps_no_links() {
        let (list, cells, ks) = setup(OrderMode::Unordered);
        assert!(list.head.is_none());
        assert!(cells[ks[1]].before.is_none());
    }

    #[test]
    fn shipped_policies() {
        assert!(!EvictionPolicy::<i32, i32>::should_evict(&mut NeverEvict, &1, &1, 1000));
        assert!(!EvictionPolicy::<i32, i32>::should_evict(&mut MaxEntries(2), &1, &1, 2));
        assert!(EvictionPolicy::<i32, i32>::should_evict(&mut MaxEntries(2), &1, &1, 3));
        let mut odd_keys = |k: &i32, _: &i32, _: usize| k % 2 == 1;
        assert!(EvictionPolicy::<i32, i32>::should_evict(&mut odd_keys, &3, &0, 1));
    }
}
