//! Bucket array, cell arena and the resize engine.
//!
//! `RawTable` owns every cell and the vector of bucket heads. Bucket `i`
//! holds the cells whose spread hash masks to `i`, either as a plain chain
//! or as a red-black tree (see `tree.rs`). Growth doubles the capacity and
//! splits each bucket `j` into `j` and `j + old_capacity` by testing the one
//! hash bit the new mask adds; both halves keep their relative order.

use crate::error::InvariantViolation;
use crate::hashing::{
    bucket_index, table_size_for, threshold_for, DEFAULT_INITIAL_CAPACITY, MAXIMUM_CAPACITY,
    MIN_TREEIFY_CAPACITY, TREEIFY_THRESHOLD, UNTREEIFY_THRESHOLD,
};
use crate::node::{CellKey, Links, Node, TreeLinks};
use crate::order::{OrderList, OrderMode};
use core::borrow::Borrow;
use core::cell::Cell;
use slotmap::SlotMap;
use std::rc::Rc;

/// Shared structural modification counter.
///
/// Cursors hold a second handle to the same counter so they can detect
/// changes they did not make, and compare handles to recognize their map.
#[derive(Debug)]
pub(crate) struct ModCount(Rc<Cell<u64>>);

impl ModCount {
    pub(crate) fn new() -> Self {
        ModCount(Rc::new(Cell::new(0)))
    }

    #[inline]
    pub(crate) fn get(&self) -> u64 {
        self.0.get()
    }

    #[inline]
    pub(crate) fn bump(&self) {
        self.0.set(self.0.get().wrapping_add(1));
    }

    /// Another handle to the same counter.
    pub(crate) fn share(&self) -> Self {
        ModCount(Rc::clone(&self.0))
    }

    pub(crate) fn same_counter(&self, other: &ModCount) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Shape of one bucket, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinShape {
    Empty,
    /// Plain chain of this many cells.
    Chain(usize),
    /// Red-black tree of this many cells.
    Tree(usize),
}

/// Outcome of a single lookup pass that also prepares an insertion.
pub(crate) enum Probe {
    Found(CellKey),
    Vacant(Slot),
}

/// Where a new cell goes if the probed key is absent.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slot {
    index: usize,
    /// Last chain cell; unused for tree bins.
    tail: Option<CellKey>,
    bin_len: usize,
    tree: bool,
}

/// Tail-growing sublist used to split a bucket without reordering it.
#[derive(Default)]
pub(crate) struct Sublist {
    pub(crate) head: Option<CellKey>,
    tail: Option<CellKey>,
    pub(crate) len: usize,
}

impl Sublist {
    pub(crate) fn push<K, V>(&mut self, cells: &mut SlotMap<CellKey, Node<K, V>>, k: CellKey) {
        match self.tail {
            None => self.head = Some(k),
            Some(t) => cells[t].next = Some(k),
        }
        if let Links::Tree(t) = &mut cells[k].links {
            t.prev = self.tail;
        }
        self.tail = Some(k);
        self.len += 1;
    }
}

pub(crate) struct RawTable<K, V> {
    pub(crate) cells: SlotMap<CellKey, Node<K, V>>,
    /// Bucket heads; empty until the first write.
    pub(crate) buckets: Vec<Option<CellKey>>,
    /// Resize trigger. Before the first allocation it stages the requested
    /// capacity instead (0 selects the default).
    pub(crate) threshold: usize,
    pub(crate) load_factor: f32,
    pub(crate) order: OrderList,
    pub(crate) mods: ModCount,
}

impl<K, V> RawTable<K, V> {
    /// `initial_capacity` is rounded up to a power of two; `None` defers to
    /// the default on first allocation.
    pub(crate) fn new(initial_capacity: Option<usize>, load_factor: f32, mode: OrderMode) -> Self {
        Self {
            cells: SlotMap::with_key(),
            buckets: Vec::new(),
            threshold: initial_capacity.map_or(0, table_size_for),
            load_factor,
            order: OrderList::new(mode),
            mods: ModCount::new(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        if !self.buckets.is_empty() {
            self.buckets.len()
        } else if self.threshold > 0 {
            self.threshold
        } else {
            DEFAULT_INITIAL_CAPACITY
        }
    }

    #[inline]
    pub(crate) fn bucket_of(&self, hash: u32) -> usize {
        bucket_index(hash, self.buckets.len())
    }

    /// Allocate the table or double it, splitting every bucket.
    pub(crate) fn resize(&mut self) {
        let old_cap = self.buckets.len();
        let new_cap = if old_cap > 0 {
            if old_cap >= MAXIMUM_CAPACITY {
                self.threshold = usize::MAX;
                return;
            }
            old_cap << 1
        } else if self.threshold > 0 {
            self.threshold
        } else {
            DEFAULT_INITIAL_CAPACITY
        };
        self.threshold = threshold_for(new_cap, self.load_factor);
        let old = core::mem::replace(&mut self.buckets, vec![None; new_cap]);
        self.mods.bump();
        log::debug!(
            "resized bucket array from {} to {} (len {}, threshold {})",
            old_cap,
            new_cap,
            self.len(),
            self.threshold
        );

        for (j, head) in old.into_iter().enumerate() {
            let Some(e) = head else { continue };
            let node = &self.cells[e];
            if node.next.is_none() {
                let i = bucket_index(node.hash, new_cap);
                self.buckets[i] = Some(e);
            } else if node.is_tree() {
                self.split_tree(e, j, old_cap);
            } else {
                self.split_chain(e, j, old_cap);
            }
        }
    }

    fn split_chain(&mut self, head: CellKey, index: usize, bit: usize) {
        let mut lo = Sublist::default();
        let mut hi = Sublist::default();
        let mut cur = Some(head);
        while let Some(k) = cur {
            let node = &mut self.cells[k];
            cur = node.next.take();
            if node.hash as usize & bit == 0 {
                lo.push(&mut self.cells, k);
            } else {
                hi.push(&mut self.cells, k);
            }
        }
        self.buckets[index] = lo.head;
        self.buckets[index + bit] = hi.head;
    }

    /// Escalate bucket `index`, or grow instead while the table is small.
    pub(crate) fn treeify_bin(&mut self, index: usize) {
        if self.buckets.len() < MIN_TREEIFY_CAPACITY {
            self.resize();
        } else if self.buckets[index].is_some() {
            self.treeify(index);
        }
    }

    /// Locate `q`, reporting either the matching cell or the insertion point.
    /// Allocates the table on first use.
    pub(crate) fn probe<Q>(&mut self, hash: u32, q: &Q) -> Probe
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if self.buckets.is_empty() {
            self.resize();
        }
        let index = self.bucket_of(hash);
        let Some(head) = self.buckets[index] else {
            return Probe::Vacant(Slot {
                index,
                tail: None,
                bin_len: 0,
                tree: false,
            });
        };
        if self.cells[head].is_tree() {
            let root = self.root_of(head);
            return match self.tree_find(root, hash, q) {
                Some(k) => Probe::Found(k),
                None => Probe::Vacant(Slot {
                    index,
                    tail: None,
                    bin_len: 0,
                    tree: true,
                }),
            };
        }
        let mut bin_len = 0;
        let mut cur = Some(head);
        let mut tail = None;
        while let Some(k) = cur {
            let node = &self.cells[k];
            if node.hash == hash && node.key.borrow() == q {
                return Probe::Found(k);
            }
            bin_len += 1;
            tail = Some(k);
            cur = node.next;
        }
        Probe::Vacant(Slot {
            index,
            tail,
            bin_len,
            tree: false,
        })
    }

    pub(crate) fn find<Q>(&self, hash: u32, q: &Q) -> Option<CellKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if self.buckets.is_empty() {
            return None;
        }
        let head = self.buckets[self.bucket_of(hash)]?;
        if self.cells[head].is_tree() {
            return self.tree_find(self.root_of(head), hash, q);
        }
        let mut cur = Some(head);
        while let Some(k) = cur {
            let node = &self.cells[k];
            if node.hash == hash && node.key.borrow() == q {
                return Some(k);
            }
            cur = node.next;
        }
        None
    }

    /// Insertion point for a key known to be absent; no keys are compared.
    pub(crate) fn vacant_slot(&mut self, hash: u32) -> Slot {
        if self.buckets.is_empty() {
            self.resize();
        }
        let index = self.bucket_of(hash);
        let mut slot = Slot {
            index,
            tail: None,
            bin_len: 0,
            tree: false,
        };
        let mut cur = self.buckets[index];
        if cur.is_some_and(|h| self.cells[h].is_tree()) {
            slot.tree = true;
            return slot;
        }
        while let Some(k) = cur {
            slot.bin_len += 1;
            slot.tail = Some(k);
            cur = self.cells[k].next;
        }
        slot
    }

    /// Create a cell at `slot` and link it into its bucket and the order
    /// list. Escalates or grows as needed. Does not consult eviction.
    pub(crate) fn link_new(&mut self, slot: Slot, hash: u32, key: K, value: V) -> CellKey {
        let links = if slot.tree {
            Links::Tree(TreeLinks::default())
        } else {
            Links::Plain
        };
        let x = self.cells.insert(Node::new(hash, key, value, links));
        self.order.link_last(&mut self.cells, x);
        if slot.tree {
            self.tree_insert(slot.index, x);
        } else {
            match slot.tail {
                None => self.buckets[slot.index] = Some(x),
                Some(t) => self.cells[t].next = Some(x),
            }
            if slot.bin_len + 1 >= TREEIFY_THRESHOLD {
                self.treeify_bin(slot.index);
            }
        }
        self.mods.bump();
        if self.len() > self.threshold {
            self.resize();
        }
        x
    }

    /// Count the cells of bucket `index`, stopping once `limit` is passed.
    fn bin_len_capped(&self, index: usize, limit: usize) -> usize {
        let mut n = 0;
        let mut cur = self.buckets[index];
        while let Some(k) = cur {
            n += 1;
            if n > limit {
                break;
            }
            cur = self.cells[k].next;
        }
        n
    }

    /// Detach `k` from its bucket. A tree bin left with at most
    /// `UNTREEIFY_THRESHOLD` cells is turned back into a chain first.
    ///
    /// With `movable == false` the bucket is never reordered, which keeps
    /// an in-progress traversal valid.
    fn unlink_from_bin(&mut self, k: CellKey, movable: bool) {
        let index = self.bucket_of(self.cells[k].hash);
        if self.cells[k].is_tree() {
            if self.bin_len_capped(index, UNTREEIFY_THRESHOLD + 1) > UNTREEIFY_THRESHOLD + 1 {
                self.tree_remove(index, k, movable);
                return;
            }
            self.untreeify(index);
        }
        let mut prev = None;
        let mut cur = self.buckets[index];
        while let Some(c) = cur {
            if c == k {
                break;
            }
            prev = cur;
            cur = self.cells[c].next;
        }
        let next = self.cells[k].next.take();
        match prev {
            None => self.buckets[index] = next,
            Some(p) => self.cells[p].next = next,
        }
    }

    /// Remove a live cell from every structure and return its contents.
    pub(crate) fn remove_cell(&mut self, k: CellKey, movable: bool) -> Option<(K, V)> {
        if !self.cells.contains_key(k) {
            return None;
        }
        self.unlink_from_bin(k, movable);
        self.order.unlink(&mut self.cells, k);
        self.mods.bump();
        let node = self.cells.remove(k)?;
        Some((node.key, node.value))
    }

    /// Drop every cell, keeping the bucket array.
    pub(crate) fn clear(&mut self) {
        self.mods.bump();
        self.cells.clear();
        self.buckets.iter_mut().for_each(|b| *b = None);
        self.order.clear();
    }

    /// Move every cell into a detached table, leaving this one empty with
    /// its capacity intact.
    pub(crate) fn take_all(&mut self) -> RawTable<K, V> {
        let cap = self.buckets.len();
        let mode = self.order.mode();
        self.mods.bump();
        RawTable {
            cells: core::mem::replace(&mut self.cells, SlotMap::with_key()),
            buckets: core::mem::replace(&mut self.buckets, vec![None; cap]),
            threshold: self.threshold,
            load_factor: self.load_factor,
            order: core::mem::replace(&mut self.order, OrderList::new(mode)),
            mods: ModCount::new(),
        }
    }

    /// Grow ahead of `additional` insertions.
    pub(crate) fn reserve(&mut self, additional: usize) {
        if additional == 0 {
            return;
        }
        let needed = self.len().saturating_add(additional);
        if self.buckets.is_empty() {
            let ft = needed as f64 / self.load_factor as f64 + 1.0;
            let mut t = if ft < MAXIMUM_CAPACITY as f64 {
                ft as usize
            } else {
                MAXIMUM_CAPACITY
            };
            // Nothing staged yet: never presize below the default.
            if self.threshold == 0 {
                t = t.max(DEFAULT_INITIAL_CAPACITY);
            }
            if t > self.threshold {
                self.threshold = table_size_for(t);
            }
        } else {
            while needed > self.threshold && self.buckets.len() < MAXIMUM_CAPACITY {
                self.resize();
            }
        }
    }

    pub(crate) fn bin_shape(&self, index: usize) -> BinShape {
        let Some(head) = self.buckets.get(index).copied().flatten() else {
            return BinShape::Empty;
        };
        let mut n = 0;
        let mut cur = Some(head);
        while let Some(k) = cur {
            n += 1;
            cur = self.cells[k].next;
        }
        if self.cells[head].is_tree() {
            BinShape::Tree(n)
        } else {
            BinShape::Chain(n)
        }
    }

    /// Verify every bucket, the order list, and the size bookkeeping.
    pub(crate) fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let cap = self.buckets.len();
        if cap > 0 && !cap.is_power_of_two() {
            return Err(InvariantViolation::global(format!(
                "capacity {cap} is not a power of two"
            )));
        }
        let mut total = 0;
        for index in 0..cap {
            let Some(head) = self.buckets[index] else { continue };
            let n = if self.cells[head].is_tree() {
                self.check_tree(index)?
            } else {
                self.check_chain(index, head)?
            };
            total += n;
        }
        if total != self.len() {
            return Err(InvariantViolation::global(format!(
                "buckets hold {total} cells but the arena holds {}",
                self.len()
            )));
        }
        self.check_order()
    }

    fn check_chain(&self, index: usize, head: CellKey) -> Result<usize, InvariantViolation> {
        let mut n = 0;
        let mut cur = Some(head);
        while let Some(k) = cur {
            let node = self
                .cells
                .get(k)
                .ok_or_else(|| InvariantViolation::in_bucket(index, "chain links a freed cell"))?;
            if node.is_tree() {
                return Err(InvariantViolation::in_bucket(index, "tree cell inside a plain chain"));
            }
            if self.bucket_of(node.hash) != index {
                return Err(InvariantViolation::in_bucket(index, "cell hash maps to another bucket"));
            }
            n += 1;
            if n > self.len() {
                return Err(InvariantViolation::in_bucket(index, "chain contains a cycle"));
            }
            cur = node.next;
        }
        Ok(n)
    }

    fn check_order(&self) -> Result<(), InvariantViolation> {
        if !self.order.is_enabled() {
            if self.order.head.is_some() || self.order.tail.is_some() {
                return Err(InvariantViolation::global("unordered map keeps an order list"));
            }
            return Ok(());
        }
        let mut n = 0;
        let mut prev = None;
        let mut cur = self.order.head;
        while let Some(k) = cur {
            let node = self
                .cells
                .get(k)
                .ok_or_else(|| InvariantViolation::global("order list links a freed cell"))?;
            if node.before != prev {
                return Err(InvariantViolation::global("order list back link mismatch"));
            }
            n += 1;
            if n > self.len() {
                return Err(InvariantViolation::global("order list contains a cycle"));
            }
            prev = Some(k);
            cur = node.after;
        }
        if prev != self.order.tail {
            return Err(InvariantViolation::global("order list tail mismatch"));
        }
        if n != self.len() {
            return Err(InvariantViolation::global(format!(
                "order list holds {n} cells, map holds {}",
                self.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(t: &mut RawTable<u32, u32>, hash: u32, v: u32) -> CellKey {
        match t.probe(hash, &hash) {
            Probe::Found(k) => {
                t.cells[k].value = v;
                k
            }
            Probe::Vacant(slot) => t.link_new(slot, hash, hash, v),
        }
    }

    fn chain_keys(t: &RawTable<u32, u32>, index: usize) -> Vec<u32> {
        let mut out = Vec::new();
        let mut cur = t.buckets[index];
        while let Some(k) = cur {
            out.push(t.cells[k].key);
            cur = t.cells[k].next;
        }
        out
    }

    #[test]
    fn first_write_allocates_default() {
        let mut t: RawTable<u32, u32> = RawTable::new(None, 0.75, OrderMode::Unordered);
        assert_eq!(t.capacity(), 16);
        assert!(t.buckets.is_empty());
        insert(&mut t, 1, 1);
        assert_eq!(t.buckets.len(), 16);
        assert_eq!(t.threshold, 12);
    }

    #[test]
    fn staged_capacity_is_rounded() {
        let t: RawTable<u32, u32> = RawTable::new(Some(20), 0.75, OrderMode::Unordered);
        assert_eq!(t.capacity(), 32);
    }

    #[test]
    fn split_keeps_relative_order() {
        let mut t: RawTable<u32, u32> = RawTable::new(Some(4), 1.0, OrderMode::Unordered);
        // All land in bucket 1 of 4; bit 4 decides lo/hi after doubling.
        for h in [1, 5, 9, 13] {
            insert(&mut t, h, h);
        }
        assert_eq!(chain_keys(&t, 1), [1, 5, 9, 13]);
        insert(&mut t, 17, 17); // len 5 > threshold 4
        assert_eq!(t.buckets.len(), 8);
        assert_eq!(chain_keys(&t, 1), [1, 9, 17]);
        assert_eq!(chain_keys(&t, 5), [5, 13]);
        t.check_invariants().unwrap();
    }

    #[test]
    fn long_chain_in_small_table_grows_instead() {
        let mut t: RawTable<u32, u32> = RawTable::new(Some(16), 100.0, OrderMode::Unordered);
        for i in 0..8 {
            insert(&mut t, i * 128, i);
        }
        // Eighth cell in one bucket with capacity < 64 forces a resize.
        assert_eq!(t.buckets.len(), 32);
        assert_eq!(t.bin_shape(0), BinShape::Chain(8));
        t.check_invariants().unwrap();
    }

    #[test]
    fn remove_relinks_chain() {
        let mut t: RawTable<u32, u32> = RawTable::new(Some(4), 0.75, OrderMode::Insertion);
        let ks: Vec<_> = [2, 6, 10].iter().map(|&h| insert(&mut t, h, h)).collect();
        assert_eq!(t.remove_cell(ks[1], true), Some((6, 6)));
        assert_eq!(chain_keys(&t, 2), [2, 10]);
        assert_eq!(t.remove_cell(ks[1], true), None);
        t.check_invariants().unwrap();
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut t: RawTable<u32, u32> = RawTable::new(None, 0.75, OrderMode::Insertion);
        for h in 0..40 {
            insert(&mut t, h, h);
        }
        let cap = t.capacity();
        let before = t.mods.get();
        t.clear();
        assert_eq!(t.len(), 0);
        assert_eq!(t.capacity(), cap);
        assert!(t.mods.get() > before);
        t.check_invariants().unwrap();
    }

    #[test]
    fn reserve_stages_or_grows() {
        let mut t: RawTable<u32, u32> = RawTable::new(None, 0.75, OrderMode::Unordered);
        t.reserve(100);
        assert_eq!(t.capacity(), 256);
        insert(&mut t, 1, 1);
        assert_eq!(t.buckets.len(), 256);
        t.reserve(1000);
        assert!(t.threshold >= 1001);
    }

    #[test]
    fn small_reserve_keeps_default_floor() {
        let mut t: RawTable<u32, u32> = RawTable::new(None, 0.75, OrderMode::Unordered);
        t.reserve(0);
        assert_eq!(t.threshold, 0);
        assert_eq!(t.capacity(), 16);
        t.reserve(3);
        assert_eq!(t.capacity(), 16);
        insert(&mut t, 1, 1);
        assert_eq!(t.buckets.len(), 16);

        // An explicitly small table stays small.
        let mut t: RawTable<u32, u32> = RawTable::new(Some(2), 0.75, OrderMode::Unordered);
        t.reserve(1);
        assert_eq!(t.capacity(), 2);
    }
}
