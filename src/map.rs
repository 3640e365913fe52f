//! `ChainMap`: the public map engine.
//!
//! Every operation hashes the key once with the map's `BuildHasher`, then
//! works on the bucket table through stored hashes only. Lookups and
//! insertions share a single probe, so `compute`-style operations locate
//! the key and its prospective insertion point in one pass.
//!
//! Ordering and eviction are strategies rather than subclasses: the table
//! carries an [`OrderMode`] and the map an [`EvictionPolicy`]. The base
//! variant (`Unordered`, [`NeverEvict`]) pays nothing for either.

use crate::config::MapConfig;
use crate::error::{InvariantViolation, MapError};
use crate::hashing::{bucket_index, hash_key, DEFAULT_LOAD_FACTOR};
use crate::iter::{Cursor, Drain, IntoIter, Iter, IterMut, Keys, Values, ValuesMut, Walk};
use crate::node::CellKey;
use crate::order::{EvictionPolicy, MaxEntries, NeverEvict, OrderMode};
use crate::reentrancy::DebugReentrancy;
use crate::table::{BinShape, Probe, RawTable};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use core::ops::Index;
use hashbrown::hash_map::DefaultHashBuilder;

/// Hash map with collision-resistant tree bins and optional entry ordering.
///
/// - `S` hashes keys; any `BuildHasher` works.
/// - `E` decides whether to drop the eldest entry after each insertion of a
///   new key. It only runs when the map keeps an order list.
///
/// The map is single-threaded (`!Send`, `!Sync`).
pub struct ChainMap<K, V, S = DefaultHashBuilder, E = NeverEvict> {
    hasher: S,
    pub(crate) raw: RawTable<K, V>,
    policy: E,
    pub(crate) reentrancy: DebugReentrancy,
}

/// Bounded cache evicting the least recently used entry.
pub type LruCache<K, V, S = DefaultHashBuilder> = ChainMap<K, V, S, MaxEntries>;

impl<K, V> ChainMap<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Stage `capacity` buckets (rounded up to a power of two); nothing is
    /// allocated until the first insertion.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_parts(
            RawTable::new(Some(capacity), DEFAULT_LOAD_FACTOR, OrderMode::Unordered),
            DefaultHashBuilder::default(),
            NeverEvict,
        )
    }

    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Result<Self, MapError> {
        Self::with_config(
            MapConfig::default()
                .with_initial_capacity(capacity)
                .with_load_factor(load_factor),
        )
    }

    pub fn with_config(config: MapConfig) -> Result<Self, MapError> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V> ChainMap<K, V, DefaultHashBuilder, MaxEntries> {
    /// Access-ordered map holding at most `max_entries` entries.
    ///
    /// ```
    /// use chain_map::LruCache;
    ///
    /// let mut cache: LruCache<&str, i32> = LruCache::lru(2)?;
    /// cache.insert("a", 1);
    /// cache.insert("b", 2);
    /// cache.get(&"a");
    /// cache.insert("c", 3);
    /// assert_eq!(cache.keys().copied().collect::<Vec<_>>(), ["a", "c"]);
    /// # Ok::<(), chain_map::MapError>(())
    /// ```
    pub fn lru(max_entries: usize) -> Result<Self, MapError> {
        if max_entries == 0 {
            return Err(MapError::invalid("eviction bound must be at least 1"));
        }
        Self::with_config_hasher_and_policy(
            MapConfig::default().with_order(OrderMode::Access),
            DefaultHashBuilder::default(),
            MaxEntries(max_entries),
        )
    }
}

impl<K, V, S> ChainMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        let config = MapConfig::default();
        Self::from_parts(
            RawTable::new(config.initial_capacity, config.load_factor, config.order),
            hasher,
            NeverEvict,
        )
    }

    pub fn with_config_and_hasher(config: MapConfig, hasher: S) -> Result<Self, MapError> {
        Self::with_config_hasher_and_policy(config, hasher, NeverEvict)
    }
}

impl<K, V, S, E> ChainMap<K, V, S, E> {
    pub fn with_config_hasher_and_policy(config: MapConfig, hasher: S, policy: E) -> Result<Self, MapError> {
        config.validate()?;
        Ok(Self::from_parts(
            RawTable::new(config.initial_capacity, config.load_factor, config.order),
            hasher,
            policy,
        ))
    }

    pub(crate) fn from_parts(raw: RawTable<K, V>, hasher: S, policy: E) -> Self {
        Self {
            hasher,
            raw,
            policy,
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Current bucket count, or the count the first insertion will allocate.
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    pub fn load_factor(&self) -> f32 {
        self.raw.load_factor
    }

    pub fn order_mode(&self) -> OrderMode {
        self.raw.order.mode()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn policy(&self) -> &E {
        &self.policy
    }

    /// Shape of bucket `index`; `Empty` for out-of-range indices.
    pub fn bin_shape(&self, index: usize) -> BinShape {
        self.raw.bin_shape(index)
    }

    /// Walk every bucket, tree and the order list and report the first
    /// broken structural property. Linear in the size of the map.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let _g = self.reentrancy.enter("check_invariants");
        self.raw.check_invariants()
    }

    /// Eldest entry of an ordered map (least recently used in access
    /// order). `None` when empty or unordered.
    pub fn first(&self) -> Option<(&K, &V)> {
        let node = &self.raw.cells[self.raw.order.head?];
        Some((&node.key, &node.value))
    }

    /// Newest (or most recently used) entry of an ordered map.
    pub fn last(&self) -> Option<(&K, &V)> {
        let node = &self.raw.cells[self.raw.order.tail?];
        Some((&node.key, &node.value))
    }

    /// Remove and return the eldest entry of an ordered map.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let _g = self.reentrancy.enter("pop_first");
        let head = self.raw.order.head?;
        self.raw.remove_cell(head, true)
    }

    /// Remove every entry. Capacity is kept.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        self.raw.clear();
    }

    /// Grow so that `additional` more entries fit without a resize.
    pub fn reserve(&mut self, additional: usize) {
        let _g = self.reentrancy.enter("reserve");
        self.raw.reserve(additional);
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.raw)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.raw)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Remove every entry, yielding them in map order. The map is empty as
    /// soon as this returns; capacity is kept.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        let _g = self.reentrancy.enter("drain");
        Drain {
            inner: IntoIter::new(self.raw.take_all()),
            _map: PhantomData,
        }
    }

    /// A fail-fast cursor positioned before the first entry.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(&self.raw)
    }

    /// Call `f` on every entry in map order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        let _g = self.reentrancy.enter("for_each");
        let mut walk = Walk::start(&self.raw);
        while let Some(k) = walk.step(&self.raw) {
            let node = &self.raw.cells[k];
            f(&node.key, &node.value);
        }
    }

    /// Replace every value with `f(key, value)`, in map order.
    pub fn replace_all<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &V) -> V,
    {
        let _g = self.reentrancy.enter("replace_all");
        let mut walk = Walk::start(&self.raw);
        while let Some(k) = walk.step(&self.raw) {
            let node = &mut self.raw.cells[k];
            node.value = f(&node.key, &node.value);
        }
    }

    /// Keep only the entries for which `keep` returns `true`. Visits entries
    /// in map order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let _g = self.reentrancy.enter("retain");
        let mut walk = Walk::start(&self.raw);
        while let Some(k) = walk.step(&self.raw) {
            let node = &mut self.raw.cells[k];
            if !keep(&node.key, &mut node.value) {
                self.raw.remove_cell(k, false);
            }
        }
    }

    /// O(n) scan for a value.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }
}

impl<K, V, S, E> ChainMap<K, V, S, E>
where
    K: Eq + Hash,
    S: BuildHasher,
    E: EvictionPolicy<K, V>,
{
    /// Bucket a key hashes to under the current capacity.
    pub fn bucket_of<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        bucket_index(hash_key(&self.hasher, key), self.raw.capacity())
    }

    fn find<Q>(&self, key: &Q) -> Option<CellKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.raw.find(hash_key(&self.hasher, key), key)
    }

    /// Look up `key`. In access order a hit becomes the most recently used
    /// entry, which counts as a structural change.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get");
        let k = self.raw.find(hash_key(&self.hasher, key), key)?;
        self.raw.record_access(k);
        Some(&self.raw.cells[k].value)
    }

    /// Look up `key` without recording an access.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("peek");
        self.find(key).map(|k| &self.raw.cells[k].value)
    }

    /// Like [`get`](Self::get), falling back to `default` when `key` is
    /// absent. A hit still records an access.
    pub fn get_or<'a, Q>(&'a mut self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).unwrap_or(default)
    }

    pub fn peek_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.peek(key).unwrap_or(default)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_mut");
        let k = self.raw.find(hash_key(&self.hasher, key), key)?;
        self.raw.record_access(k);
        Some(&mut self.raw.cells[k].value)
    }

    /// Stored key and value for `key`, without recording an access.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_key_value");
        let node = &self.raw.cells[self.find(key)?];
        Some((&node.key, &node.value))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("contains_key");
        self.find(key).is_some()
    }

    /// Insert or update. Returns the previous value; the stored key is kept
    /// when the entry already existed.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.reentrancy.enter("insert");
        let hash = hash_key(&self.hasher, &key);
        match self.raw.probe(hash, &key) {
            Probe::Found(k) => {
                let old = core::mem::replace(&mut self.raw.cells[k].value, value);
                self.raw.record_access(k);
                Some(old)
            }
            Probe::Vacant(slot) => {
                let x = self.raw.link_new(slot, hash, key, value);
                self.raw.evict_after_insert(x, &mut self.policy);
                None
            }
        }
    }

    /// Insert only if `key` is absent. Returns the existing value, left
    /// unchanged, or `None` after inserting.
    pub fn put_if_absent(&mut self, key: K, value: V) -> Option<&V> {
        let _g = self.reentrancy.enter("put_if_absent");
        let hash = hash_key(&self.hasher, &key);
        match self.raw.probe(hash, &key) {
            Probe::Found(k) => {
                self.raw.record_access(k);
                Some(&self.raw.cells[k].value)
            }
            Probe::Vacant(slot) => {
                let x = self.raw.link_new(slot, hash, key, value);
                self.raw.evict_after_insert(x, &mut self.policy);
                None
            }
        }
    }

    /// Insert every pair in order, pre-sizing from the iterator's lower bound.
    pub fn put_all<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let iter = entries.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("remove");
        let k = self.raw.find(hash_key(&self.hasher, key), key)?;
        self.raw.remove_cell(k, true)
    }

    /// Remove `key` only if it maps to `value`.
    pub fn remove_if_eq<Q>(&mut self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: PartialEq,
    {
        let _g = self.reentrancy.enter("remove_if_eq");
        let Some(k) = self.raw.find(hash_key(&self.hasher, key), key) else {
            return false;
        };
        if self.raw.cells[k].value != *value {
            return false;
        }
        self.raw.remove_cell(k, true).is_some()
    }

    /// Update an existing mapping; absent keys are left absent.
    pub fn replace<Q>(&mut self, key: &Q, value: V) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("replace");
        let k = self.raw.find(hash_key(&self.hasher, key), key)?;
        let old = core::mem::replace(&mut self.raw.cells[k].value, value);
        self.raw.record_access(k);
        Some(old)
    }

    /// Update `key` to `new` only if it currently maps to `old`.
    pub fn replace_if_eq<Q>(&mut self, key: &Q, old: &V, new: V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: PartialEq,
    {
        let _g = self.reentrancy.enter("replace_if_eq");
        let Some(k) = self.raw.find(hash_key(&self.hasher, key), key) else {
            return false;
        };
        let slot = &mut self.raw.cells[k].value;
        if *slot != *old {
            return false;
        }
        *slot = new;
        self.raw.record_access(k);
        true
    }

    /// Return the value for `key`, computing and inserting it with `f` if
    /// absent. `f` returning `None` inserts nothing.
    ///
    /// The returned reference is `None` also when the eviction policy
    /// dropped the freshly inserted entry.
    pub fn compute_if_absent<F>(&mut self, key: K, f: F) -> Option<&mut V>
    where
        F: FnOnce(&K) -> Option<V>,
    {
        let _g = self.reentrancy.enter("compute_if_absent");
        let hash = hash_key(&self.hasher, &key);
        let x = match self.raw.probe(hash, &key) {
            Probe::Found(k) => {
                self.raw.record_access(k);
                k
            }
            Probe::Vacant(slot) => {
                let value = f(&key)?;
                let x = self.raw.link_new(slot, hash, key, value);
                self.raw.evict_after_insert(x, &mut self.policy);
                x
            }
        };
        self.raw.cells.get_mut(x).map(|node| &mut node.value)
    }

    /// Recompute the value of a present key. `None` from `f` removes the
    /// entry. Absent keys are left absent and `f` is not called.
    pub fn compute_if_present<Q, F>(&mut self, key: &Q, f: F) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&K, &V) -> Option<V>,
    {
        let _g = self.reentrancy.enter("compute_if_present");
        let k = self.raw.find(hash_key(&self.hasher, key), key)?;
        let node = &self.raw.cells[k];
        match f(&node.key, &node.value) {
            Some(v) => {
                self.raw.cells[k].value = v;
                self.raw.record_access(k);
                Some(&self.raw.cells[k].value)
            }
            None => {
                self.raw.remove_cell(k, true);
                None
            }
        }
    }

    /// Compute a new mapping from the current one (`None` if absent).
    /// `Some` inserts or updates; `None` removes or leaves absent.
    pub fn compute<F>(&mut self, key: K, f: F) -> Option<&V>
    where
        F: FnOnce(&K, Option<&V>) -> Option<V>,
    {
        let _g = self.reentrancy.enter("compute");
        let hash = hash_key(&self.hasher, &key);
        match self.raw.probe(hash, &key) {
            Probe::Found(k) => {
                let node = &self.raw.cells[k];
                match f(&node.key, Some(&node.value)) {
                    Some(v) => {
                        self.raw.cells[k].value = v;
                        self.raw.record_access(k);
                        Some(&self.raw.cells[k].value)
                    }
                    None => {
                        self.raw.remove_cell(k, true);
                        None
                    }
                }
            }
            Probe::Vacant(slot) => {
                let value = f(&key, None)?;
                let x = self.raw.link_new(slot, hash, key, value);
                self.raw.evict_after_insert(x, &mut self.policy);
                self.raw.cells.get(x).map(|node| &node.value)
            }
        }
    }

    /// Insert `value` if `key` is absent, otherwise combine it with the
    /// current value through `f`. `None` from `f` removes the entry.
    pub fn merge<F>(&mut self, key: K, value: V, f: F) -> Option<&V>
    where
        F: FnOnce(&V, V) -> Option<V>,
    {
        let _g = self.reentrancy.enter("merge");
        let hash = hash_key(&self.hasher, &key);
        match self.raw.probe(hash, &key) {
            Probe::Found(k) => match f(&self.raw.cells[k].value, value) {
                Some(v) => {
                    self.raw.cells[k].value = v;
                    self.raw.record_access(k);
                    Some(&self.raw.cells[k].value)
                }
                None => {
                    self.raw.remove_cell(k, true);
                    None
                }
            },
            Probe::Vacant(slot) => {
                let x = self.raw.link_new(slot, hash, key, value);
                self.raw.evict_after_insert(x, &mut self.policy);
                self.raw.cells.get(x).map(|node| &node.value)
            }
        }
    }
}

impl<K, V> RawTable<K, V> {
    /// In access order, make `k` the most recently used cell.
    pub(crate) fn record_access(&mut self, k: CellKey) {
        if self.order.touch(&mut self.cells, k) {
            self.mods.bump();
        }
    }

    /// Ask `policy` whether the eldest cell should go now that `new` has
    /// been inserted, and drop it if so.
    pub(crate) fn evict_after_insert<E>(&mut self, new: CellKey, policy: &mut E)
    where
        E: EvictionPolicy<K, V>,
    {
        let Some(eldest) = self.order.head else {
            return;
        };
        let node = &self.cells[eldest];
        if policy.should_evict(&node.key, &node.value, self.len()) {
            log::trace!(
                "evicting eldest entry (len {}, evicting the new entry: {})",
                self.len(),
                eldest == new
            );
            self.remove_cell(eldest, true);
        }
    }

    /// Reinsert the cells of `self` into a fresh table of the same capacity,
    /// reusing stored hashes. Keys are known distinct, so none are compared.
    pub(crate) fn duplicate(&self) -> RawTable<K, V>
    where
        K: Clone,
        V: Clone,
    {
        let mut out = RawTable::new(Some(self.capacity()), self.load_factor, self.order.mode());
        let mut walk = Walk::start(self);
        while let Some(k) = walk.step(self) {
            let node = &self.cells[k];
            let slot = out.vacant_slot(node.hash);
            out.link_new(slot, node.hash, node.key.clone(), node.value.clone());
        }
        out
    }
}

impl<K, V, S, E> Default for ChainMap<K, V, S, E>
where
    S: Default,
    E: Default,
{
    fn default() -> Self {
        let config = MapConfig::default();
        Self::from_parts(
            RawTable::new(config.initial_capacity, config.load_factor, config.order),
            S::default(),
            E::default(),
        )
    }
}

impl<K, V, S, E> Clone for ChainMap<K, V, S, E>
where
    K: Clone,
    V: Clone,
    S: Clone,
    E: Clone,
{
    /// Copies entries in map order into a table of the same capacity. The
    /// eviction policy is not consulted.
    fn clone(&self) -> Self {
        let _g = self.reentrancy.enter("clone");
        Self::from_parts(self.raw.duplicate(), self.hasher.clone(), self.policy.clone())
    }
}

impl<K, V, S, E> fmt::Debug for ChainMap<K, V, S, E>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Maps are equal when they hold the same mappings, regardless of order,
/// capacity, hasher or policy.
impl<K, V, S, E, S2, E2> PartialEq<ChainMap<K, V, S2, E2>> for ChainMap<K, V, S, E>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
    S2: BuildHasher,
    E: EvictionPolicy<K, V>,
    E2: EvictionPolicy<K, V>,
{
    fn eq(&self, other: &ChainMap<K, V, S2, E2>) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.peek(k) == Some(v))
    }
}

impl<K, V, S, E> Eq for ChainMap<K, V, S, E>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
    E: EvictionPolicy<K, V>,
{
}

impl<K, Q, V, S, E> Index<&Q> for ChainMap<K, V, S, E>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
    E: EvictionPolicy<K, V>,
{
    type Output = V;

    /// Panics if `key` is absent.
    fn index(&self, key: &Q) -> &V {
        self.peek(key).expect("no entry found for key")
    }
}

impl<K, V, S, E> Extend<(K, V)> for ChainMap<K, V, S, E>
where
    K: Eq + Hash,
    S: BuildHasher,
    E: EvictionPolicy<K, V>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.put_all(iter);
    }
}

impl<'a, K, V, S, E> Extend<(&'a K, &'a V)> for ChainMap<K, V, S, E>
where
    K: Eq + Hash + Copy,
    V: Copy,
    S: BuildHasher,
    E: EvictionPolicy<K, V>,
{
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        self.put_all(iter.into_iter().map(|(k, v)| (*k, *v)));
    }
}

impl<K, V, S, E> FromIterator<(K, V)> for ChainMap<K, V, S, E>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    E: EvictionPolicy<K, V> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.put_all(iter);
        map
    }
}

impl<K, V, S, E> IntoIterator for ChainMap<K, V, S, E> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter::new(self.raw)
    }
}

impl<'a, K, V, S, E> IntoIterator for &'a ChainMap<K, V, S, E> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S, E> IntoIterator for &'a mut ChainMap<K, V, S, E> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}
