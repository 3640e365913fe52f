#![cfg(test)]

// Property tests for ChainMap kept inside the crate so they can run the
// structural checker after every step and inspect bin shapes.

use crate::{ChainMap, MapConfig, OrderMode};
use proptest::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    PutIfAbsent(usize, i32),
    Remove(usize),
    Get(usize),
    ComputeIfPresent(usize, i32),
    Merge(usize, i32),
    Retain(i32),
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=40).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::PutIfAbsent(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::Get),
            1 => (idx.clone(), -3i32..3).prop_map(|(i, d)| OpI::ComputeIfPresent(i, d)),
            1 => (idx.clone(), -3i32..3).prop_map(|(i, d)| OpI::Merge(i, d)),
            1 => (2i32..5).prop_map(OpI::Retain),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Collision variant using a constant hasher: every key lands in one bucket,
// which escalates to a tree once the table reaches 64 buckets.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

fn run_ops<S: BuildHasher>(
    mut sut: ChainMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    // First-insertion order of live keys, for ordered maps.
    let mut order: Vec<Key> = Vec::new();
    let ordered = sut.order_mode() == OrderMode::Insertion;

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let prev = sut.insert(k.clone(), v);
                prop_assert_eq!(prev, model.insert(k.clone(), v));
                if prev.is_none() {
                    order.push(k);
                }
            }
            OpI::PutIfAbsent(i, v) => {
                let k = key_from(pool, i);
                let existing = sut.put_if_absent(k.clone(), v).copied();
                prop_assert_eq!(existing, model.get(&k).copied());
                if existing.is_none() {
                    model.insert(k.clone(), v);
                    order.push(k);
                }
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.remove(k.0.as_str()), model.remove(&k));
                order.retain(|o| o != &k);
            }
            OpI::Get(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(k.0.as_str()).copied(), model.get(&k).copied());
            }
            OpI::ComputeIfPresent(i, d) => {
                let k = key_from(pool, i);
                // Zero deltas delete, to exercise removal through the compute path.
                let got = sut
                    .compute_if_present(k.0.as_str(), |_, v| (d != 0).then(|| v.wrapping_add(d)))
                    .copied();
                let expect = match model.get(&k).copied() {
                    Some(v) if d != 0 => {
                        model.insert(k.clone(), v.wrapping_add(d));
                        Some(v.wrapping_add(d))
                    }
                    Some(_) => {
                        model.remove(&k);
                        order.retain(|o| o != &k);
                        None
                    }
                    None => None,
                };
                prop_assert_eq!(got, expect);
            }
            OpI::Merge(i, d) => {
                let k = key_from(pool, i);
                let got = sut
                    .merge(k.clone(), d, |old, new| (new != 0).then(|| old.wrapping_add(new)))
                    .copied();
                let expect = match model.get(&k).copied() {
                    Some(v) if d != 0 => {
                        model.insert(k.clone(), v.wrapping_add(d));
                        Some(v.wrapping_add(d))
                    }
                    Some(_) => {
                        model.remove(&k);
                        order.retain(|o| o != &k);
                        None
                    }
                    None => {
                        model.insert(k.clone(), d);
                        order.push(k);
                        Some(d)
                    }
                };
                prop_assert_eq!(got, expect);
            }
            OpI::Retain(m) => {
                sut.retain(|_, v| v.rem_euclid(m) != 0);
                model.retain(|_, v| v.rem_euclid(m) != 0);
                order.retain(|o| model.contains_key(o));
            }
            OpI::Iterate => {
                let mut s: Vec<(Key, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                if ordered {
                    let keys: Vec<Key> = s.iter().map(|(k, _)| k.clone()).collect();
                    prop_assert_eq!(&keys, &order);
                }
                let mut m: Vec<(Key, i32)> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                s.sort();
                m.sort();
                prop_assert_eq!(s, m);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        if let Err(e) = sut.check_invariants() {
            return Err(TestCaseError::fail(e.to_string()));
        }
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// - `insert`/`put_if_absent`/`remove`/`get` agree with the model.
// - compute-style updates insert, update or delete exactly like the model.
// - `iter` yields each live entry exactly once; insertion-ordered maps
//   yield keys in first-insertion order.
// - The structural checker passes after every step.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_ops(ChainMap::new(), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_insertion_order((pool, ops) in arb_scenario()) {
        let config = MapConfig::default().with_order(OrderMode::Insertion);
        run_ops(ChainMap::with_config(config).unwrap(), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_all_colliding((pool, ops) in arb_scenario()) {
        let config = MapConfig::default().with_initial_capacity(64);
        run_ops(ChainMap::with_config_and_hasher(config, ConstBuildHasher).unwrap(), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_colliding_small_table((pool, ops) in arb_scenario()) {
        let config = MapConfig::default()
            .with_initial_capacity(1)
            .with_order(OrderMode::Insertion);
        run_ops(ChainMap::with_config_and_hasher(config, ConstBuildHasher).unwrap(), &pool, ops)?;
    }
}
