use chain_map::{ChainMap, LruCache, MapConfig, OrderMode};
use proptest::prelude::*;
use std::collections::VecDeque;

// Model LRU: front is least recently used.
struct ModelLru {
    cap: usize,
    entries: VecDeque<(u8, i32)>,
}

impl ModelLru {
    fn touch(&mut self, k: u8) -> Option<i32> {
        let pos = self.entries.iter().position(|(mk, _)| *mk == k)?;
        let e = self.entries.remove(pos)?;
        self.entries.push_back(e);
        Some(e.1)
    }

    fn put(&mut self, k: u8, v: i32) -> Option<i32> {
        if let Some(pos) = self.entries.iter().position(|(mk, _)| *mk == k) {
            let old = self.entries.remove(pos).map(|(_, ov)| ov);
            self.entries.push_back((k, v));
            return old;
        }
        self.entries.push_back((k, v));
        if self.entries.len() > self.cap {
            self.entries.pop_front();
        }
        None
    }

    fn remove(&mut self, k: u8) -> Option<i32> {
        let pos = self.entries.iter().position(|(mk, _)| *mk == k)?;
        self.entries.remove(pos).map(|(_, v)| v)
    }
}

// Property: an access-ordered map bounded by MaxEntries behaves like a
// model LRU: same lookups, same evictions, same recency order.
proptest! {
    #[test]
    fn prop_lru_matches_model(cap in 1usize..8, ops in proptest::collection::vec((0u8..3, 0u8..16, any::<i32>()), 1..200)) {
        let mut sut: LruCache<u8, i32> = LruCache::lru(cap).unwrap();
        let mut model = ModelLru { cap, entries: VecDeque::new() };
        for (op, k, v) in ops {
            match op {
                0 => prop_assert_eq!(sut.insert(k, v), model.put(k, v)),
                1 => prop_assert_eq!(sut.get(&k).copied(), model.touch(k)),
                2 => prop_assert_eq!(sut.remove(&k), model.remove(k)),
                _ => unreachable!(),
            }
            let got: Vec<(u8, i32)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
            let want: Vec<(u8, i32)> = model.entries.iter().copied().collect();
            prop_assert_eq!(got, want);
            prop_assert!(sut.check_invariants().is_ok());
        }
    }
}

// Property: insertion order survives growth, collisions and removals.
proptest! {
    #[test]
    fn prop_insertion_order_matches_vec(ops in proptest::collection::vec((any::<bool>(), 0u16..300), 1..400)) {
        let config = MapConfig::default().with_initial_capacity(1).with_order(OrderMode::Insertion);
        let mut sut: ChainMap<u16, ()> = ChainMap::with_config(config).unwrap();
        let mut model: Vec<u16> = Vec::new();
        for (insert, k) in ops {
            if insert {
                if sut.insert(k, ()).is_none() {
                    model.push(k);
                }
            } else if sut.remove(&k).is_some() {
                model.retain(|m| *m != k);
            }
        }
        prop_assert_eq!(sut.keys().copied().collect::<Vec<_>>(), model);
        prop_assert!(sut.check_invariants().is_ok());
    }
}
