use chain_map::{BinShape, ChainMap, ChainSet, MapConfig, MapError, OrderMode};

#[test]
fn growth_doubles_and_keeps_values() {
    let mut m: ChainMap<u32, String> = ChainMap::new();
    assert_eq!(m.capacity(), 16);
    // Threshold is 12 at 16 buckets.
    for i in 0..12 {
        m.insert(i, format!("v{i}"));
    }
    assert_eq!(m.capacity(), 16);
    m.insert(3, "updated".to_string());
    m.insert(12, "v12".to_string());
    assert_eq!(m.capacity(), 32);
    for i in 0..13 {
        let expect = if i == 3 { "updated".to_string() } else { format!("v{i}") };
        assert_eq!(m.peek(&i), Some(&expect));
    }
    m.check_invariants().unwrap();
}

#[test]
fn distinct_inserts_are_all_iterated() {
    for mode in [OrderMode::Unordered, OrderMode::Insertion, OrderMode::Access] {
        let mut m: ChainMap<u64, u64> = ChainMap::with_config(MapConfig::default().with_order(mode)).unwrap();
        for i in 0..1000u64 {
            m.insert(i.wrapping_mul(0x9E37_79B9_7F4A_7C15), i);
        }
        assert_eq!(m.len(), 1000);
        let mut vals: Vec<u64> = m.values().copied().collect();
        vals.sort_unstable();
        assert_eq!(vals, (0..1000).collect::<Vec<_>>(), "{mode:?}");
        m.check_invariants().unwrap();
    }
}

#[test]
fn membership_follows_last_put_or_remove() {
    let mut m: ChainMap<&str, i32> = ChainMap::new();
    m.insert("a", 1);
    m.insert("b", 2);
    m.remove(&"a");
    m.insert("c", 3);
    m.insert("a", 4);
    m.remove(&"b");
    assert!(m.contains_key(&"a"));
    assert!(!m.contains_key(&"b"));
    assert!(m.contains_key(&"c"));
    assert_eq!(m.get_key_value(&"a"), Some((&"a", &4)));
}

#[test]
fn clear_keeps_capacity_and_map_is_reusable() {
    let mut m: ChainMap<u32, u32> = (0..100).map(|i| (i, i)).collect();
    let cap = m.capacity();
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.capacity(), cap);
    assert_eq!(m.bin_shape(0), BinShape::Empty);
    m.insert(5, 5);
    assert_eq!(m[&5], 5);
}

#[test]
fn staged_capacity_and_reserve() {
    let m: ChainMap<u8, u8> = ChainMap::with_capacity(33);
    assert_eq!(m.capacity(), 64);
    let mut m: ChainMap<u32, u32> = ChainMap::new();
    m.reserve(1000);
    let cap = m.capacity();
    m.extend((0..1000).map(|i| (i, i)));
    assert_eq!(m.capacity(), cap, "reserve must avoid growth during the batch");
}

#[test]
fn option_keys_and_values_model_nulls() {
    let mut m: ChainMap<Option<&str>, Option<i32>> = ChainMap::new();
    m.insert(None, Some(1));
    m.insert(Some("x"), None);
    assert_eq!(m.peek(&None), Some(&Some(1)));
    // A present key mapped to `None` is still present.
    assert!(m.contains_key(&Some("x")));
    assert_eq!(m.peek(&Some("x")), Some(&None));
}

#[test]
fn into_iter_over_references() {
    let mut m: ChainMap<u8, u8> = ChainMap::new();
    m.extend([(1, 10), (2, 20)]);
    for (_, v) in &mut m {
        *v += 1;
    }
    let mut seen: Vec<(u8, u8)> = (&m).into_iter().map(|(k, v)| (*k, *v)).collect();
    seen.sort_unstable();
    assert_eq!(seen, [(1, 11), (2, 21)]);
    for v in m.values_mut() {
        *v = 0;
    }
    assert!(m.values().all(|v| *v == 0));
}

#[test]
fn invalid_configuration_is_reported() {
    let err = ChainMap::<u8, u8>::with_config(MapConfig::default().with_load_factor(-0.5)).unwrap_err();
    assert!(err.to_string().contains("load factor"));
    assert!(matches!(
        ChainSet::<u8>::with_config(MapConfig::default().with_load_factor(f32::NAN)),
        Err(MapError::InvalidConfiguration { .. })
    ));
}

#[test]
fn presizing_never_drops_below_default_capacity() {
    let mut m: ChainMap<u32, u32> = ChainMap::new();
    m.reserve(0);
    assert_eq!(m.capacity(), 16);
    m.insert(1, 1);
    assert_eq!(m.capacity(), 16);

    let m: ChainMap<u32, u32> = (0..3).filter(|_| true).map(|i| (i, i)).collect();
    assert_eq!(m.capacity(), 16);
    assert_eq!(m.len(), 3);

    let mut m: ChainMap<u32, u32> = ChainMap::new();
    m.extend((0..5).filter(|i| i % 2 == 0).map(|i| (i, i)));
    assert_eq!(m.capacity(), 16);

    let mut m: ChainMap<u32, u32> = ChainMap::new();
    m.put_all([(1, 1), (2, 2)]);
    assert_eq!(m.capacity(), 16);

    let s: ChainSet<u32> = (0..4).filter(|_| true).collect();
    assert_eq!(s.len(), 4);
    m.check_invariants().unwrap();
}
