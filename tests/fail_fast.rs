use chain_map::{ChainMap, MapConfig, MapError, OrderMode};

fn sample() -> ChainMap<u32, u32> {
    (0..20).map(|i| (i, i * 10)).collect()
}

#[test]
fn structural_change_invalidates_cursor() {
    let mut m = sample();
    let mut cur = m.cursor();
    assert!(cur.next(&m).unwrap().is_some());
    m.insert(100, 1);
    assert!(matches!(
        cur.next(&m),
        Err(MapError::ConcurrentModification { .. })
    ));
}

#[test]
fn value_update_is_not_structural() {
    let mut m = sample();
    let mut cur = m.cursor();
    cur.next(&m).unwrap();
    m.insert(5, 0);
    *m.get_mut(&6).unwrap() = 1;
    assert!(cur.next(&m).is_ok());
}

#[test]
fn access_ordered_read_is_structural() {
    let mut m: ChainMap<u32, u32> =
        ChainMap::with_config(MapConfig::default().with_order(OrderMode::Access)).unwrap();
    m.extend((0..5).map(|i| (i, i)));
    let mut cur = m.cursor();
    cur.next(&m).unwrap();
    m.get(&0);
    assert!(matches!(
        cur.next(&m),
        Err(MapError::ConcurrentModification { .. })
    ));
}

#[test]
fn removal_of_missing_key_is_not_structural() {
    let mut m = sample();
    let mut cur = m.cursor();
    m.remove(&999);
    assert!(cur.next(&m).is_ok());
}

#[test]
fn cursor_remove_continues_walk() {
    let mut m = sample();
    let mut cur = m.cursor();
    let mut seen = 0;
    while let Some((k, _)) = cur.next(&m).unwrap() {
        seen += 1;
        if k % 2 == 1 {
            cur.remove(&mut m).unwrap();
        }
    }
    assert_eq!(seen, 20);
    assert_eq!(m.len(), 10);
    assert!(m.keys().all(|k| k % 2 == 0));
    m.check_invariants().unwrap();
}

#[test]
fn double_remove_is_rejected() {
    let mut m = sample();
    let mut cur = m.cursor();
    assert_eq!(cur.remove(&mut m), Err(MapError::NoCurrentEntry));
    cur.next(&m).unwrap();
    assert!(cur.remove(&mut m).is_ok());
    assert_eq!(cur.remove(&mut m), Err(MapError::NoCurrentEntry));
}

#[test]
fn exhausted_cursor_yields_none() {
    let m: ChainMap<u8, u8> = ChainMap::new();
    let mut cur = m.cursor();
    assert_eq!(cur.next(&m), Ok(None));
    assert_eq!(cur.next(&m), Ok(None));
}

#[test]
fn insertion_ordered_cursor_follows_order() {
    let mut m: ChainMap<&str, u8> =
        ChainMap::with_config(MapConfig::default().with_order(OrderMode::Insertion)).unwrap();
    for k in ["z", "y", "x"] {
        m.insert(k, 0);
    }
    let mut cur = m.cursor();
    let mut out = Vec::new();
    while let Some((k, _)) = cur.next(&m).unwrap() {
        out.push(*k);
        if *k == "y" {
            cur.remove(&mut m).unwrap();
        }
    }
    assert_eq!(out, ["z", "y", "x"]);
    assert_eq!(m.keys().copied().collect::<Vec<_>>(), ["z", "x"]);
}
