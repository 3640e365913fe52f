#![cfg(feature = "serde")]

use chain_map::{ChainMap, MapConfig, OrderMode};

#[test]
fn round_trip_keeps_pairs_and_order() {
    let config = MapConfig::default().with_order(OrderMode::Insertion);
    let mut m: ChainMap<String, u32> = ChainMap::with_config(config).unwrap();
    for (i, k) in ["delta", "alpha", "charlie", "bravo"].into_iter().enumerate() {
        m.insert(k.to_string(), i as u32);
    }
    let json = serde_json::to_string(&m).unwrap();
    assert!(json.contains(r#""size":4"#));
    let back: ChainMap<String, u32> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, m);
    assert_eq!(back.order_mode(), OrderMode::Insertion);
    assert_eq!(
        back.keys().cloned().collect::<Vec<_>>(),
        ["delta", "alpha", "charlie", "bravo"]
    );
    back.check_invariants().unwrap();
}

#[test]
fn restored_capacity_follows_entry_count() {
    let mut m: ChainMap<u32, u32> = ChainMap::with_capacity(4096);
    m.extend((0..100).map(|i| (i, i)));
    let json = serde_json::to_string(&m).unwrap();
    let back: ChainMap<u32, u32> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.capacity(), 256);
    assert_eq!(back, m);
}

#[test]
fn missing_order_field_means_unordered() {
    let json = r#"{"capacity":16,"load_factor":0.75,"size":2,"entries":[[1,10],[2,20]]}"#;
    let m: ChainMap<u8, u8> = serde_json::from_str(json).unwrap();
    assert_eq!(m.order_mode(), OrderMode::Unordered);
    assert_eq!(m.peek(&2), Some(&20));
}

#[test]
fn bad_header_is_rejected() {
    let bad_lf = r#"{"capacity":16,"load_factor":0.0,"size":0,"entries":[]}"#;
    let err = serde_json::from_str::<ChainMap<u8, u8>>(bad_lf).unwrap_err();
    assert!(err.to_string().contains("load factor"));

    let bad_size = r#"{"capacity":16,"load_factor":0.75,"size":3,"entries":[[1,1]]}"#;
    let err = serde_json::from_str::<ChainMap<u8, u8>>(bad_size).unwrap_err();
    assert!(err.to_string().contains("size"));
}
