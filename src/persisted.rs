//! Byte-stream form of a map (`serde` feature).
//!
//! A map is written as its bucket count, load factor, entry count and the
//! entries in map order, plus the ordering mode. Reading validates the
//! header, sizes a fresh table for the entry count (the written bucket
//! count is advisory) and reinserts the entries in the order read, without
//! consulting the eviction policy.

use crate::config::MapConfig;
use crate::hashing::{hash_key, table_size_for, DEFAULT_INITIAL_CAPACITY, MAXIMUM_CAPACITY};
use crate::map::ChainMap;
use crate::order::{EvictionPolicy, OrderMode};
use crate::table::{Probe, RawTable};
use core::hash::{BuildHasher, Hash};
use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

impl<K, V, S, E> Serialize for ChainMap<K, V, S, E>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let mut st = serializer.serialize_struct("ChainMap", 5)?;
        st.serialize_field("capacity", &self.capacity())?;
        st.serialize_field("load_factor", &self.load_factor())?;
        st.serialize_field("size", &self.len())?;
        st.serialize_field("order", &self.order_mode())?;
        st.serialize_field("entries", &Entries(self))?;
        st.end()
    }
}

struct Entries<'a, K, V, S, E>(&'a ChainMap<K, V, S, E>);

impl<K: Serialize, V: Serialize, S, E> Serialize for Entries<'_, K, V, S, E> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "K: Deserialize<'de>, V: Deserialize<'de>"))]
struct Persisted<K, V> {
    capacity: usize,
    load_factor: f32,
    size: usize,
    #[serde(default)]
    order: OrderMode,
    entries: Vec<(K, V)>,
}

/// Bucket count for `size` entries at `load_factor`, clamped to
/// `[16, 2^30]`.
fn capacity_for(size: usize, load_factor: f32) -> usize {
    let fc = size as f64 / load_factor as f64 + 1.0;
    if fc < DEFAULT_INITIAL_CAPACITY as f64 {
        DEFAULT_INITIAL_CAPACITY
    } else if fc >= MAXIMUM_CAPACITY as f64 {
        MAXIMUM_CAPACITY
    } else {
        table_size_for(fc as usize)
    }
}

impl<'de, K, V, S, E> Deserialize<'de> for ChainMap<K, V, S, E>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
    E: EvictionPolicy<K, V> + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let p = Persisted::<K, V>::deserialize(deserializer)?;
        let config = MapConfig::default()
            .with_load_factor(p.load_factor)
            .with_order(p.order);
        config.validate().map_err(D::Error::custom)?;
        if p.size != p.entries.len() {
            return Err(D::Error::custom(format!(
                "size field says {} entries, found {}",
                p.size,
                p.entries.len()
            )));
        }
        let capacity = capacity_for(p.size, p.load_factor);
        log::debug!(
            "restoring {} entries into {} buckets (written with {})",
            p.size,
            capacity,
            p.capacity
        );
        let hasher = S::default();
        let mut raw = RawTable::new(Some(capacity), p.load_factor, p.order);
        for (key, value) in p.entries {
            let hash = hash_key(&hasher, &key);
            match raw.probe(hash, &key) {
                Probe::Found(k) => raw.cells[k].value = value,
                Probe::Vacant(slot) => {
                    raw.link_new(slot, hash, key, value);
                }
            }
        }
        Ok(ChainMap::from_parts(raw, hasher, E::default()))
    }
}
