//! Hash spreading and bucket indexing.
//!
//! Keys are hashed once, on entry, with the map's `BuildHasher`. The 64-bit
//! result is folded to 32 bits and spread so the high half influences the
//! low bits that select a bucket. Cells store the spread hash; `K: Hash` is
//! never invoked again after insertion, including during resize.

use core::hash::{BuildHasher, Hash};

/// Bucket count used on first allocation when none was requested.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1 << 4;

/// Largest bucket count the table grows to.
pub const MAXIMUM_CAPACITY: usize = 1 << 30;

/// Load factor used when none is given.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Bin length at which a chain is escalated to a tree.
pub const TREEIFY_THRESHOLD: usize = 8;

/// Bin length at or below which a tree is de-escalated to a chain.
pub const UNTREEIFY_THRESHOLD: usize = 6;

/// Smallest table capacity at which bins may be escalated; below it the
/// table is grown instead.
pub const MIN_TREEIFY_CAPACITY: usize = 64;

/// Fold high bits into low bits: `h ^ (h >> 16)`.
#[inline]
pub fn spread(h: u32) -> u32 {
    h ^ (h >> 16)
}

/// Hash `q` with `hasher` and spread the result.
#[inline]
pub(crate) fn hash_key<Q, S>(hasher: &S, q: &Q) -> u32
where
    Q: ?Sized + Hash,
    S: BuildHasher,
{
    let raw = hasher.hash_one(q);
    spread((raw ^ (raw >> 32)) as u32)
}

/// Bucket index of `hash` in a table of `capacity` buckets.
///
/// `capacity` must be a power of two, which makes the mask equivalent to
/// `hash % capacity`.
#[inline]
pub fn bucket_index(hash: u32, capacity: usize) -> usize {
    debug_assert!(capacity.is_power_of_two());
    (hash as usize) & (capacity - 1)
}

/// Smallest power of two `>= cap`, clamped to `[1, MAXIMUM_CAPACITY]`.
pub fn table_size_for(cap: usize) -> usize {
    if cap >= MAXIMUM_CAPACITY {
        MAXIMUM_CAPACITY
    } else {
        cap.max(1).next_power_of_two()
    }
}

/// Threshold for `capacity` buckets: `capacity * load_factor`, saturated
/// once the table can no longer grow.
pub(crate) fn threshold_for(capacity: usize, load_factor: f32) -> usize {
    let ft = capacity as f64 * load_factor as f64;
    if capacity < MAXIMUM_CAPACITY && ft < MAXIMUM_CAPACITY as f64 {
        ft as usize
    } else {
        usize::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_folds_high_half() {
        assert_eq!(spread(0), 0);
        assert_eq!(spread(0x0001_0000), 0x0001_0001);
        // Low-only hashes pass through unchanged.
        assert_eq!(spread(0x0000_abcd), 0x0000_abcd);
    }

    #[test]
    fn index_is_masked_hash() {
        assert_eq!(bucket_index(17, 16), 1);
        assert_eq!(bucket_index(64, 64), 0);
        assert_eq!(bucket_index(u32::MAX, 1 << 30), (1 << 30) - 1);
    }

    #[test]
    fn table_size_rounds_up() {
        assert_eq!(table_size_for(0), 1);
        assert_eq!(table_size_for(1), 1);
        assert_eq!(table_size_for(17), 32);
        assert_eq!(table_size_for(64), 64);
        assert_eq!(table_size_for(usize::MAX), MAXIMUM_CAPACITY);
    }

    #[test]
    fn threshold_saturates_at_max() {
        assert_eq!(threshold_for(16, 0.75), 12);
        assert_eq!(threshold_for(2, 0.75), 1);
        assert_eq!(threshold_for(MAXIMUM_CAPACITY, 0.75), usize::MAX);
    }
}
