//! chain-map: a single-threaded, bucket-chained hash map whose crowded
//! buckets escalate to red-black trees, with an optional insertion- or
//! access-ordered view over all entries (and so, a bounded LRU cache).
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep worst-case lookups logarithmic under heavy collisions while
//!   staying a plain chained table in the common case.
//! - Layers:
//!   - `hashing`: hash once, fold to 32 bits, spread, mask.
//!   - `node`: one storage cell in a generational arena. Three structures
//!     thread through the same cells: the bucket chain, the tree of an
//!     escalated bucket, and the global order list.
//!   - `table::RawTable`: bucket heads, growth and the order-preserving
//!     split. `tree` adds the red-black operations on escalated buckets.
//!   - `order`: the order list and the `EvictionPolicy` hook.
//!   - `ChainMap<K, V, S, E>`: public API; hashes keys and drives the
//!     table through a single probe per operation.
//!   - `iter`: borrowing iterators and the fail-fast `Cursor`.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (the modification counter is shared
//!   through an `Rc`).
//! - No `unsafe`. Cells are addressed by `slotmap` keys, so a stale handle
//!   never aliases a reused slot.
//! - Bucket count is a power of two in `[1, 2^30]`; default 16.
//!
//! Escalation protocol
//! - A bucket reaching 8 cells becomes a tree, unless the table has fewer
//!   than 64 buckets, in which case the table doubles instead.
//! - A tree drops back to a chain when a removal would leave it with 6 or
//!   fewer cells, or when a split leaves a half that small.
//! - Tree order is spread hash, then arena identity of the cell. Identity
//!   gives every pair of cells a side, so shapes are deterministic for a
//!   given hasher and operation sequence, but not across hashers. Keys are
//!   never compared by their own ordering, so with the randomly seeded
//!   default hasher a tree's shape differs from run to run. Lookups and
//!   iteration order within a map are unaffected.
//!
//! Rehash invariants
//! - Each cell stores its spread hash and indexing always uses it; `K: Hash`
//!   is never invoked after insertion.
//! - Growth splits bucket `j` into `j` and `j + old_capacity`. Both halves
//!   keep their relative order, and the order list is never touched.
//!
//! Ordering and eviction
//! - `OrderMode::Insertion` iterates in first-insertion order; updates do
//!   not reorder. `OrderMode::Access` moves every successful read or update
//!   to the back, which counts as a structural change.
//! - After each insertion of a new key the eviction policy sees the eldest
//!   entry and the new length, and may drop that eldest entry.
//!
//! Fail-fast iteration
//! - Borrowing iterators hold the map borrow; the compiler rejects
//!   structural changes while they live.
//! - `Cursor` holds no borrow. It snapshots the modification count and
//!   fails with `MapError::ConcurrentModification` when the map changed
//!   behind it. Its own `remove` resynchronizes the snapshot and never
//!   reorders a bucket, so the walk continues where it was.
//!
//! Reentrancy policy
//! - Public entry points open a debug-only guard. User code (`Hash`, `Eq`,
//!   callbacks) that reaches back into the same map through a raw pointer
//!   panics with the names of both operations. Release builds carry no
//!   guard.
//!
//! Notes and non-goals
//! - No thread safety and no resistance to adversarial hashing beyond what
//!   the chosen `BuildHasher` gives.
//! - Nullable keys or values are modeled with `Option<K>` / `Option<V>`.

mod config;
mod error;
pub mod hashing;
mod iter;
mod map;
mod map_proptest;
mod node;
mod order;
#[cfg(feature = "serde")]
mod persisted;
mod reentrancy;
mod set;
mod table;
mod tree;

// Public surface
pub use config::MapConfig;
pub use error::{InvariantViolation, MapError};
pub use iter::{Cursor, Drain, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
pub use map::{ChainMap, LruCache};
pub use order::{EvictionPolicy, MaxEntries, NeverEvict, OrderMode};
pub use set::ChainSet;
pub use table::BinShape;

/// Default `BuildHasher`: fast, non-cryptographic and deterministic.
pub use hashbrown::hash_map::DefaultHashBuilder;
