//! Storage cells.
//!
//! A cell lives in the map's generational arena and is addressed by a
//! [`CellKey`]. Three structures thread through the same cells:
//! - the bucket chain (`next`), present for every cell;
//! - the red-black tree of an escalated bucket (`Links::Tree`);
//! - the global order list (`before` / `after`), maintained only when the
//!   map has an ordering mode.
//!
//! Escalating a bucket flips each of its cells from `Links::Plain` to
//! `Links::Tree` in place, so handles stay valid across the transition.

use slotmap::new_key_type;

new_key_type! {
    /// Generational handle of one storage cell.
    pub(crate) struct CellKey;
}

/// Tree facet of a cell in an escalated bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TreeLinks {
    pub(crate) parent: Option<CellKey>,
    pub(crate) left: Option<CellKey>,
    pub(crate) right: Option<CellKey>,
    /// Chain predecessor, kept while treeified so the chain can be
    /// unlinked in O(1) and restored on de-escalation.
    pub(crate) prev: Option<CellKey>,
    pub(crate) red: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Links {
    Plain,
    Tree(TreeLinks),
}

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) hash: u32,
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) next: Option<CellKey>,
    pub(crate) before: Option<CellKey>,
    pub(crate) after: Option<CellKey>,
    pub(crate) links: Links,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(hash: u32, key: K, value: V, links: Links) -> Self {
        Self {
            hash,
            key,
            value,
            next: None,
            before: None,
            after: None,
            links,
        }
    }

    #[inline]
    pub(crate) fn is_tree(&self) -> bool {
        matches!(self.links, Links::Tree(_))
    }

    /// Tree facet. Only reachable through a tree bin, whose cells are
    /// all `Links::Tree`.
    #[inline]
    pub(crate) fn tree(&self) -> &TreeLinks {
        match &self.links {
            Links::Tree(t) => t,
            Links::Plain => unreachable!("plain cell reached through a tree bin"),
        }
    }

    #[inline]
    pub(crate) fn tree_mut(&mut self) -> &mut TreeLinks {
        match &mut self.links {
            Links::Tree(t) => t,
            Links::Plain => unreachable!("plain cell reached through a tree bin"),
        }
    }
}
