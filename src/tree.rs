//! Red-black tree bins.
//!
//! An escalated bucket is a red-black tree ordered by spread hash, with
//! equal hashes ordered by cell identity (arena handle). Identity is a
//! strict total order, so insertion always finds a side; lookups of a key
//! whose hash matches a different cell probe both subtrees.
//!
//! Tree cells keep their chain links (`next` plus the tree facet's `prev`),
//! which lets the bin be iterated, split and de-escalated as a chain. After
//! a rebalance the topological root is moved to the front of the chain so
//! that the bucket head is the root; traversal-safe removals skip that step,
//! hence lookups always resolve the root by walking parents from the head.

use crate::error::InvariantViolation;
use crate::hashing::UNTREEIFY_THRESHOLD;
use crate::node::{CellKey, Links, TreeLinks};
use crate::table::{RawTable, Sublist};
use core::borrow::Borrow;

impl<K, V> RawTable<K, V> {
    #[inline]
    fn tl(&self, k: CellKey) -> &TreeLinks {
        self.cells[k].tree()
    }

    #[inline]
    fn tl_mut(&mut self, k: CellKey) -> &mut TreeLinks {
        self.cells[k].tree_mut()
    }

    #[inline]
    fn parent(&self, k: CellKey) -> Option<CellKey> {
        self.tl(k).parent
    }

    #[inline]
    fn left(&self, k: CellKey) -> Option<CellKey> {
        self.tl(k).left
    }

    #[inline]
    fn right(&self, k: CellKey) -> Option<CellKey> {
        self.tl(k).right
    }

    #[inline]
    fn is_red(&self, k: Option<CellKey>) -> bool {
        k.is_some_and(|k| self.tl(k).red)
    }

    #[inline]
    fn set_red(&mut self, k: CellKey, red: bool) {
        self.tl_mut(k).red = red;
    }

    pub(crate) fn root_of(&self, mut k: CellKey) -> CellKey {
        while let Some(p) = self.parent(k) {
            k = p;
        }
        k
    }

    /// Find the cell holding `q` in the tree rooted at `root`.
    pub(crate) fn tree_find<Q>(&self, root: CellKey, hash: u32, q: &Q) -> Option<CellKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut p = Some(root);
        while let Some(pk) = p {
            let node = &self.cells[pk];
            let t = node.tree();
            if node.hash > hash {
                p = t.left;
            } else if node.hash < hash {
                p = t.right;
            } else if node.key.borrow() == q {
                return Some(pk);
            } else {
                match (t.left, t.right) {
                    (None, r) => p = r,
                    (l, None) => p = l,
                    (Some(l), Some(r)) => {
                        if let Some(found) = self.tree_find(r, hash, q) {
                            return Some(found);
                        }
                        p = Some(l);
                    }
                }
            }
        }
        None
    }

    /// Leaf position for `x` under `root`: the parent and whether `x`
    /// becomes its left child.
    fn attach_point(&self, root: CellKey, x: CellKey) -> (CellKey, bool) {
        let h = self.cells[x].hash;
        let mut p = root;
        loop {
            let ph = self.cells[p].hash;
            let go_left = ph > h || (ph == h && x < p);
            let child = if go_left { self.left(p) } else { self.right(p) };
            match child {
                Some(c) => p = c,
                None => return (p, go_left),
            }
        }
    }

    /// Convert the chain in bucket `index` into a tree, in place.
    pub(crate) fn treeify(&mut self, index: usize) {
        let mut root: Option<CellKey> = None;
        let mut prev = None;
        let mut cur = self.buckets[index];
        let mut n = 0usize;
        while let Some(x) = cur {
            cur = self.cells[x].next;
            self.cells[x].links = Links::Tree(TreeLinks {
                prev,
                ..TreeLinks::default()
            });
            prev = Some(x);
            n += 1;
            root = Some(match root {
                None => x,
                Some(r) => {
                    let (xp, go_left) = self.attach_point(r, x);
                    self.tl_mut(x).parent = Some(xp);
                    if go_left {
                        self.tl_mut(xp).left = Some(x);
                    } else {
                        self.tl_mut(xp).right = Some(x);
                    }
                    self.balance_insertion(r, x)
                }
            });
        }
        if let Some(r) = root {
            self.set_red(r, false);
            self.move_root_to_front(index, r);
        }
        log::trace!("treeified bucket {} ({} cells)", index, n);
    }

    /// Turn the tree in bucket `index` back into a plain chain. Chain order
    /// is kept as is.
    pub(crate) fn untreeify(&mut self, index: usize) {
        let mut cur = self.buckets[index];
        let mut n = 0usize;
        while let Some(k) = cur {
            let node = &mut self.cells[k];
            node.links = Links::Plain;
            cur = node.next;
            n += 1;
        }
        log::trace!("untreeified bucket {} ({} cells)", index, n);
    }

    /// Link a freshly allocated tree cell `x` into the tree of bucket `index`.
    /// The new cell follows its tree parent in the chain.
    pub(crate) fn tree_insert(&mut self, index: usize, x: CellKey) {
        let Some(head) = self.buckets[index] else {
            return;
        };
        let root = self.root_of(head);
        let (xp, go_left) = self.attach_point(root, x);
        let xpn = self.cells[xp].next;
        if go_left {
            self.tl_mut(xp).left = Some(x);
        } else {
            self.tl_mut(xp).right = Some(x);
        }
        self.cells[xp].next = Some(x);
        *self.tl_mut(x) = TreeLinks {
            parent: Some(xp),
            prev: Some(xp),
            ..TreeLinks::default()
        };
        self.cells[x].next = xpn;
        if let Some(n) = xpn {
            self.tl_mut(n).prev = Some(x);
        }
        let root = self.balance_insertion(root, x);
        self.move_root_to_front(index, root);
    }

    /// Unlink tree cell `p` from the chain and the tree of bucket `index`.
    pub(crate) fn tree_remove(&mut self, index: usize, p: CellKey, movable: bool) {
        let succ = self.cells[p].next;
        let pred = self.tl(p).prev;
        match pred {
            None => self.buckets[index] = succ,
            Some(pr) => self.cells[pr].next = succ,
        }
        if let Some(s) = succ {
            self.tl_mut(s).prev = pred;
        }
        let Some(first) = self.buckets[index] else {
            return;
        };
        let mut root = self.root_of(first);

        let pl = self.left(p);
        let pr = self.right(p);
        let replacement = match (pl, pr) {
            (Some(pl), Some(pr)) => {
                // Swap p with its successor s by relinking.
                let mut s = pr;
                while let Some(sl) = self.left(s) {
                    s = sl;
                }
                let c = self.tl(s).red;
                let pc = self.tl(p).red;
                self.set_red(s, pc);
                self.set_red(p, c);
                let sr = self.right(s);
                let pp = self.parent(p);
                if s == pr {
                    self.tl_mut(p).parent = Some(s);
                    self.tl_mut(s).right = Some(p);
                } else {
                    let sp = self.parent(s);
                    self.tl_mut(p).parent = sp;
                    if let Some(sp) = sp {
                        if self.left(sp) == Some(s) {
                            self.tl_mut(sp).left = Some(p);
                        } else {
                            self.tl_mut(sp).right = Some(p);
                        }
                    }
                    self.tl_mut(s).right = Some(pr);
                    self.tl_mut(pr).parent = Some(s);
                }
                self.tl_mut(p).left = None;
                self.tl_mut(p).right = sr;
                if let Some(sr) = sr {
                    self.tl_mut(sr).parent = Some(p);
                }
                self.tl_mut(s).left = Some(pl);
                self.tl_mut(pl).parent = Some(s);
                self.tl_mut(s).parent = pp;
                match pp {
                    None => root = s,
                    Some(pp) => {
                        if self.left(pp) == Some(p) {
                            self.tl_mut(pp).left = Some(s);
                        } else {
                            self.tl_mut(pp).right = Some(s);
                        }
                    }
                }
                sr.unwrap_or(p)
            }
            (Some(pl), None) => pl,
            (None, Some(pr)) => pr,
            (None, None) => p,
        };

        if replacement != p {
            let pp = self.parent(p);
            self.tl_mut(replacement).parent = pp;
            match pp {
                None => root = replacement,
                Some(pp) => {
                    if self.left(pp) == Some(p) {
                        self.tl_mut(pp).left = Some(replacement);
                    } else {
                        self.tl_mut(pp).right = Some(replacement);
                    }
                }
            }
            let t = self.tl_mut(p);
            t.left = None;
            t.right = None;
            t.parent = None;
        }

        let r = if self.tl(p).red {
            root
        } else {
            self.balance_deletion(root, replacement)
        };

        if replacement == p {
            if let Some(pp) = self.tl_mut(p).parent.take() {
                if self.left(pp) == Some(p) {
                    self.tl_mut(pp).left = None;
                } else if self.right(pp) == Some(p) {
                    self.tl_mut(pp).right = None;
                }
            }
        }
        if r == p {
            // p was the only cell of the tree.
            return;
        }
        self.set_red(r, false);
        if movable {
            self.move_root_to_front(index, r);
        }
    }

    /// Make `root` the first cell of bucket `index`'s chain.
    fn move_root_to_front(&mut self, index: usize, root: CellKey) {
        let Some(first) = self.buckets[index] else {
            return;
        };
        if first == root {
            return;
        }
        self.buckets[index] = Some(root);
        let rn = self.cells[root].next;
        let rp = self.tl(root).prev;
        if let Some(rn) = rn {
            self.tl_mut(rn).prev = rp;
        }
        if let Some(rp) = rp {
            self.cells[rp].next = rn;
        }
        self.tl_mut(first).prev = Some(root);
        self.cells[root].next = Some(first);
        self.tl_mut(root).prev = None;
    }

    fn rotate_left(&mut self, mut root: CellKey, p: CellKey) -> CellKey {
        let Some(r) = self.right(p) else {
            return root;
        };
        let rl = self.left(r);
        self.tl_mut(p).right = rl;
        if let Some(rl) = rl {
            self.tl_mut(rl).parent = Some(p);
        }
        let pp = self.parent(p);
        self.tl_mut(r).parent = pp;
        match pp {
            None => {
                root = r;
                self.set_red(r, false);
            }
            Some(pp) => {
                if self.left(pp) == Some(p) {
                    self.tl_mut(pp).left = Some(r);
                } else {
                    self.tl_mut(pp).right = Some(r);
                }
            }
        }
        self.tl_mut(r).left = Some(p);
        self.tl_mut(p).parent = Some(r);
        root
    }

    fn rotate_right(&mut self, mut root: CellKey, p: CellKey) -> CellKey {
        let Some(l) = self.left(p) else {
            return root;
        };
        let lr = self.right(l);
        self.tl_mut(p).left = lr;
        if let Some(lr) = lr {
            self.tl_mut(lr).parent = Some(p);
        }
        let pp = self.parent(p);
        self.tl_mut(l).parent = pp;
        match pp {
            None => {
                root = l;
                self.set_red(l, false);
            }
            Some(pp) => {
                if self.right(pp) == Some(p) {
                    self.tl_mut(pp).right = Some(l);
                } else {
                    self.tl_mut(pp).left = Some(l);
                }
            }
        }
        self.tl_mut(l).right = Some(p);
        self.tl_mut(p).parent = Some(l);
        root
    }

    fn balance_insertion(&mut self, mut root: CellKey, mut x: CellKey) -> CellKey {
        self.set_red(x, true);
        loop {
            let Some(xp) = self.parent(x) else {
                self.set_red(x, false);
                return x;
            };
            if !self.tl(xp).red {
                return root;
            }
            let Some(xpp) = self.parent(xp) else {
                return root;
            };
            let xppl = self.left(xpp);
            if xppl == Some(xp) {
                match self.right(xpp) {
                    Some(u) if self.tl(u).red => {
                        self.set_red(u, false);
                        self.set_red(xp, false);
                        self.set_red(xpp, true);
                        x = xpp;
                    }
                    _ => {
                        let (mut xp_o, mut xpp_o) = (Some(xp), Some(xpp));
                        if self.right(xp) == Some(x) {
                            x = xp;
                            root = self.rotate_left(root, x);
                            xp_o = self.parent(x);
                            xpp_o = xp_o.and_then(|p| self.parent(p));
                        }
                        if let Some(xp) = xp_o {
                            self.set_red(xp, false);
                            if let Some(xpp) = xpp_o {
                                self.set_red(xpp, true);
                                root = self.rotate_right(root, xpp);
                            }
                        }
                    }
                }
            } else {
                match xppl {
                    Some(u) if self.tl(u).red => {
                        self.set_red(u, false);
                        self.set_red(xp, false);
                        self.set_red(xpp, true);
                        x = xpp;
                    }
                    _ => {
                        let (mut xp_o, mut xpp_o) = (Some(xp), Some(xpp));
                        if self.left(xp) == Some(x) {
                            x = xp;
                            root = self.rotate_right(root, x);
                            xp_o = self.parent(x);
                            xpp_o = xp_o.and_then(|p| self.parent(p));
                        }
                        if let Some(xp) = xp_o {
                            self.set_red(xp, false);
                            if let Some(xpp) = xpp_o {
                                self.set_red(xpp, true);
                                root = self.rotate_left(root, xpp);
                            }
                        }
                    }
                }
            }
        }
    }

    fn balance_deletion(&mut self, mut root: CellKey, mut x: CellKey) -> CellKey {
        loop {
            if x == root {
                return root;
            }
            let Some(mut xp) = self.parent(x) else {
                self.set_red(x, false);
                return x;
            };
            if self.tl(x).red {
                self.set_red(x, false);
                return root;
            }
            if self.left(xp) == Some(x) {
                let mut xpr = self.right(xp);
                if let Some(s) = xpr.filter(|&s| self.tl(s).red) {
                    self.set_red(s, false);
                    self.set_red(xp, true);
                    root = self.rotate_left(root, xp);
                    let Some(p) = self.parent(x) else {
                        return root;
                    };
                    xp = p;
                    xpr = self.right(xp);
                }
                let Some(mut s) = xpr else {
                    x = xp;
                    continue;
                };
                let sl = self.left(s);
                let sr = self.right(s);
                if !self.is_red(sr) && !self.is_red(sl) {
                    self.set_red(s, true);
                    x = xp;
                    continue;
                }
                let mut xp_o = Some(xp);
                let mut s_o = Some(s);
                if !self.is_red(sr) {
                    if let Some(sl) = sl {
                        self.set_red(sl, false);
                    }
                    self.set_red(s, true);
                    root = self.rotate_right(root, s);
                    xp_o = self.parent(x);
                    s_o = xp_o.and_then(|p| self.right(p));
                }
                if let Some(sib) = s_o {
                    s = sib;
                    let c = self.is_red(xp_o);
                    self.set_red(s, c);
                    if let Some(sr) = self.right(s) {
                        self.set_red(sr, false);
                    }
                }
                if let Some(p) = xp_o {
                    self.set_red(p, false);
                    root = self.rotate_left(root, p);
                }
                x = root;
            } else {
                let mut xpl = self.left(xp);
                if let Some(s) = xpl.filter(|&s| self.tl(s).red) {
                    self.set_red(s, false);
                    self.set_red(xp, true);
                    root = self.rotate_right(root, xp);
                    let Some(p) = self.parent(x) else {
                        return root;
                    };
                    xp = p;
                    xpl = self.left(xp);
                }
                let Some(mut s) = xpl else {
                    x = xp;
                    continue;
                };
                let sl = self.left(s);
                let sr = self.right(s);
                if !self.is_red(sl) && !self.is_red(sr) {
                    self.set_red(s, true);
                    x = xp;
                    continue;
                }
                let mut xp_o = Some(xp);
                let mut s_o = Some(s);
                if !self.is_red(sl) {
                    if let Some(sr) = sr {
                        self.set_red(sr, false);
                    }
                    self.set_red(s, true);
                    root = self.rotate_left(root, s);
                    xp_o = self.parent(x);
                    s_o = xp_o.and_then(|p| self.left(p));
                }
                if let Some(sib) = s_o {
                    s = sib;
                    let c = self.is_red(xp_o);
                    self.set_red(s, c);
                    if let Some(sl) = self.left(s) {
                        self.set_red(sl, false);
                    }
                }
                if let Some(p) = xp_o {
                    self.set_red(p, false);
                    root = self.rotate_right(root, p);
                }
                x = root;
            }
        }
    }

    /// Split the tree headed by `head` (old bucket `index`) over the new
    /// buckets `index` and `index + bit`, preserving chain order.
    pub(crate) fn split_tree(&mut self, head: CellKey, index: usize, bit: usize) {
        let mut lo = Sublist::default();
        let mut hi = Sublist::default();
        let mut cur = Some(head);
        while let Some(k) = cur {
            let node = &mut self.cells[k];
            cur = node.next.take();
            if node.hash as usize & bit == 0 {
                lo.push(&mut self.cells, k);
            } else {
                hi.push(&mut self.cells, k);
            }
        }
        let lo_only = hi.head.is_none();
        let hi_only = lo.head.is_none();
        self.place_split_half(lo, index, lo_only);
        self.place_split_half(hi, index + bit, hi_only);
    }

    fn place_split_half(&mut self, half: Sublist, index: usize, whole: bool) {
        let Some(h) = half.head else { return };
        self.buckets[index] = Some(h);
        if half.len <= UNTREEIFY_THRESHOLD {
            self.untreeify(index);
        } else if !whole {
            self.treeify(index);
        }
    }

    /// Check the tree bin at `index`; returns its cell count.
    pub(crate) fn check_tree(&self, index: usize) -> Result<usize, InvariantViolation> {
        let err = |m: &str| InvariantViolation::in_bucket(index, m);
        let head = self.buckets[index].ok_or_else(|| err("empty bucket checked as tree"))?;
        let mut chain = 0usize;
        let mut prev = None;
        let mut cur = Some(head);
        while let Some(k) = cur {
            let node = self.cells.get(k).ok_or_else(|| err("chain links a freed cell"))?;
            let Links::Tree(t) = &node.links else {
                return Err(err("plain cell inside a tree bin"));
            };
            if t.prev != prev {
                return Err(err("chain back link mismatch"));
            }
            if self.bucket_of(node.hash) != index {
                return Err(err("cell hash maps to another bucket"));
            }
            chain += 1;
            if chain > self.len() {
                return Err(err("chain contains a cycle"));
            }
            prev = Some(k);
            cur = node.next;
        }
        let root = self.root_of(head);
        if self.tl(root).red {
            return Err(err("root is red"));
        }
        let mut counted = 0usize;
        self.check_subtree(index, root, &mut counted)?;
        if counted != chain {
            return Err(err("tree and chain hold different cells"));
        }
        Ok(chain)
    }

    /// Returns the black height of the subtree at `k`.
    fn check_subtree(
        &self,
        index: usize,
        k: CellKey,
        counted: &mut usize,
    ) -> Result<usize, InvariantViolation> {
        let err = |m: &str| InvariantViolation::in_bucket(index, m);
        *counted += 1;
        if *counted > self.len() {
            return Err(err("tree contains a cycle"));
        }
        let t = self.tl(k);
        let h = self.cells[k].hash;
        let mut heights = [0usize; 2];
        for (slot, child) in [t.left, t.right].into_iter().enumerate() {
            let Some(c) = child else {
                heights[slot] = 1;
                continue;
            };
            let ct = self.tl(c);
            if ct.parent != Some(k) {
                return Err(err("child does not point back to its parent"));
            }
            let ch = self.cells[c].hash;
            if (slot == 0 && ch > h) || (slot == 1 && ch < h) {
                return Err(err("hash order violated"));
            }
            if t.red && ct.red {
                return Err(err("red cell with a red child"));
            }
            heights[slot] = self.check_subtree(index, c, counted)?;
        }
        if heights[0] != heights[1] {
            return Err(err("black height differs between subtrees"));
        }
        Ok(heights[0] + usize::from(!t.red))
    }
}
