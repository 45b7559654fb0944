use std::cmp::Ordering;
use std::fmt;
use std::ops::Index;

use compare::{natural, Compare, Natural};
use log::{debug, trace};

use crate::arena::{Node, NodeArena, NodeRef};
use crate::cursor::{Cursor, CursorMut};
use crate::error::{Error, Result};
use crate::iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};

// =============================================================================
// Position
// =============================================================================

/// Non-owning handle to one entry of a [`BstMap`], or the end sentinel.
///
/// A position stays meaningful while its node is live. Erasing the node (or
/// clearing the map) leaves it dangling: lookups through a dangling position
/// return `None`, unless a later insert has reused the slot, in which case it
/// refers to the new entry.
///
/// Two positions are equal exactly when they name the same node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Position(pub(crate) NodeRef);

impl Position {
    /// One past the last entry. Never refers to a node.
    pub const END: Position = Position(NodeRef::NULL);

    #[inline]
    pub fn is_end(self) -> bool {
        self.0.is_null()
    }
}

// =============================================================================
// BstMap
// =============================================================================

/// An ordered map stored as an unbalanced binary search tree.
///
/// Keys are ordered by the comparator `C`, which defaults to the key's
/// [`Ord`] implementation. Nodes live in a per-map arena; every node records
/// its parent so that positions can step forwards and backwards without an
/// auxiliary stack.
///
/// The tree never rebalances. Lookups, inserts and removals cost O(height),
/// which is O(log n) for random insertion order and O(n) for sorted input.
pub struct BstMap<K, V, C = Natural<K>> {
    pub(crate) nodes: NodeArena<K, V>,
    pub(crate) root: NodeRef,
    pub(crate) count: usize,
    cmp: C,
}

impl<K: Ord, V> BstMap<K, V> {
    /// Empty map ordered by `K: Ord`.
    pub fn new() -> Self {
        Self::with_comparator(natural())
    }

    /// Empty map with room for `capacity` nodes before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, natural())
    }
}

impl<K: Ord, V> Default for BstMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> BstMap<K, V, C> {
    /// Empty map ordered by `cmp`.
    ///
    /// ```rust
    /// use bst_rs::BstMap;
    /// use compare::{natural, Compare};
    ///
    /// let mut map = BstMap::with_comparator(natural().rev());
    /// map.insert(1, "one");
    /// map.insert(2, "two");
    /// assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![2, 1]);
    /// ```
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_capacity_and_comparator(0, cmp)
    }

    pub fn with_capacity_and_comparator(capacity: usize, cmp: C) -> Self {
        Self {
            nodes: NodeArena::with_capacity(capacity),
            root: NodeRef::NULL,
            count: 0,
            cmp,
        }
    }

    #[inline]
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bytes reserved by the node arena.
    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity()
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
        debug!("shrink_to_fit: {} bytes reserved for {} nodes", self.memory_usage(), self.count);
    }

    /// Number of nodes on the longest root-to-leaf path. `0` when empty.
    pub fn height(&self) -> usize {
        let mut best = 0;
        let mut stack = Vec::new();
        if !self.root.is_null() {
            stack.push((self.root, 1usize));
        }
        while let Some((r, depth)) = stack.pop() {
            best = best.max(depth);
            let node = self.nodes.get(r);
            for child in [node.left, node.right] {
                if !child.is_null() {
                    stack.push((child, depth + 1));
                }
            }
        }
        best
    }

    // -------------------------------------------------------------------------
    // Positions
    // -------------------------------------------------------------------------

    /// Position of the smallest key, or [`Position::END`] when empty.
    pub fn begin(&self) -> Position {
        Position(self.nodes.leftmost(self.root))
    }

    #[inline]
    pub fn end(&self) -> Position {
        Position::END
    }

    /// Position of the largest key, or [`Position::END`] when empty.
    pub fn last(&self) -> Position {
        Position(self.nodes.rightmost(self.root))
    }

    /// Next position in key order. Stepping forward from the end stays at the
    /// end.
    pub fn successor(&self, pos: Position) -> Position {
        Position(self.nodes.successor(pos.0))
    }

    /// Previous position in key order. Stepping back from the end lands on
    /// the largest key; stepping back from the smallest key gives the end.
    pub fn predecessor(&self, pos: Position) -> Position {
        if pos.is_end() {
            return self.last();
        }
        Position(self.nodes.predecessor(pos.0))
    }

    pub fn get_at(&self, pos: Position) -> Option<(&K, &V)> {
        self.nodes.try_get(pos.0).map(|n| (&n.key, &n.value))
    }

    pub fn get_at_mut(&mut self, pos: Position) -> Option<(&K, &mut V)> {
        self.nodes.try_get_mut(pos.0).map(|n| (&n.key, &mut n.value))
    }

    pub fn cursor(&self, pos: Position) -> Cursor<'_, K, V, C> {
        Cursor::new(self, pos.0)
    }

    pub fn cursor_front(&self) -> Cursor<'_, K, V, C> {
        self.cursor(self.begin())
    }

    pub fn cursor_mut(&mut self, pos: Position) -> CursorMut<'_, K, V, C> {
        CursorMut::new(self, pos.0)
    }

    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, K, V, C> {
        let front = self.begin();
        self.cursor_mut(front)
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.get_at(self.begin())
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.get_at(self.last())
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Removes the entry at `pos` and returns it. The end position and
    /// dangling positions are ignored.
    ///
    /// When the node has two children, its in-order successor's entry moves
    /// into it and the successor's node is destroyed instead. `pos` then
    /// names the successor's entry.
    pub fn remove_at(&mut self, pos: Position) -> Option<(K, V)> {
        self.nodes.try_get(pos.0)?;
        Some(self.remove_node(pos.0))
    }

    pub(crate) fn remove_node(&mut self, x: NodeRef) -> (K, V) {
        let node = self.nodes.get(x);
        if node.child_count() < 2 {
            trace!("remove: splicing out node {:?} ({} children)", x, node.child_count());
            let removed = self.unlink(x);
            return (removed.key, removed.value);
        }

        // Leftmost of the right subtree has no left child, so it unlinks with
        // a plain splice.
        let succ = self.nodes.leftmost(node.right);
        trace!("remove: node {:?} has two children, successor {:?} takes its place", x, succ);
        self.nodes.swap_entries(x, succ);
        let removed = self.unlink(succ);
        (removed.key, removed.value)
    }

    /// Detaches a node with at most one child, splicing the child (if any)
    /// into its place.
    fn unlink(&mut self, x: NodeRef) -> Node<K, V> {
        let (parent, child) = self.nodes.splice_out(x);
        if parent.is_null() {
            self.root = child;
        }
        self.count -= 1;
        self.nodes.release(x)
    }

    /// Destroys every node, children before parents.
    pub fn clear(&mut self) {
        let released = self.count;
        let mut stack = Vec::new();
        if !self.root.is_null() {
            stack.push((self.root, false));
        }
        while let Some((r, expanded)) = stack.pop() {
            if expanded {
                drop(self.nodes.release(r));
                continue;
            }
            let node = self.nodes.get(r);
            stack.push((r, true));
            if !node.right.is_null() {
                stack.push((node.right, false));
            }
            if !node.left.is_null() {
                stack.push((node.left, false));
            }
        }
        self.nodes.reset();
        self.root = NodeRef::NULL;
        self.count = 0;
        debug!("clear: released {released} nodes");
    }

    /// Moves every entry into the returned map, leaving `self` empty with a
    /// copy of its comparator. Positions into `self` remain valid against the
    /// returned map.
    pub fn take(&mut self) -> Self
    where
        C: Clone,
    {
        let empty = Self::with_comparator(self.cmp.clone());
        std::mem::replace(self, empty)
    }

    // -------------------------------------------------------------------------
    // Iteration
    // -------------------------------------------------------------------------

    pub(crate) fn in_order(&self) -> Vec<NodeRef> {
        let mut order = Vec::with_capacity(self.count);
        let mut r = self.nodes.leftmost(self.root);
        while !r.is_null() {
            order.push(r);
            r = self.nodes.successor(r);
        }
        order
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.nodes, self.begin().0, self.last().0, self.count)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let order = self.in_order();
        IterMut::new(&mut self.nodes, order)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut::new(self.iter_mut())
    }
}

impl<K, V, C: Compare<K>> BstMap<K, V, C> {
    fn find_node(&self, key: &K) -> NodeRef {
        let mut cur = self.root;
        while !cur.is_null() {
            let node = self.nodes.get(cur);
            cur = match self.cmp.compare(key, &node.key) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return cur,
            };
        }
        NodeRef::NULL
    }

    /// Inserts `key` with `value`.
    ///
    /// If the key is already present its value is overwritten in place and
    /// `(existing, false)` is returned. Otherwise a new leaf is attached below
    /// the last node visited on the way down and `(new, true)` is returned.
    pub fn insert(&mut self, key: K, value: V) -> (Position, bool) {
        let mut parent = NodeRef::NULL;
        let mut went_left = false;
        let mut cur = self.root;
        while !cur.is_null() {
            let ord = self.cmp.compare(&key, &self.nodes.get(cur).key);
            parent = cur;
            match ord {
                Ordering::Less => {
                    went_left = true;
                    cur = self.nodes.get(cur).left;
                }
                Ordering::Greater => {
                    went_left = false;
                    cur = self.nodes.get(cur).right;
                }
                Ordering::Equal => {
                    self.nodes.get_mut(cur).value = value;
                    return (Position(cur), false);
                }
            }
        }

        let new = self.nodes.alloc(key, value, parent);
        if parent.is_null() {
            self.root = new;
        } else if went_left {
            self.nodes.get_mut(parent).left = new;
        } else {
            self.nodes.get_mut(parent).right = new;
        }
        self.count += 1;
        trace!("insert: new node {:?} under {:?}", new, parent);
        (Position(new), true)
    }

    /// Position of `key`, or [`Position::END`] when absent.
    pub fn find(&self, key: &K) -> Position {
        Position(self.find_node(key))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        !self.find_node(key).is_null()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.nodes.try_get(self.find_node(key)).map(|n| &n.value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let r = self.find_node(key);
        self.nodes.try_get_mut(r).map(|n| &mut n.value)
    }

    /// Checked lookup; never inserts.
    pub fn at(&self, key: &K) -> Result<&V> {
        self.get(key).ok_or(Error::NotFound)
    }

    pub fn at_mut(&mut self, key: &K) -> Result<&mut V> {
        self.get_mut(key).ok_or(Error::NotFound)
    }

    /// Index-style access: returns the value for `key`, inserting
    /// `V::default()` first if the key is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let mut r = self.find_node(&key);
        if r.is_null() {
            r = self.insert(key, V::default()).0 .0;
        }
        &mut self.nodes.get_mut(r).value
    }

    /// Removes `key`, returning the number of entries removed (0 or 1).
    pub fn erase(&mut self, key: &K) -> usize {
        usize::from(self.remove(key).is_some())
    }

    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let r = self.find_node(key);
        if r.is_null() {
            return None;
        }
        Some(self.remove_node(r))
    }
}

// =============================================================================
// Structural copy
// =============================================================================

/// Pre-order copy of the subtree at `root` into `dst` with an explicit work
/// list. Returns the new subtree root.
fn copy_tree<K: Clone, V: Clone>(
    src: &NodeArena<K, V>,
    root: NodeRef,
    dst: &mut NodeArena<K, V>,
) -> NodeRef {
    let mut new_root = NodeRef::NULL;
    // (source node, copied parent, attach as left child)
    let mut work = Vec::new();
    if !root.is_null() {
        work.push((root, NodeRef::NULL, false));
    }
    while let Some((s, parent, as_left)) = work.pop() {
        let node = src.get(s);
        let d = dst.alloc(node.key.clone(), node.value.clone(), parent);
        if parent.is_null() {
            new_root = d;
        } else if as_left {
            dst.get_mut(parent).left = d;
        } else {
            dst.get_mut(parent).right = d;
        }
        if !node.right.is_null() {
            work.push((node.right, d, false));
        }
        if !node.left.is_null() {
            work.push((node.left, d, true));
        }
    }
    new_root
}

impl<K: Clone, V: Clone, C: Clone> Clone for BstMap<K, V, C> {
    fn clone(&self) -> Self {
        let mut nodes = NodeArena::with_capacity(self.count);
        let root = copy_tree(&self.nodes, self.root, &mut nodes);
        debug!("clone: copied {} nodes", self.count);
        Self {
            nodes,
            root,
            count: self.count,
            cmp: self.cmp.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.clear();
        self.cmp.clone_from(&source.cmp);
        self.root = copy_tree(&source.nodes, source.root, &mut self.nodes);
        self.count = source.count;
        debug!("clone_from: copied {} nodes", self.count);
    }
}

// =============================================================================
// Trait impls
// =============================================================================

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for BstMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for BstMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C> Eq for BstMap<K, V, C> {}

impl<K, V, C: Compare<K>> Extend<(K, V)> for BstMap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for BstMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, C: Compare<K>> Index<&K> for BstMap<K, V, C> {
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is absent. Use [`BstMap::at`] for a checked lookup.
    fn index(&self, key: &K) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key not found"),
        }
    }
}

impl<'a, K, V, C> IntoIterator for &'a BstMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, C> IntoIterator for &'a mut BstMap<K, V, C> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V, C> IntoIterator for BstMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter::new(self.nodes, self.root, self.count)
    }
}

// =============================================================================
// Invariant checks
// =============================================================================

#[cfg(test)]
impl<K, V, C: Compare<K>> BstMap<K, V, C> {
    /// Panics unless parent links, key order and the stored count all agree
    /// with the reachable node graph.
    pub(crate) fn assert_invariants(&self) {
        let mut reachable = 0usize;
        let mut stack = Vec::new();
        if !self.root.is_null() {
            assert!(self.nodes.get(self.root).parent.is_null(), "root must have no parent");
            stack.push(self.root);
        }
        while let Some(r) = stack.pop() {
            reachable += 1;
            let node = self.nodes.get(r);
            if !node.left.is_null() {
                let left = self.nodes.get(node.left);
                assert_eq!(left.parent, r, "left child parent link");
                assert_eq!(self.cmp.compare(&left.key, &node.key), Ordering::Less);
                stack.push(node.left);
            }
            if !node.right.is_null() {
                let right = self.nodes.get(node.right);
                assert_eq!(right.parent, r, "right child parent link");
                assert_eq!(self.cmp.compare(&right.key, &node.key), Ordering::Greater);
                stack.push(node.right);
            }
        }
        assert_eq!(reachable, self.count, "stored count must match reachable nodes");

        // Local parent/child order is not enough for the whole-subtree
        // property; in-order keys must be strictly increasing.
        let order = self.in_order();
        assert_eq!(order.len(), self.count);
        for pair in order.windows(2) {
            let a = &self.nodes.get(pair[0]).key;
            let b = &self.nodes.get(pair[1]).key;
            assert_eq!(self.cmp.compare(a, b), Ordering::Less, "in-order keys must increase");
        }
    }
}
