//! Slot arena holding the tree's nodes.
//!
//! Nodes are addressed by [`NodeRef`], a 32-bit slot index. Child links are
//! owning in the sense that a node is only ever reachable through its parent's
//! `left`/`right` (or the tree's root). The `parent` link is a plain index used
//! for upward traversal and is never used to release a slot.

/// Index of a node slot, or [`NodeRef::NULL`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct NodeRef(u32);

impl NodeRef {
    pub(crate) const NULL: NodeRef = NodeRef(u32::MAX);

    #[inline]
    fn new(idx: usize) -> Self {
        assert!(idx < u32::MAX as usize, "node arena exhausted");
        Self(idx as u32)
    }

    #[inline]
    pub(crate) fn is_null(self) -> bool {
        self == Self::NULL
    }

    #[inline]
    fn idx(self) -> usize {
        debug_assert!(!self.is_null());
        self.0 as usize
    }
}

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) left: NodeRef,
    pub(crate) right: NodeRef,
    pub(crate) parent: NodeRef,
}

impl<K, V> Node<K, V> {
    #[inline]
    pub(crate) fn child_count(&self) -> usize {
        usize::from(!self.left.is_null()) + usize::from(!self.right.is_null())
    }
}

/// Node storage with a free list of released slots.
pub(crate) struct NodeArena<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<NodeRef>,
}

impl<K, V> NodeArena<K, V> {
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity() * std::mem::size_of::<Option<Node<K, V>>>()
            + self.free.capacity() * std::mem::size_of::<NodeRef>()
    }

    /// Drops trailing released slots, then shrinks both vectors.
    pub(crate) fn shrink_to_fit(&mut self) {
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        let live = self.slots.len();
        self.free.retain(|r| r.idx() < live);
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
    }

    pub(crate) fn alloc(&mut self, key: K, value: V, parent: NodeRef) -> NodeRef {
        let node = Node {
            key,
            value,
            left: NodeRef::NULL,
            right: NodeRef::NULL,
            parent,
        };
        if let Some(r) = self.free.pop() {
            debug_assert!(self.slots[r.idx()].is_none());
            self.slots[r.idx()] = Some(node);
            r
        } else {
            let r = NodeRef::new(self.slots.len());
            self.slots.push(Some(node));
            r
        }
    }

    /// Releases a live slot and hands back its node.
    pub(crate) fn release(&mut self, r: NodeRef) -> Node<K, V> {
        let node = self.slots[r.idx()]
            .take()
            .unwrap_or_else(|| panic!("release of dead node slot {}", r.0));
        self.free.push(r);
        node
    }

    /// Exchanges the key/value payloads of two distinct live nodes. Links stay
    /// where they are.
    pub(crate) fn swap_entries(&mut self, a: NodeRef, b: NodeRef) {
        assert_ne!(a, b, "swap_entries on a single node");
        let (lo, hi) = if a.idx() < b.idx() { (a, b) } else { (b, a) };
        let (head, tail) = self.slots.split_at_mut(hi.idx());
        let (Some(x), Some(y)) = (head[lo.idx()].as_mut(), tail[0].as_mut()) else {
            panic!("swap_entries on dead node slot");
        };
        std::mem::swap(&mut x.key, &mut y.key);
        std::mem::swap(&mut x.value, &mut y.value);
    }

    /// Detaches a node with at most one child by linking that child to the
    /// node's parent. Returns `(parent, child)`; when `parent` is `NULL` the
    /// caller owns the root update. The node's own links are left stale.
    pub(crate) fn splice_out(&mut self, x: NodeRef) -> (NodeRef, NodeRef) {
        let node = self.get(x);
        debug_assert!(node.child_count() < 2);
        let parent = node.parent;
        let child = if node.left.is_null() { node.right } else { node.left };

        if !child.is_null() {
            self.get_mut(child).parent = parent;
        }
        if !parent.is_null() {
            let p = self.get_mut(parent);
            if p.left == x {
                p.left = child;
            } else {
                debug_assert_eq!(p.right, x);
                p.right = child;
            }
        }
        (parent, child)
    }

    /// Forgets every slot at once. Callers that care about drop order release
    /// nodes individually first.
    pub(crate) fn reset(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    /// Looks up a slot that may have been released or never existed.
    #[inline]
    pub(crate) fn try_get(&self, r: NodeRef) -> Option<&Node<K, V>> {
        if r.is_null() {
            return None;
        }
        self.slots.get(r.idx()).and_then(Option::as_ref)
    }

    #[inline]
    pub(crate) fn try_get_mut(&mut self, r: NodeRef) -> Option<&mut Node<K, V>> {
        if r.is_null() {
            return None;
        }
        self.slots.get_mut(r.idx()).and_then(Option::as_mut)
    }

    #[inline]
    pub(crate) fn get(&self, r: NodeRef) -> &Node<K, V> {
        match self.try_get(r) {
            Some(node) => node,
            None => panic!("dangling node reference {}", r.0),
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, r: NodeRef) -> &mut Node<K, V> {
        match self.try_get_mut(r) {
            Some(node) => node,
            None => panic!("dangling node reference {}", r.0),
        }
    }

    /// Live nodes as mutable key/value borrows indexed by slot. Lets callers
    /// hand out disjoint `&mut V` in any order they computed beforehand.
    pub(crate) fn entries_mut(&mut self) -> Vec<Option<(&K, &mut V)>> {
        self.slots
            .iter_mut()
            .map(|slot| slot.as_mut().map(|n| (&n.key, &mut n.value)))
            .collect()
    }

    #[inline]
    pub(crate) fn slot_index(r: NodeRef) -> usize {
        r.idx()
    }

    // -------------------------------------------------------------------------
    // Link traversal
    // -------------------------------------------------------------------------

    /// Leftmost descendant of `r` (inclusive).
    pub(crate) fn leftmost(&self, mut r: NodeRef) -> NodeRef {
        if r.is_null() {
            return r;
        }
        loop {
            let left = self.get(r).left;
            if left.is_null() {
                return r;
            }
            r = left;
        }
    }

    /// Rightmost descendant of `r` (inclusive).
    pub(crate) fn rightmost(&self, mut r: NodeRef) -> NodeRef {
        if r.is_null() {
            return r;
        }
        loop {
            let right = self.get(r).right;
            if right.is_null() {
                return r;
            }
            r = right;
        }
    }

    /// In-order successor using only child and parent links.
    pub(crate) fn successor(&self, r: NodeRef) -> NodeRef {
        let Some(node) = self.try_get(r) else {
            return NodeRef::NULL;
        };
        if !node.right.is_null() {
            return self.leftmost(node.right);
        }
        let mut cur = r;
        let mut parent = node.parent;
        while !parent.is_null() && self.get(parent).right == cur {
            cur = parent;
            parent = self.get(parent).parent;
        }
        parent
    }

    /// In-order predecessor, the mirror image of [`Self::successor`].
    pub(crate) fn predecessor(&self, r: NodeRef) -> NodeRef {
        let Some(node) = self.try_get(r) else {
            return NodeRef::NULL;
        };
        if !node.left.is_null() {
            return self.rightmost(node.left);
        }
        let mut cur = r;
        let mut parent = node.parent;
        while !parent.is_null() && self.get(parent).left == cur {
            cur = parent;
            parent = self.get(parent).parent;
        }
        parent
    }
}
