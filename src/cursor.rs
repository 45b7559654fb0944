//! Cursors: a [`Position`] paired with a borrow of its map.
//!
//! A cursor sits on one entry or on the end sentinel. `move_next` from the
//! end stays at the end; `move_prev` from the end lands on the largest key,
//! which is what reverse traversal starting at `end()` needs.

use std::fmt;

use crate::arena::NodeRef;
use crate::map::{BstMap, Position};

pub struct Cursor<'a, K, V, C> {
    map: &'a BstMap<K, V, C>,
    current: NodeRef,
}

impl<'a, K, V, C> Cursor<'a, K, V, C> {
    pub(crate) fn new(map: &'a BstMap<K, V, C>, current: NodeRef) -> Self {
        Self { map, current }
    }

    #[inline]
    pub fn position(&self) -> Position {
        Position(self.current)
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.current.is_null()
    }

    /// `None` at the end or on a dangling position.
    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        self.map.nodes.try_get(self.current).map(|n| (&n.key, &n.value))
    }

    pub fn key(&self) -> Option<&'a K> {
        self.key_value().map(|(k, _)| k)
    }

    pub fn value(&self) -> Option<&'a V> {
        self.key_value().map(|(_, v)| v)
    }

    pub fn move_next(&mut self) {
        self.current = self.map.successor(self.position()).0;
    }

    pub fn move_prev(&mut self) {
        self.current = self.map.predecessor(self.position()).0;
    }
}

impl<K, V, C> Clone for Cursor<'_, K, V, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, C> Copy for Cursor<'_, K, V, C> {}

impl<K, V, C> PartialEq for Cursor<'_, K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

impl<K, V, C> Eq for Cursor<'_, K, V, C> {}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for Cursor<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.key_value()).finish()
    }
}

/// Cursor with write access to values and the ability to remove entries.
pub struct CursorMut<'a, K, V, C> {
    map: &'a mut BstMap<K, V, C>,
    current: NodeRef,
}

impl<'a, K, V, C> CursorMut<'a, K, V, C> {
    pub(crate) fn new(map: &'a mut BstMap<K, V, C>, current: NodeRef) -> Self {
        Self { map, current }
    }

    #[inline]
    pub fn position(&self) -> Position {
        Position(self.current)
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.current.is_null()
    }

    pub fn key(&self) -> Option<&K> {
        self.map.nodes.try_get(self.current).map(|n| &n.key)
    }

    pub fn value(&self) -> Option<&V> {
        self.map.nodes.try_get(self.current).map(|n| &n.value)
    }

    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.map.nodes.try_get_mut(self.current).map(|n| &mut n.value)
    }

    pub fn key_value_mut(&mut self) -> Option<(&K, &mut V)> {
        self.map
            .nodes
            .try_get_mut(self.current)
            .map(|n| (&n.key, &mut n.value))
    }

    pub fn move_next(&mut self) {
        self.current = self.map.successor(self.position()).0;
    }

    pub fn move_prev(&mut self) {
        self.current = self.map.predecessor(self.position()).0;
    }

    /// Read-only view at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, K, V, C> {
        Cursor::new(self.map, self.current)
    }

    /// Removes the current entry and moves to the entry that followed it.
    /// Does nothing at the end.
    ///
    /// A node with two children keeps its slot and receives its successor's
    /// entry, so the cursor stays put; otherwise it advances to the successor.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        let node = self.map.nodes.try_get(self.current)?;
        let next = if node.child_count() == 2 {
            self.current
        } else {
            self.map.nodes.successor(self.current)
        };
        let removed = self.map.remove_node(self.current);
        self.current = next;
        Some(removed)
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for CursorMut<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut")
            .field(&self.as_cursor().key_value())
            .finish()
    }
}
