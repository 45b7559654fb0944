//! # bst-rs
//!
//! An ordered map on a plain (unbalanced) binary search tree, with
//! bidirectional positions that step through the tree using parent links.
//!
//! Nodes are kept in a per-map slot arena. Each node owns its children through
//! the arena and remembers its parent as a non-owning index, so stepping to
//! the successor or predecessor needs no auxiliary stack. The tree never
//! rebalances: sorted insertion order produces a path of depth `n`. Copying
//! and tearing down the tree are iterative, so deep trees do not exhaust the
//! call stack.
//!
//! ## Example
//!
//! ```rust
//! use bst_rs::{BstMap, Error};
//!
//! let mut map: BstMap<i32, &str> = BstMap::new();
//! for (k, v) in [(5, "five"), (3, "three"), (7, "seven")] {
//!     map.insert(k, v);
//! }
//!
//! assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![3, 5, 7]);
//! assert_eq!(map.at(&4), Err(Error::NotFound));
//!
//! // Positions behave like bidirectional iterators.
//! let pos = map.find(&5);
//! assert_eq!(map.get_at(map.successor(pos)), Some((&7, &"seven")));
//! assert_eq!(map.predecessor(map.end()), map.find(&7));
//! ```
//!
//! ## Positions and removal
//!
//! Removing a node with two children moves its in-order successor's entry into
//! it and destroys the successor's node. A [`Position`] naming the removed
//! node then sees the successor's entry, while a position naming the
//! successor's old node becomes dangling.

#![forbid(unsafe_code)]

mod arena;
mod cursor;
mod error;
mod iter;
mod map;

#[cfg(feature = "serde")]
mod serde_impl;

pub use compare;
pub use cursor::{Cursor, CursorMut};
pub use error::{Error, Result};
pub use iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
pub use map::{BstMap, Position};

#[cfg(test)]
mod proptests;
