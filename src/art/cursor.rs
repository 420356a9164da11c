//! Bidirectional cursor over a [`Tree`].
//!
//! The cursor keeps the path from the root to its current leaf as a stack of
//! frames, one per inner node, each remembering which edge was taken. Moving
//! to a neighbour pops frames until one has an unvisited edge in the wanted
//! direction, then descends to the extreme leaf of that subtree. Nothing
//! points back up the tree.
//!
//! The borrow of the tree held by a cursor keeps it immutable while the
//! cursor is alive.

use super::node::{Edge, Inner, Leaf, Node};
use super::Tree;

/// One inner node on the path to the current position.
pub(crate) struct Frame<'a, V> {
    pub(crate) inner: &'a Inner<V>,
    /// The edge descended through; `None` before any edge is taken.
    pub(crate) edge: Option<Edge>,
}

/// A positioned, direction-aware walk over a tree.
///
/// A cursor yields `(key, value)` pairs. After every positioning operation
/// the next pair to be returned (if any) is already resolved, so
/// [`has_next`](Cursor::has_next) is exact.
pub struct Cursor<'a, V> {
    pub(crate) tree: &'a Tree<V>,
    pub(crate) frames: Vec<Frame<'a, V>>,
    pub(crate) next: Option<&'a Leaf<V>>,
    pub(crate) reverse: bool,
}

impl<'a, V> Cursor<'a, V> {
    pub(crate) fn new(tree: &'a Tree<V>, reverse: bool) -> Self {
        Self {
            tree,
            frames: Vec::new(),
            next: None,
            reverse,
        }
    }

    /// Whether another pair is available.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Whether the cursor is exhausted or unpositioned.
    #[inline]
    pub fn eof(&self) -> bool {
        self.next.is_none()
    }

    /// Whether the cursor walks in descending order.
    #[inline]
    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// The key that the next call to `next` would return.
    pub fn peek_key(&self) -> Option<&'a [u8]> {
        self.next.map(Leaf::key)
    }

    /// Position at the smallest key.
    pub fn seek_to_first(&mut self) {
        self.reset();
        if let Some(root) = self.tree.root() {
            self.descend_or_step(root, true);
        }
    }

    /// Position at the largest key.
    pub fn seek_to_last(&mut self) {
        self.reset();
        if let Some(root) = self.tree.root() {
            self.descend_or_step(root, false);
        }
    }

    /// Switch direction.
    ///
    /// The next pair returned is the neighbour, in the new direction, of the
    /// pair that was pending. So after a forward walk returned `apple` with
    /// `banana` pending, reversing yields `apple` again. An exhausted cursor
    /// stays exhausted until it is repositioned.
    pub fn reverse(&mut self) {
        self.reverse = !self.reverse;
        if self.next.is_some() {
            self.step(!self.reverse);
        }
    }

    /// Drop the current position.
    pub(crate) fn reset(&mut self) {
        self.frames.clear();
        self.next = None;
    }

    /// Follow the first (ascending) or last edge of each node down to a leaf.
    /// Returns false if a node without edges was reached.
    pub(crate) fn descend(&mut self, mut node: &'a Node<V>, ascending: bool) -> bool {
        loop {
            match node {
                Node::Leaf(leaf) => {
                    self.next = Some(leaf);
                    return true;
                }
                Node::Inner(inner) => {
                    let inner: &'a Inner<V> = inner;
                    let pick = if ascending {
                        inner.next_edge(None)
                    } else {
                        inner.prev_edge(None)
                    };
                    let Some((edge, child)) = pick else {
                        return false;
                    };
                    self.frames.push(Frame {
                        inner,
                        edge: Some(edge),
                    });
                    node = child;
                }
            }
        }
    }

    pub(crate) fn descend_or_step(&mut self, node: &'a Node<V>, ascending: bool) {
        if !self.descend(node, ascending) {
            self.step(ascending);
        }
    }

    /// Move to the neighbouring leaf of the current path.
    pub(crate) fn step(&mut self, ascending: bool) {
        self.next = None;
        while let Some(frame) = self.frames.last_mut() {
            let inner = frame.inner;
            let sibling = if ascending {
                inner.next_edge(frame.edge)
            } else {
                inner.prev_edge(frame.edge)
            };
            match sibling {
                Some((edge, child)) => {
                    frame.edge = Some(edge);
                    if self.descend(child, ascending) {
                        return;
                    }
                }
                None => {
                    self.frames.pop();
                }
            }
        }
    }
}

impl<'a, V> Iterator for Cursor<'a, V> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let leaf = self.next?;
        self.step(!self.reverse);
        Some((leaf.key(), leaf.value()))
    }
}

impl<V> std::fmt::Debug for Cursor<'_, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("next", &self.peek_key().map(String::from_utf8_lossy))
            .field("depth", &self.frames.len())
            .field("reverse", &self.reverse)
            .finish()
    }
}
