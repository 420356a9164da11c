//! Positioning a [`Cursor`] by key and comparison operator.
//!
//! All searches descend once from the root, pushing a frame for every inner
//! node passed. When the probe leaves the tree (a prefix mismatch or a
//! missing edge) the answer is either the extreme leaf of a nearby subtree or
//! the neighbour reached by stepping from the frames already pushed.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::cursor::{Cursor, Frame};
use super::node::{Edge, Node};
use crate::error::Error;

/// A seek operator.
///
/// Operators are interpreted in the cursor's presentation order: on a
/// reverse cursor `>=` means "at or after in descending order", which is
/// `<=` in key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeekOp {
    /// `=`: exact match only.
    Eq,
    /// `>=`: smallest key at or above the probe.
    Ge,
    /// `<=`: largest key at or below the probe.
    Le,
    /// `>`: smallest key strictly above the probe.
    Gt,
    /// `<`: largest key strictly below the probe.
    Lt,
    /// `^`: the first key in presentation order.
    Start,
    /// `$`: the last key in presentation order.
    End,
}

impl SeekOp {
    /// The operator with the same meaning in the opposite direction.
    pub fn mirror(self) -> Self {
        match self {
            SeekOp::Ge => SeekOp::Le,
            SeekOp::Le => SeekOp::Ge,
            SeekOp::Gt => SeekOp::Lt,
            SeekOp::Lt => SeekOp::Gt,
            SeekOp::Start => SeekOp::End,
            SeekOp::End => SeekOp::Start,
            SeekOp::Eq => SeekOp::Eq,
        }
    }

    /// The textual form of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            SeekOp::Eq => "=",
            SeekOp::Ge => ">=",
            SeekOp::Le => "<=",
            SeekOp::Gt => ">",
            SeekOp::Lt => "<",
            SeekOp::Start => "^",
            SeekOp::End => "$",
        }
    }
}

impl FromStr for SeekOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(SeekOp::Eq),
            ">=" => Ok(SeekOp::Ge),
            "<=" => Ok(SeekOp::Le),
            ">" => Ok(SeekOp::Gt),
            "<" => Ok(SeekOp::Lt),
            "^" => Ok(SeekOp::Start),
            "$" => Ok(SeekOp::End),
            other => Err(Error::Syntax(format!("unknown seek operator '{other}'"))),
        }
    }
}

impl fmt::Display for SeekOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'a, V> Cursor<'a, V> {
    /// Position at the first key not before `key` in presentation order.
    /// Returns whether a key was found.
    pub fn seek(&mut self, key: &[u8]) -> bool {
        self.seek_with_operation(key, SeekOp::Ge)
    }

    /// Position using `op`, interpreted in the cursor's current direction.
    /// Returns whether a key was found; on a miss the cursor is at EOF.
    pub fn seek_with_operation(&mut self, key: &[u8], op: SeekOp) -> bool {
        let op = if self.reverse { op.mirror() } else { op };
        self.position(key, op)
    }

    /// Switch to descending order and position at the largest key.
    pub fn seek_to_first_reverse(&mut self) {
        self.reverse = true;
        self.seek_to_last();
    }

    /// Switch to descending order and position at the smallest key, so only
    /// that key remains.
    pub fn seek_to_last_reverse(&mut self) {
        self.reverse = true;
        self.seek_to_first();
    }

    /// Switch to descending order and position at the largest key at or
    /// below `key`.
    pub fn seek_reverse(&mut self, key: &[u8]) -> bool {
        self.seek_with_operation_reverse(key, SeekOp::Ge)
    }

    /// Switch to descending order, then seek with `op` in that order.
    pub fn seek_with_operation_reverse(&mut self, key: &[u8], op: SeekOp) -> bool {
        self.reverse = true;
        self.seek_with_operation(key, op)
    }

    /// Smallest key `>= key`, regardless of direction.
    pub fn seek_ge(&mut self, key: &[u8]) -> bool {
        self.position(key, SeekOp::Ge)
    }

    /// Largest key `<= key`, regardless of direction.
    pub fn seek_le(&mut self, key: &[u8]) -> bool {
        self.position(key, SeekOp::Le)
    }

    /// Smallest key `> key`, regardless of direction.
    pub fn seek_gt(&mut self, key: &[u8]) -> bool {
        self.position(key, SeekOp::Gt)
    }

    /// Largest key `< key`, regardless of direction.
    pub fn seek_lt(&mut self, key: &[u8]) -> bool {
        self.position(key, SeekOp::Lt)
    }

    /// Position with `op` taken in key order.
    pub(crate) fn position(&mut self, key: &[u8], op: SeekOp) -> bool {
        match op {
            SeekOp::Start => self.seek_to_first(),
            SeekOp::End => self.seek_to_last(),
            SeekOp::Eq => self.seek_exact(key),
            SeekOp::Ge => self.seek_bound(key, true, true),
            SeekOp::Gt => self.seek_bound(key, true, false),
            SeekOp::Le => self.seek_bound(key, false, true),
            SeekOp::Lt => self.seek_bound(key, false, false),
        }
        if self.eof() {
            self.frames.clear();
            tracing::trace!(op = op.as_str(), key_len = key.len(), "seek missed");
        }
        self.has_next()
    }

    fn seek_exact(&mut self, key: &[u8]) {
        self.reset();
        let Some(mut node) = self.tree.root() else {
            return;
        };
        let mut depth = 0;
        loop {
            match node {
                Node::Leaf(leaf) => {
                    if leaf.is_match(key) {
                        self.next = Some(leaf);
                    }
                    return;
                }
                Node::Inner(inner) => {
                    let prefix_len = inner.prefix().len();
                    if inner.prefix_match_index(key, depth) < prefix_len {
                        return;
                    }
                    depth += prefix_len;
                    let edge = Edge::at(key, depth);
                    let Some(child) = inner.child(edge) else {
                        return;
                    };
                    self.frames.push(Frame {
                        inner,
                        edge: Some(edge),
                    });
                    node = child;
                    if edge != Edge::End {
                        depth += 1;
                    }
                }
            }
        }
    }

    /// Ceiling (`upward`) or floor search. `inclusive` admits an exact match.
    fn seek_bound(&mut self, key: &[u8], upward: bool, inclusive: bool) {
        self.reset();
        let Some(mut node) = self.tree.root() else {
            return;
        };
        let wanted = if upward {
            Ordering::Greater
        } else {
            Ordering::Less
        };
        let mut depth = 0;
        loop {
            match node {
                Node::Leaf(leaf) => {
                    let ord = leaf.key().cmp(key);
                    if ord == wanted || (inclusive && ord == Ordering::Equal) {
                        self.next = Some(leaf);
                    } else {
                        self.step(upward);
                    }
                    return;
                }
                Node::Inner(inner) => {
                    let prefix = inner.prefix();
                    let matched = inner.prefix_match_index(key, depth);
                    if matched < prefix.len() {
                        // Every key below shares the prefix, so the whole
                        // subtree is either above or below the probe.
                        let subtree_above = key
                            .get(depth + matched)
                            .map_or(true, |&b| prefix[matched] > b);
                        if subtree_above == upward {
                            self.descend_or_step(node, upward);
                        } else {
                            self.step(upward);
                        }
                        return;
                    }

                    depth += prefix.len();
                    let edge = Edge::at(key, depth);
                    if let Some(child) = inner.child(edge) {
                        self.frames.push(Frame {
                            inner,
                            edge: Some(edge),
                        });
                        node = child;
                        if edge != Edge::End {
                            depth += 1;
                        }
                        continue;
                    }

                    let neighbour = if upward {
                        inner.next_edge(Some(edge))
                    } else {
                        inner.prev_edge(Some(edge))
                    };
                    match neighbour {
                        Some((found, child)) => {
                            self.frames.push(Frame {
                                inner,
                                edge: Some(found),
                            });
                            self.descend_or_step(child, upward);
                        }
                        None => self.step(upward),
                    }
                    return;
                }
            }
        }
    }
}
