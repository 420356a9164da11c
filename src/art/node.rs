//! ART node types with adaptive sizing.
//!
//! An inner node picks one of four layouts for its byte edges based on how
//! many children it actually has:
//!
//! - Node4: up to 4 children (sorted parallel arrays)
//! - Node16: 5-16 children (sorted parallel arrays)
//! - Node48: 17-48 children (256-byte index + 48 slots)
//! - Node256: 49-256 children (direct array indexing)
//!
//! Nodes are only ever promoted. A key that ends exactly at an inner node hangs
//! off the node's terminal edge, which sorts below every byte edge; this plays
//! the role of the implicit end-of-key sentinel, so keys that are byte-prefixes
//! of each other stay distinct and ordered.

use smallvec::SmallVec;

/// Prefix bytes stored inline before spilling to the heap.
///
/// Stream keys are 16 bytes, so a full compressed run fits without allocating.
const PREFIX_INLINE: usize = 16;

/// The type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// A leaf node containing a key and value.
    Leaf,
    /// An inner node with up to 4 children.
    Node4,
    /// An inner node with 5-16 children.
    Node16,
    /// An inner node with 17-48 children.
    Node48,
    /// An inner node with 49-256 children.
    Node256,
}

/// A child edge of an inner node.
///
/// `End` is the edge for a key that terminates at the node. The derived
/// ordering puts it below every `Byte`, matching byte-lexicographic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Edge {
    /// The key ends at this node.
    End,
    /// The key continues with this byte.
    Byte(u8),
}

impl Edge {
    /// The edge a key follows after consuming `depth` bytes.
    #[inline]
    pub fn at(key: &[u8], depth: usize) -> Self {
        key.get(depth).map_or(Edge::End, |&b| Edge::Byte(b))
    }
}

/// A stored key and its value.
pub struct Leaf<V> {
    key: Box<[u8]>,
    value: V,
}

impl<V> Leaf<V> {
    pub(crate) fn new(key: &[u8], value: V) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// The complete key.
    #[inline]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The stored value.
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Full-key comparison. Path compression only guarantees that the
    /// subtree agrees on the consumed prefix, not that the whole key matches.
    #[inline]
    pub fn is_match(&self, key: &[u8]) -> bool {
        *self.key == *key
    }

    pub(crate) fn replace_value(&mut self, value: V) -> V {
        std::mem::replace(&mut self.value, value)
    }
}

/// A node in the tree: either a leaf or an inner (branching) node.
pub enum Node<V> {
    /// A leaf storing a key-value pair.
    Leaf(Box<Leaf<V>>),
    /// A branching node with a compressed prefix.
    Inner(Box<Inner<V>>),
}

impl<V> Node<V> {
    pub(crate) fn leaf(key: &[u8], value: V) -> Self {
        Node::Leaf(Box::new(Leaf::new(key, value)))
    }

    /// Get the node type.
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Leaf(_) => NodeType::Leaf,
            Node::Inner(inner) => inner.node_type(),
        }
    }

    /// Mutable access to the child behind `edge`, if this is an inner node
    /// that has one.
    pub(crate) fn child_mut(&mut self, edge: Edge) -> Option<&mut Node<V>> {
        match self {
            Node::Leaf(_) => None,
            Node::Inner(inner) => inner.child_mut(edge),
        }
    }
}

/// Byte-edge storage for an inner node, one variant per fan-out class.
pub(crate) enum Children<V> {
    Node4 {
        keys: [u8; 4],
        children: Vec<Node<V>>,
    },
    Node16 {
        keys: [u8; 16],
        children: Vec<Node<V>>,
    },
    Node48 {
        /// 0 = absent, otherwise slot + 1.
        index: Box<[u8; 256]>,
        children: Vec<Node<V>>,
    },
    Node256 {
        len: u16,
        children: Box<[Option<Node<V>>; 256]>,
    },
}

impl<V> Children<V> {
    fn new() -> Self {
        Children::Node4 {
            keys: [0; 4],
            children: Vec::with_capacity(4),
        }
    }

    fn node_type(&self) -> NodeType {
        match self {
            Children::Node4 { .. } => NodeType::Node4,
            Children::Node16 { .. } => NodeType::Node16,
            Children::Node48 { .. } => NodeType::Node48,
            Children::Node256 { .. } => NodeType::Node256,
        }
    }

    fn len(&self) -> usize {
        match self {
            Children::Node4 { children, .. }
            | Children::Node16 { children, .. }
            | Children::Node48 { children, .. } => children.len(),
            Children::Node256 { len, .. } => *len as usize,
        }
    }

    fn is_full(&self) -> bool {
        match self {
            Children::Node4 { children, .. } => children.len() >= 4,
            Children::Node16 { children, .. } => children.len() >= 16,
            Children::Node48 { children, .. } => children.len() >= 48,
            Children::Node256 { .. } => false,
        }
    }

    fn find(&self, byte: u8) -> Option<&Node<V>> {
        match self {
            Children::Node4 { keys, children } => keys[..children.len()]
                .iter()
                .position(|&k| k == byte)
                .map(|i| &children[i]),
            Children::Node16 { keys, children } => keys[..children.len()]
                .iter()
                .position(|&k| k == byte)
                .map(|i| &children[i]),
            Children::Node48 { index, children } => match index[byte as usize] {
                0 => None,
                slot => children.get(slot as usize - 1),
            },
            Children::Node256 { children, .. } => children[byte as usize].as_ref(),
        }
    }

    fn find_mut(&mut self, byte: u8) -> Option<&mut Node<V>> {
        match self {
            Children::Node4 { keys, children } => keys[..children.len()]
                .iter()
                .position(|&k| k == byte)
                .map(|i| &mut children[i]),
            Children::Node16 { keys, children } => keys[..children.len()]
                .iter()
                .position(|&k| k == byte)
                .map(|i| &mut children[i]),
            Children::Node48 { index, children } => match index[byte as usize] {
                0 => None,
                slot => children.get_mut(slot as usize - 1),
            },
            Children::Node256 { children, .. } => children[byte as usize].as_mut(),
        }
    }

    /// Smallest populated byte `>= min`. `min` may be 256, meaning none.
    fn ceil(&self, min: u16) -> Option<(u8, &Node<V>)> {
        match self {
            Children::Node4 { keys, children } => sorted_ceil(&keys[..children.len()], children, min),
            Children::Node16 { keys, children } => sorted_ceil(&keys[..children.len()], children, min),
            Children::Node48 { index, children } => (min as usize..256).find_map(|b| {
                match index[b] {
                    0 => None,
                    slot => children.get(slot as usize - 1).map(|c| (b as u8, c)),
                }
            }),
            Children::Node256 { children, .. } => (min as usize..256)
                .find_map(|b| children[b].as_ref().map(|c| (b as u8, c))),
        }
    }

    /// Largest populated byte `<= max`.
    fn floor(&self, max: u8) -> Option<(u8, &Node<V>)> {
        match self {
            Children::Node4 { keys, children } => sorted_floor(&keys[..children.len()], children, max),
            Children::Node16 { keys, children } => sorted_floor(&keys[..children.len()], children, max),
            Children::Node48 { index, children } => (0..=max as usize).rev().find_map(|b| {
                match index[b] {
                    0 => None,
                    slot => children.get(slot as usize - 1).map(|c| (b as u8, c)),
                }
            }),
            Children::Node256 { children, .. } => (0..=max as usize)
                .rev()
                .find_map(|b| children[b].as_ref().map(|c| (b as u8, c))),
        }
    }

    /// Insert a child; the caller has already grown the node if it was full.
    /// An existing edge for `byte` is replaced.
    fn insert(&mut self, byte: u8, child: Node<V>) {
        match self {
            Children::Node4 { keys, children } => sorted_insert(keys, children, byte, child),
            Children::Node16 { keys, children } => sorted_insert(keys, children, byte, child),
            Children::Node48 { index, children } => match index[byte as usize] {
                0 => {
                    children.push(child);
                    index[byte as usize] = children.len() as u8;
                }
                slot => children[slot as usize - 1] = child,
            },
            Children::Node256 { len, children } => {
                if children[byte as usize].is_none() {
                    *len += 1;
                }
                children[byte as usize] = Some(child);
            }
        }
    }

    /// Promote to the next larger layout.
    fn grow(&mut self) {
        let grown = match std::mem::replace(self, Children::new()) {
            Children::Node4 { keys, children } => {
                let mut wide = [0u8; 16];
                wide[..children.len()].copy_from_slice(&keys[..children.len()]);
                Children::Node16 {
                    keys: wide,
                    children,
                }
            }
            Children::Node16 { keys, children } => {
                let mut index = Box::new([0u8; 256]);
                for (slot, &byte) in keys[..children.len()].iter().enumerate() {
                    index[byte as usize] = slot as u8 + 1;
                }
                Children::Node48 { index, children }
            }
            Children::Node48 { index, children } => {
                let mut slots: Vec<Option<Node<V>>> = children.into_iter().map(Some).collect();
                let mut direct: Box<[Option<Node<V>>; 256]> =
                    Box::new(std::array::from_fn(|_| None));
                let mut len = 0u16;
                for (byte, &slot) in index.iter().enumerate() {
                    if slot != 0 {
                        direct[byte] = slots[slot as usize - 1].take();
                        len += 1;
                    }
                }
                Children::Node256 {
                    len,
                    children: direct,
                }
            }
            full @ Children::Node256 { .. } => full,
        };
        *self = grown;
    }
}

fn sorted_ceil<'a, V>(keys: &[u8], children: &'a [Node<V>], min: u16) -> Option<(u8, &'a Node<V>)> {
    keys.iter()
        .position(|&k| k as u16 >= min)
        .map(|i| (keys[i], &children[i]))
}

fn sorted_floor<'a, V>(keys: &[u8], children: &'a [Node<V>], max: u8) -> Option<(u8, &'a Node<V>)> {
    keys.iter()
        .rposition(|&k| k <= max)
        .map(|i| (keys[i], &children[i]))
}

fn sorted_insert<V, const N: usize>(
    keys: &mut [u8; N],
    children: &mut Vec<Node<V>>,
    byte: u8,
    child: Node<V>,
) {
    let len = children.len();
    let pos = keys[..len].iter().position(|&k| k >= byte).unwrap_or(len);
    if pos < len && keys[pos] == byte {
        children[pos] = child;
        return;
    }
    debug_assert!(len < N, "sorted node is full, should grow first");
    keys.copy_within(pos..len, pos + 1);
    keys[pos] = byte;
    children.insert(pos, child);
}

/// A branching node: a compressed prefix, an optional terminal edge and the
/// byte edges.
pub struct Inner<V> {
    prefix: SmallVec<[u8; PREFIX_INLINE]>,
    terminal: Option<Node<V>>,
    pub(crate) children: Children<V>,
}

impl<V> Inner<V> {
    pub(crate) fn new(prefix: &[u8]) -> Self {
        Self {
            prefix: SmallVec::from_slice(prefix),
            terminal: None,
            children: Children::new(),
        }
    }

    /// The compressed path prefix.
    #[inline]
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Get the node type (fan-out class).
    pub fn node_type(&self) -> NodeType {
        self.children.node_type()
    }

    /// Number of byte edges (the terminal edge is not counted).
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// The node stored under the terminal edge.
    pub fn terminal(&self) -> Option<&Node<V>> {
        self.terminal.as_ref()
    }

    /// Consume the node, returning its terminal child (if any) followed by
    /// the byte-edge children.
    pub(crate) fn into_children(self) -> Vec<Node<V>> {
        let mut out: Vec<Node<V>> = self.terminal.into_iter().collect();
        match self.children {
            Children::Node4 { children, .. }
            | Children::Node16 { children, .. }
            | Children::Node48 { children, .. } => out.extend(children),
            Children::Node256 { children, .. } => {
                let children: [Option<Node<V>>; 256] = *children;
                out.extend(children.into_iter().flatten());
            }
        }
        out
    }

    /// How many bytes of the prefix match `key` starting at `depth`.
    pub fn prefix_match_index(&self, key: &[u8], depth: usize) -> usize {
        let rest = key.get(depth..).unwrap_or_default();
        self.prefix
            .iter()
            .zip(rest)
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Drop the first `n` prefix bytes.
    pub(crate) fn strip_prefix(&mut self, n: usize) {
        self.prefix.drain(..n.min(self.prefix.len()));
    }

    /// Find the child for a key byte.
    pub fn find_child(&self, byte: u8) -> Option<&Node<V>> {
        self.children.find(byte)
    }

    /// The child behind `edge`.
    pub fn child(&self, edge: Edge) -> Option<&Node<V>> {
        match edge {
            Edge::End => self.terminal.as_ref(),
            Edge::Byte(b) => self.children.find(b),
        }
    }

    pub(crate) fn child_mut(&mut self, edge: Edge) -> Option<&mut Node<V>> {
        match edge {
            Edge::End => self.terminal.as_mut(),
            Edge::Byte(b) => self.children.find_mut(b),
        }
    }

    /// Add a byte edge, promoting the node first if it is at capacity.
    pub(crate) fn add_child(&mut self, byte: u8, child: Node<V>) {
        if self.children.find(byte).is_none() && self.children.is_full() {
            let from = self.children.node_type();
            self.children.grow();
            tracing::trace!(?from, to = ?self.children.node_type(), "promoted inner node");
        }
        self.children.insert(byte, child);
    }

    /// Attach `child` under `edge`.
    pub(crate) fn attach(&mut self, edge: Edge, child: Node<V>) {
        match edge {
            Edge::End => self.terminal = Some(child),
            Edge::Byte(b) => self.add_child(b, child),
        }
    }

    /// The smallest edge strictly after `after`; `None` starts from the
    /// beginning.
    pub fn next_edge(&self, after: Option<Edge>) -> Option<(Edge, &Node<V>)> {
        let min = match after {
            None => {
                if let Some(t) = &self.terminal {
                    return Some((Edge::End, t));
                }
                0
            }
            Some(Edge::End) => 0,
            Some(Edge::Byte(b)) => b as u16 + 1,
        };
        self.children.ceil(min).map(|(b, c)| (Edge::Byte(b), c))
    }

    /// The largest edge strictly before `before`; `None` starts from the end.
    pub fn prev_edge(&self, before: Option<Edge>) -> Option<(Edge, &Node<V>)> {
        let below = match before {
            None => self.children.floor(u8::MAX),
            Some(Edge::End) => return None,
            Some(Edge::Byte(0)) => None,
            Some(Edge::Byte(b)) => self.children.floor(b - 1),
        };
        below
            .map(|(b, c)| (Edge::Byte(b), c))
            .or_else(|| self.terminal.as_ref().map(|t| (Edge::End, t)))
    }

    /// All edges in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = (Edge, &Node<V>)> + '_ {
        let mut last = None;
        std::iter::from_fn(move || {
            let (edge, child) = self.next_edge(last)?;
            last = Some(edge);
            Some((edge, child))
        })
    }
}

impl<V> std::fmt::Debug for Node<V>
where
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Leaf(leaf) => f
                .debug_struct("Leaf")
                .field("key", &String::from_utf8_lossy(leaf.key()))
                .field("value", leaf.value())
                .finish(),
            Node::Inner(inner) => f
                .debug_struct("Inner")
                .field("type", &inner.node_type())
                .field("prefix", &String::from_utf8_lossy(inner.prefix()))
                .field("num_children", &inner.num_children())
                .field("terminal", &inner.terminal.is_some())
                .finish(),
        }
    }
}
