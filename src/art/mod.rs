//! Adaptive Radix Tree (ART) keyed by byte strings.
//!
//! Based on "The Adaptive Radix Tree: ARTful Indexing for Main-Memory Databases"
//! by Leis et al., 2013.
//!
//! Key features:
//! - Adaptive node sizes (4, 16, 48, 256 children), promoted on demand
//! - Path compression for common prefixes
//! - Ordered traversal in both directions through [`Cursor`]
//! - Positioning by comparison operator ([`SeekOp`])
//!
//! Entries are never removed; nodes only grow.

mod cursor;
mod debug;
mod node;
mod seek;

pub use cursor::Cursor;
pub use node::{Edge, Inner, Leaf, Node, NodeType};
pub use seek::SeekOp;

/// Node-population statistics for the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Number of leaf nodes
    pub leaf_count: usize,
    /// Number of Node4 instances
    pub node4_count: usize,
    /// Number of Node16 instances
    pub node16_count: usize,
    /// Number of Node48 instances
    pub node48_count: usize,
    /// Number of Node256 instances
    pub node256_count: usize,
    /// Bytes held in compressed prefixes
    pub prefix_bytes: usize,
    /// Bytes held in leaf keys
    pub key_bytes: usize,
    /// Deepest leaf, counted in nodes from the root
    pub max_depth: usize,
}

impl TreeStats {
    /// Total number of inner nodes.
    pub fn inner_count(&self) -> usize {
        self.node4_count + self.node16_count + self.node48_count + self.node256_count
    }
}

/// An ordered map from byte-string keys to values.
pub struct Tree<V> {
    root: Option<Node<V>>,
    len: usize,
}

impl<V> Default for Tree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Tree<V> {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn root(&self) -> Option<&Node<V>> {
        self.root.as_ref()
    }

    /// Insert a key-value pair. Inserting an existing key overwrites its
    /// value and returns the previous one.
    pub fn insert(&mut self, key: &[u8], value: V) -> Option<V> {
        let root = match &mut self.root {
            Some(root) => root,
            slot @ None => {
                *slot = Some(Node::leaf(key, value));
                self.len = 1;
                return None;
            }
        };

        let mut node = root;
        let mut depth = 0;
        while let Some((edge, next_depth)) = Self::descent_step(node, key, depth) {
            // The step is only taken when the edge exists.
            node = node.child_mut(edge)?;
            depth = next_depth;
        }

        let replaced = Self::insert_at(node, key, depth, value);
        if replaced.is_none() {
            self.len += 1;
        }
        replaced
    }

    /// The edge to follow from `node` and the depth below it, if the path
    /// matches and that edge already exists.
    fn descent_step(node: &Node<V>, key: &[u8], depth: usize) -> Option<(Edge, usize)> {
        let Node::Inner(inner) = node else {
            return None;
        };
        let prefix_len = inner.prefix().len();
        if inner.prefix_match_index(key, depth) < prefix_len {
            return None;
        }
        let edge = Edge::at(key, depth + prefix_len);
        let next_depth = match edge {
            Edge::End => depth + prefix_len,
            Edge::Byte(_) => depth + prefix_len + 1,
        };
        inner.child(edge).map(|_| (edge, next_depth))
    }

    /// Place `key` at `node`, where the descent from the root stopped.
    fn insert_at(node: &mut Node<V>, key: &[u8], depth: usize, value: V) -> Option<V> {
        match node {
            Node::Leaf(leaf) => {
                if leaf.is_match(key) {
                    return Some(leaf.replace_value(value));
                }

                let existing_rest = leaf.key().get(depth..).unwrap_or_default();
                let new_rest = key.get(depth..).unwrap_or_default();
                let common = existing_rest
                    .iter()
                    .zip(new_rest)
                    .take_while(|(a, b)| a == b)
                    .count();
                let split = depth + common;
                let existing_edge = Edge::at(leaf.key(), split);

                let parent = Inner::new(&new_rest[..common]);
                let old = std::mem::replace(node, Node::Inner(Box::new(parent)));
                if let Node::Inner(parent) = node {
                    parent.attach(existing_edge, old);
                    parent.attach(Edge::at(key, split), Node::leaf(key, value));
                }
                None
            }
            Node::Inner(inner) => {
                let prefix_len = inner.prefix().len();
                let matched = inner.prefix_match_index(key, depth);

                if matched < prefix_len {
                    // Split the compressed prefix at the first mismatch.
                    let parent = Inner::new(&inner.prefix()[..matched]);
                    let old_byte = inner.prefix()[matched];
                    inner.strip_prefix(matched + 1);
                    let old = std::mem::replace(node, Node::Inner(Box::new(parent)));
                    if let Node::Inner(parent) = node {
                        parent.add_child(old_byte, old);
                        parent.attach(Edge::at(key, depth + matched), Node::leaf(key, value));
                    }
                    return None;
                }

                inner.attach(Edge::at(key, depth + prefix_len), Node::leaf(key, value));
                None
            }
        }
    }

    /// Look up a key.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let mut node = self.root.as_ref()?;
        let mut depth = 0;
        loop {
            match node {
                Node::Leaf(leaf) => {
                    return leaf.is_match(key).then(|| leaf.value());
                }
                Node::Inner(inner) => {
                    let prefix_len = inner.prefix().len();
                    if inner.prefix_match_index(key, depth) < prefix_len {
                        return None;
                    }
                    depth += prefix_len;
                    let edge = Edge::at(key, depth);
                    node = inner.child(edge)?;
                    if edge != Edge::End {
                        depth += 1;
                    }
                }
            }
        }
    }

    /// Check if a key exists.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Iterate in ascending key order.
    pub fn iter(&self) -> Cursor<'_, V> {
        let mut cursor = Cursor::new(self, false);
        cursor.seek_to_first();
        cursor
    }

    /// Iterate in descending key order.
    pub fn reverse_iter(&self) -> Cursor<'_, V> {
        let mut cursor = Cursor::new(self, true);
        cursor.seek_to_last();
        cursor
    }

    /// An unpositioned cursor. Call one of the seek methods before iterating.
    pub fn cursor(&self) -> Cursor<'_, V> {
        Cursor::new(self, false)
    }

    /// Smallest key and its value.
    pub fn first(&self) -> Option<(&[u8], &V)> {
        self.iter().next()
    }

    /// Largest key and its value.
    pub fn last(&self) -> Option<(&[u8], &V)> {
        self.reverse_iter().next()
    }

    /// Walk the tree and count nodes by type.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        let mut stack: Vec<(&Node<V>, usize)> = self.root.iter().map(|n| (n, 1)).collect();
        while let Some((node, level)) = stack.pop() {
            match node {
                Node::Leaf(leaf) => {
                    stats.leaf_count += 1;
                    stats.key_bytes += leaf.key().len();
                    stats.max_depth = stats.max_depth.max(level);
                }
                Node::Inner(inner) => {
                    match inner.node_type() {
                        NodeType::Node4 => stats.node4_count += 1,
                        NodeType::Node16 => stats.node16_count += 1,
                        NodeType::Node48 => stats.node48_count += 1,
                        NodeType::Node256 => stats.node256_count += 1,
                        NodeType::Leaf => {}
                    }
                    stats.prefix_bytes += inner.prefix().len();
                    stack.extend(inner.edges().map(|(_, child)| (child, level + 1)));
                }
            }
        }
        stats
    }
}

impl<V> Drop for Tree<V> {
    fn drop(&mut self) {
        // Unlink nodes onto a heap stack so teardown depth does not follow key length.
        let mut stack: Vec<Node<V>> = self.root.take().into_iter().collect();
        while let Some(node) = stack.pop() {
            if let Node::Inner(inner) = node {
                stack.extend((*inner).into_children());
            }
        }
    }
}

impl<'a, V> IntoIterator for &'a Tree<V> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = Cursor<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V, K: AsRef<[u8]>> FromIterator<(K, V)> for Tree<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Tree::new();
        for (key, value) in iter {
            tree.insert(key.as_ref(), value);
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<V>(tree: &Tree<V>) -> Vec<Vec<u8>> {
        tree.iter().map(|(k, _)| k.to_vec()).collect()
    }

    #[test]
    fn test_insert_and_get() {
        let mut tree = Tree::new();
        assert!(tree.is_empty());

        assert_eq!(tree.insert(b"hello", 1), None);
        assert_eq!(tree.insert(b"world", 2), None);
        assert_eq!(tree.insert(b"help", 3), None);

        assert_eq!(tree.get(b"hello"), Some(&1));
        assert_eq!(tree.get(b"world"), Some(&2));
        assert_eq!(tree.get(b"help"), Some(&3));
        assert_eq!(tree.get(b"hel"), None);
        assert_eq!(tree.get(b"helpful"), None);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_duplicate_insert_overwrites() {
        let mut tree = Tree::new();
        tree.insert(b"key", 1);
        assert_eq!(tree.insert(b"key", 2), Some(1));
        assert_eq!(tree.get(b"key"), Some(&2));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_prefix_keys() {
        let mut tree = Tree::new();
        tree.insert(b"apple", 1);
        tree.insert(b"applesauce", 2);
        tree.insert(b"app", 3);
        tree.insert(b"", 4);

        assert_eq!(tree.get(b"apple"), Some(&1));
        assert_eq!(tree.get(b"applesauce"), Some(&2));
        assert_eq!(tree.get(b"app"), Some(&3));
        assert_eq!(tree.get(b""), Some(&4));
        assert_eq!(tree.get(b"appl"), None);
        assert_eq!(
            keys(&tree),
            vec![b"".to_vec(), b"app".to_vec(), b"apple".to_vec(), b"applesauce".to_vec()]
        );
    }

    #[test]
    fn test_keys_with_zero_bytes() {
        let mut tree = Tree::new();
        tree.insert(b"a\0b", 1);
        tree.insert(b"a", 2);
        tree.insert(b"a\0", 3);
        tree.insert(b"a\x01", 4);

        assert_eq!(
            keys(&tree),
            vec![b"a".to_vec(), b"a\0".to_vec(), b"a\0b".to_vec(), b"a\x01".to_vec()]
        );
        assert_eq!(tree.get(b"a\0"), Some(&3));
    }

    #[test]
    fn test_prefix_split() {
        let mut tree = Tree::new();
        tree.insert(b"romane", 1);
        tree.insert(b"romanus", 2);
        tree.insert(b"romulus", 3);
        tree.insert(b"rubens", 4);
        tree.insert(b"ruber", 5);
        tree.insert(b"rubicon", 6);
        tree.insert(b"rubicundus", 7);

        for (i, k) in [
            &b"romane"[..],
            b"romanus",
            b"romulus",
            b"rubens",
            b"ruber",
            b"rubicon",
            b"rubicundus",
        ]
        .iter()
        .enumerate()
        {
            assert_eq!(tree.get(k), Some(&(i + 1)));
        }
        assert_eq!(tree.get(b"rom"), None);
        assert_eq!(tree.get(b"rubic"), None);
    }

    #[test]
    fn test_iteration_order() {
        let mut tree = Tree::new();
        for k in ["elderberry", "banana", "date", "apple", "cherry"] {
            tree.insert(k.as_bytes(), k.len());
        }
        let forward: Vec<_> = tree
            .iter()
            .map(|(k, _)| String::from_utf8_lossy(k).into_owned())
            .collect();
        assert_eq!(forward, ["apple", "banana", "cherry", "date", "elderberry"]);

        let backward: Vec<_> = tree
            .reverse_iter()
            .map(|(k, _)| String::from_utf8_lossy(k).into_owned())
            .collect();
        assert_eq!(backward, ["elderberry", "date", "cherry", "banana", "apple"]);

        assert_eq!(tree.first().map(|(k, _)| k), Some(&b"apple"[..]));
        assert_eq!(tree.last().map(|(k, _)| k), Some(&b"elderberry"[..]));
    }

    #[test]
    fn test_promotion_through_all_sizes() {
        let mut tree = Tree::new();
        for b in 0u8..=255 {
            tree.insert(&[b'k', b], b as u32);
            let stats = tree.stats();
            let count = b as usize + 1;
            if count >= 2 {
                assert_eq!(stats.inner_count(), 1);
                let expected = match count {
                    2..=4 => (1, 0, 0, 0),
                    5..=16 => (0, 1, 0, 0),
                    17..=48 => (0, 0, 1, 0),
                    _ => (0, 0, 0, 1),
                };
                assert_eq!(
                    (stats.node4_count, stats.node16_count, stats.node48_count, stats.node256_count),
                    expected,
                    "{count} children"
                );
            }
        }
        for b in 0u8..=255 {
            assert_eq!(tree.get(&[b'k', b]), Some(&(b as u32)));
        }
        assert_eq!(tree.len(), 256);
        assert_eq!(keys(&tree), (0u8..=255).map(|b| vec![b'k', b]).collect::<Vec<_>>());
    }

    #[test]
    fn test_stats() {
        let tree: Tree<u32> = [("abc", 1), ("abd", 2), ("x", 3)].into_iter().collect();
        let stats = tree.stats();
        assert_eq!(stats.leaf_count, 3);
        assert_eq!(stats.node4_count, 2);
        assert_eq!(stats.prefix_bytes, 1);
        assert_eq!(stats.key_bytes, 7);
        assert_eq!(stats.max_depth, 3);
    }

    #[test]
    fn test_deep_chain_insert_seek_and_drop() {
        // Each key extends the previous one, so every insert adds a level.
        const DEPTH: usize = 12_000;
        let mut tree = Tree::new();
        for len in 1..=DEPTH {
            assert_eq!(tree.insert(&vec![b'a'; len], len), None);
        }
        assert_eq!(tree.len(), DEPTH);
        assert_eq!(tree.insert(&vec![b'a'; DEPTH], 0), Some(DEPTH));
        assert_eq!(tree.get(&vec![b'a'; 1]), Some(&1));
        assert_eq!(tree.get(&vec![b'a'; DEPTH / 2]), Some(&(DEPTH / 2)));
        assert_eq!(tree.get(&vec![b'a'; DEPTH + 1]), None);
        assert!(tree.stats().max_depth > 10_000);

        let mut cursor = tree.cursor();
        assert!(cursor.seek_lt(&vec![b'a'; DEPTH]));
        assert_eq!(cursor.next().map(|(k, _)| k.len()), Some(DEPTH - 1));
        assert_eq!(tree.iter().count(), DEPTH);

        drop(tree);
    }

    #[test]
    fn test_empty_tree() {
        let tree: Tree<u32> = Tree::new();
        assert_eq!(tree.get(b""), None);
        assert_eq!(tree.iter().next(), None);
        assert_eq!(tree.reverse_iter().next(), None);
        assert_eq!(tree.stats(), TreeStats::default());
    }
}
