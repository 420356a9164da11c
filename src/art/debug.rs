//! Debug utilities for tree troubleshooting.

use std::fmt::Write as _;

use super::node::{Children, Edge, Node, NodeType};
use super::Tree;

impl<V: std::fmt::Debug> Tree<V> {
    /// Render the tree structure, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Tree (len={}) ===", self.len);
        let Some(root) = self.root() else {
            out.push_str("(empty)\n");
            return out;
        };
        let mut stack = vec![(root, 0usize, String::new())];
        while let Some((node, level, label)) = stack.pop() {
            let indent = "  ".repeat(level);
            match node {
                Node::Leaf(leaf) => {
                    let _ = writeln!(
                        out,
                        "{indent}{label}Leaf {:?} -> {:?}",
                        String::from_utf8_lossy(leaf.key()),
                        leaf.value()
                    );
                }
                Node::Inner(inner) => {
                    let _ = writeln!(
                        out,
                        "{indent}{label}{:?} prefix={:?} children={}",
                        inner.node_type(),
                        String::from_utf8_lossy(inner.prefix()),
                        inner.num_children()
                    );
                    // Reversed so the smallest edge is printed first.
                    let mut edges: Vec<_> = inner.edges().collect();
                    edges.reverse();
                    for (edge, child) in edges {
                        let label = match edge {
                            Edge::End => "[end] ".to_owned(),
                            Edge::Byte(b) if b.is_ascii_graphic() => format!("[{}] ", b as char),
                            Edge::Byte(b) => format!("[{b:#04x}] "),
                        };
                        stack.push((child, level + 1, label));
                    }
                }
            }
        }
        out
    }

    /// Print the tree structure to stdout.
    pub fn debug_print(&self) {
        print!("{}", self.dump());
    }
}

impl<V> Tree<V> {
    /// Verify tree integrity - returns list of issues found.
    pub fn verify_integrity(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let mut leaves = 0usize;
        let mut stack: Vec<(&Node<V>, Vec<u8>, bool)> =
            self.root().map(|n| (n, Vec::new(), false)).into_iter().collect();

        while let Some((node, path, terminal)) = stack.pop() {
            match node {
                Node::Leaf(leaf) => {
                    leaves += 1;
                    if !leaf.key().starts_with(&path) {
                        issues.push(format!("Leaf {:?} is not under path {:?}", leaf.key(), path));
                    }
                    if terminal && leaf.key() != path.as_slice() {
                        issues.push(format!("Terminal leaf {:?} does not end at {:?}", leaf.key(), path));
                    }
                }
                Node::Inner(inner) => {
                    if terminal {
                        issues.push(format!("Inner node hangs off the terminal edge at {path:?}"));
                    }
                    check_children(&inner.children, &path, &mut issues);

                    let edges = inner.num_children() + usize::from(inner.terminal().is_some());
                    if edges < 2 {
                        issues.push(format!("Inner node at {path:?} has only {edges} edge(s)"));
                    }

                    let mut full = path;
                    full.extend_from_slice(inner.prefix());
                    for (edge, child) in inner.edges() {
                        match edge {
                            Edge::End => stack.push((child, full.clone(), true)),
                            Edge::Byte(b) => {
                                let mut child_path = full.clone();
                                child_path.push(b);
                                stack.push((child, child_path, false));
                            }
                        }
                    }
                }
            }
        }

        if leaves != self.len {
            issues.push(format!("Tree has {leaves} leaves but len={}", self.len));
        }
        issues
    }
}

/// Layout checks for one node's byte edges.
fn check_children<V>(children: &Children<V>, path: &[u8], issues: &mut Vec<String>) {
    let (kind, n) = match children {
        Children::Node4 { keys, children } => {
            check_sorted(&keys[..children.len().min(4)], path, issues);
            (NodeType::Node4, children.len())
        }
        Children::Node16 { keys, children } => {
            check_sorted(&keys[..children.len().min(16)], path, issues);
            (NodeType::Node16, children.len())
        }
        Children::Node48 { index, children } => {
            let mut seen = [false; 48];
            let mut used = 0;
            for &slot in index.iter().filter(|&&s| s != 0) {
                used += 1;
                match seen.get_mut(slot as usize - 1) {
                    Some(flag) if !*flag && (slot as usize) <= children.len() => *flag = true,
                    _ => issues.push(format!("Node48 at {path:?} has bad or repeated slot {slot}")),
                }
            }
            if used != children.len() {
                issues.push(format!(
                    "Node48 at {path:?} indexes {used} slots but holds {} children",
                    children.len()
                ));
            }
            (NodeType::Node48, children.len())
        }
        Children::Node256 { len, children } => {
            let actual = children.iter().filter(|c| c.is_some()).count();
            if actual != *len as usize {
                issues.push(format!("Node256 at {path:?} has {actual} children but len={len}"));
            }
            (NodeType::Node256, actual)
        }
    };

    // Nodes are never demoted, so each class holds more than the one below.
    let (min, max) = match kind {
        NodeType::Node4 | NodeType::Leaf => (0, 4),
        NodeType::Node16 => (5, 16),
        NodeType::Node48 => (17, 48),
        NodeType::Node256 => (49, 256),
    };
    if n < min || n > max {
        issues.push(format!("{kind:?} at {path:?} holds {n} children"));
    }
}

fn check_sorted(keys: &[u8], path: &[u8], issues: &mut Vec<String>) {
    if keys.windows(2).any(|w| w[0] >= w[1]) {
        issues.push(format!("Keys at {path:?} are not strictly ascending: {keys:?}"));
    }
}
