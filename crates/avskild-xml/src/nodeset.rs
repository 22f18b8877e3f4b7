#![forbid(unsafe_code)]

//! NodeSet type for document-subset canonicalization.
//!
//! A `NodeSet` names the nodes of one parsed document that take part in
//! canonicalization. Signing and verification only ever canonicalize the
//! `SignedInfo` subtree, so the set is built from a subtree root.

use std::collections::HashSet;

/// A set of nodes from a single `roxmltree::Document`, identified by `NodeId`.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: HashSet<roxmltree::NodeId>,
}

impl NodeSet {
    /// Create an empty node set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node set for a subtree rooted at the given node (without comments).
    pub fn tree_without_comments(root: roxmltree::Node<'_, '_>) -> Self {
        let mut nodes = HashSet::new();
        collect_subtree(root, &mut nodes, false);
        Self { nodes }
    }

    /// Create a node set for a subtree rooted at the given node (with comments).
    pub fn tree_with_comments(root: roxmltree::Node<'_, '_>) -> Self {
        let mut nodes = HashSet::new();
        collect_subtree(root, &mut nodes, true);
        Self { nodes }
    }

    /// Check if a node is in this set.
    pub fn contains(&self, node: &roxmltree::Node<'_, '_>) -> bool {
        self.nodes.contains(&node.id())
    }

    /// Add a node to this set.
    pub fn insert(&mut self, node: &roxmltree::Node<'_, '_>) {
        self.nodes.insert(node.id());
    }

    /// Check if this set is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes in the set.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

fn collect_subtree(
    node: roxmltree::Node<'_, '_>,
    set: &mut HashSet<roxmltree::NodeId>,
    include_comments: bool,
) {
    if !include_comments && node.is_comment() {
        return;
    }
    set.insert(node.id());
    for child in node.children() {
        collect_subtree(child, set, include_comments);
    }
}
