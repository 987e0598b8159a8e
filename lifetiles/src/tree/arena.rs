//! Arena-backed rooted tree.

use std::collections::HashMap;
use std::ops::Index;

use super::error::TreeError;
use super::node::{Node, NodeIndex, TaxonId};
use super::traverse::{self, Hierarchy};

/// A validated rooted tree.
///
/// Built by [`TreeBuilder`](super::TreeBuilder); immutable afterwards.
/// Invariants:
/// - exactly one root (no parent), every other node has exactly one parent
/// - every node is reachable from the root
/// - children are stored in input order
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeIndex,
    index: HashMap<TaxonId, NodeIndex>,
}

impl Tree {
    pub(crate) fn from_parts(
        nodes: Vec<Node>,
        root: NodeIndex,
        index: HashMap<TaxonId, NodeIndex>,
    ) -> Self {
        Self { nodes, root, index }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a validated tree; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Arena index of the root.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Node at `index`.
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index]
    }

    /// All nodes in arena order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Look up the arena index of a taxon.
    pub fn index_of(&self, id: TaxonId) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }

    /// Taxon id of the parent of `index`, `None` for the root.
    pub fn parent_id(&self, index: NodeIndex) -> Option<TaxonId> {
        self.nodes[index].parent.map(|p| self.nodes[p].id)
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Copy out the subtree rooted at `root_id` as a new tree.
    ///
    /// The new root has no parent; arena indices are renumbered in
    /// depth-first order while child order is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownRoot`] if `root_id` is not in the tree.
    pub fn extract_subtree(&self, root_id: TaxonId) -> Result<Tree, TreeError> {
        let old_root = self
            .index_of(root_id)
            .ok_or(TreeError::UnknownRoot(root_id))?;

        let mut order = Vec::new();
        let mut stack = vec![old_root];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.nodes[node].children.iter().rev());
        }

        let mut remap: HashMap<NodeIndex, NodeIndex> = HashMap::with_capacity(order.len());
        for (new, &old) in order.iter().enumerate() {
            remap.insert(old, new);
        }

        let mut nodes = Vec::with_capacity(order.len());
        let mut index = HashMap::with_capacity(order.len());
        for (new, &old) in order.iter().enumerate() {
            let source = &self.nodes[old];
            let mut node = Node::new(source.id, source.name.clone(), source.rank.clone());
            node.parent = if old == old_root {
                None
            } else {
                source.parent.map(|p| remap[&p])
            };
            node.children = source.children.iter().map(|c| remap[c]).collect();
            index.insert(node.id, new);
            nodes.push(node);
        }

        Ok(Tree::from_parts(nodes, 0, index))
    }

    /// Depth-first pre-order of arena indices.
    pub fn pre_order(&self) -> Vec<NodeIndex> {
        traverse::pre_order(self)
    }
}

impl Index<NodeIndex> for Tree {
    type Output = Node;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index]
    }
}

impl Hierarchy for Tree {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn roots(&self) -> &[usize] {
        std::slice::from_ref(&self.root)
    }

    fn children_of(&self, node: usize) -> &[usize] {
        &self.nodes[node].children
    }
}
