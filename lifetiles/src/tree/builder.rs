//! Edge list to validated tree.

use std::collections::HashMap;

use tracing::debug;

use super::arena::Tree;
use super::error::{MalformedInputError, TreeError};
use super::node::{Edge, Node, NodeIndex, TaxonId};

/// Incrementally collects `(parent_id, id)` rows and validates them into a
/// [`Tree`].
///
/// Rows may arrive in any order; a child can be read before its parent.
/// Children are attached in the order their rows were pushed.
///
/// # Example
///
/// ```
/// use lifetiles::tree::{Edge, TreeBuilder};
///
/// let mut builder = TreeBuilder::new();
/// builder.push(Edge::new(1, 2))?;
/// builder.push(Edge::root(1))?;
/// let tree = builder.build()?;
/// assert_eq!(tree.len(), 2);
/// # Ok::<(), lifetiles::tree::TreeError>(())
/// ```
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
    parent_ids: Vec<Option<TaxonId>>,
    index: HashMap<TaxonId, NodeIndex>,
    roots: Vec<NodeIndex>,
}

impl TreeBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty builder with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            parent_ids: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            roots: Vec::new(),
        }
    }

    /// Build a tree from a complete edge list.
    pub fn from_edges<I, E>(edges: I) -> Result<Tree, TreeError>
    where
        I: IntoIterator<Item = E>,
        E: Into<Edge>,
    {
        let mut builder = Self::new();
        for edge in edges {
            builder.push(edge.into())?;
        }
        builder.build()
    }

    /// Number of rows pushed so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no rows have been pushed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add one row.
    ///
    /// # Errors
    ///
    /// Fails immediately on a repeated id or a row that is its own parent.
    pub fn push(&mut self, edge: Edge) -> Result<(), TreeError> {
        if self.index.contains_key(&edge.id) {
            return Err(MalformedInputError::DuplicateId(edge.id).into());
        }
        if edge.parent_id == Some(edge.id) {
            return Err(MalformedInputError::SelfParent(edge.id).into());
        }

        let index = self.nodes.len();
        if edge.parent_id.is_none() {
            self.roots.push(index);
        }

        self.index.insert(edge.id, index);
        self.parent_ids.push(edge.parent_id);
        self.nodes.push(Node::new(
            edge.id,
            edge.name.unwrap_or_default(),
            edge.rank.unwrap_or_default(),
        ));
        Ok(())
    }

    /// Resolve parent links and validate the structure.
    ///
    /// # Errors
    ///
    /// - [`MalformedInputError::NoRoot`] / [`MalformedInputError::MultipleRoots`]
    ///   unless exactly one row has no parent
    /// - [`MalformedInputError::UnresolvedParent`] if a parent id is unknown
    /// - [`TreeError::Cycle`] if any node is unreachable from the root
    pub fn build(self) -> Result<Tree, TreeError> {
        let Self {
            mut nodes,
            parent_ids,
            index,
            roots,
        } = self;

        let root = match roots.as_slice() {
            [] => return Err(MalformedInputError::NoRoot.into()),
            [root] => *root,
            many => {
                let ids: Vec<TaxonId> = many.iter().map(|&r| nodes[r].id).collect();
                return Err(MalformedInputError::multiple_roots(&ids).into());
            }
        };

        for (child, parent_id) in parent_ids.into_iter().enumerate() {
            let Some(parent_id) = parent_id else {
                continue;
            };
            let parent = *index.get(&parent_id).ok_or_else(|| {
                MalformedInputError::UnresolvedParent {
                    id: nodes[child].id,
                    parent_id,
                }
            })?;
            nodes[child].parent = Some(parent);
            nodes[parent].children.push(child);
        }

        let unreachable = unreachable_from(&nodes, root);
        if let Some(&example) = unreachable.first() {
            return Err(TreeError::Cycle {
                root: nodes[root].id,
                unreachable: unreachable.len(),
                example: nodes[example].id,
            });
        }

        debug!(nodes = nodes.len(), root = nodes[root].id, "Tree built");
        Ok(Tree::from_parts(nodes, root, index))
    }
}

/// Arena indices not reachable from `root` by following child links.
fn unreachable_from(nodes: &[Node], root: NodeIndex) -> Vec<NodeIndex> {
    let mut seen = vec![false; nodes.len()];
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if seen[node] {
            continue;
        }
        seen[node] = true;
        stack.extend(nodes[node].children.iter().copied());
    }

    seen.iter()
        .enumerate()
        .filter(|(_, &reached)| !reached)
        .map(|(i, _)| i)
        .collect()
}
