//! Node and edge types.

/// Stable identifier of a taxon, as found in the input edge list.
pub type TaxonId = i64;

/// Index of a node in the tree arena.
pub type NodeIndex = usize;

/// One row of the input edge list.
///
/// A row with `parent_id == None` is a root candidate. `name` and `rank`
/// are opaque display labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub parent_id: Option<TaxonId>,
    pub id: TaxonId,
    pub name: Option<String>,
    pub rank: Option<String>,
}

impl Edge {
    /// Create an edge from `parent_id` to `id`.
    pub fn new(parent_id: TaxonId, id: TaxonId) -> Self {
        Self {
            parent_id: Some(parent_id),
            id,
            name: None,
            rank: None,
        }
    }

    /// Create a root row for `id`.
    pub fn root(id: TaxonId) -> Self {
        Self {
            parent_id: None,
            id,
            name: None,
            rank: None,
        }
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a rank label.
    pub fn with_rank(mut self, rank: impl Into<String>) -> Self {
        self.rank = Some(rank.into());
        self
    }
}

impl From<(Option<TaxonId>, TaxonId)> for Edge {
    fn from((parent_id, id): (Option<TaxonId>, TaxonId)) -> Self {
        Self {
            parent_id,
            id,
            name: None,
            rank: None,
        }
    }
}

/// A node in the tree arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: TaxonId,
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) children: Vec<NodeIndex>,
    pub(crate) name: String,
    pub(crate) rank: String,
}

impl Node {
    pub(crate) fn new(id: TaxonId, name: String, rank: String) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            name,
            rank,
        }
    }

    /// Taxon identifier.
    pub fn id(&self) -> TaxonId {
        self.id
    }

    /// Arena index of the parent, `None` for the root.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Arena indices of the children, in input order.
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    /// Display name (empty if the input carried none).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rank label (empty if the input carried none).
    pub fn rank(&self) -> &str {
        &self.rank
    }

    /// Whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
