//! Tree construction errors.

use thiserror::Error;

use super::node::TaxonId;

/// Maximum number of ids listed in a `MultipleRoots` error.
const MAX_LISTED_ROOTS: usize = 8;

/// The edge list has the wrong shape to form a rooted tree.
///
/// Fatal: the pipeline aborts before any layout work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedInputError {
    /// The same id appears on more than one row.
    #[error("Duplicate id {0}")]
    DuplicateId(TaxonId),

    /// No row has an empty parent id.
    #[error("No root row (a row with an empty parent id)")]
    NoRoot,

    /// More than one row has an empty parent id.
    #[error("Multiple root rows ({count}), first ids: {ids:?}")]
    MultipleRoots { count: usize, ids: Vec<TaxonId> },

    /// A parent id does not match any row's id.
    #[error("Parent {parent_id} of node {id} does not resolve to a known id")]
    UnresolvedParent { id: TaxonId, parent_id: TaxonId },

    /// A row names itself as its own parent.
    #[error("Node {0} names itself as its parent")]
    SelfParent(TaxonId),
}

impl MalformedInputError {
    pub(crate) fn multiple_roots(ids: &[TaxonId]) -> Self {
        MalformedInputError::MultipleRoots {
            count: ids.len(),
            ids: ids.iter().take(MAX_LISTED_ROOTS).copied().collect(),
        }
    }
}

/// Errors that can occur while building or reshaping a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Bad edge list shape.
    #[error("Malformed input: {0}")]
    MalformedInput(#[from] MalformedInputError),

    /// Some nodes cannot be reached from the root, which implies a cycle
    /// or a disconnected fragment.
    #[error(
        "{unreachable} node(s) not reachable from root {root} (cycle or disconnected fragment), e.g. {example}"
    )]
    Cycle {
        root: TaxonId,
        unreachable: usize,
        example: TaxonId,
    },

    /// Requested subtree root does not exist.
    #[error("Root {0} not found in tree")]
    UnknownRoot(TaxonId),
}
