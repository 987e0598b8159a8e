//! Read-only view over the tree plus its layout and coverage.

use crate::coverage::Coverage;
use crate::layout::Layout;
use crate::tile::TileRecord;
use crate::tree::{NodeIndex, Tree};

/// The fully annotated tree consumed by the tiling engine.
///
/// All three parts are indexed by the same arena indices.
#[derive(Debug, Clone, Copy)]
pub struct AnnotatedTree<'a> {
    pub tree: &'a Tree,
    pub layout: &'a Layout,
    pub coverage: &'a Coverage,
}

impl<'a> AnnotatedTree<'a> {
    /// Bundle the three stage outputs.
    ///
    /// # Panics
    ///
    /// Panics if the layout or coverage was computed for a different tree.
    pub fn new(tree: &'a Tree, layout: &'a Layout, coverage: &'a Coverage) -> Self {
        assert_eq!(tree.len(), layout.len(), "layout does not match tree");
        assert_eq!(
            tree.len(),
            coverage.states().len(),
            "coverage does not match tree"
        );
        Self {
            tree,
            layout,
            coverage,
        }
    }

    /// Plain tile record for `node` with its real parent.
    pub fn record(&self, node: NodeIndex) -> TileRecord {
        let source = &self.tree[node];
        TileRecord {
            id: source.id(),
            parent_id: self.tree.parent_id(node),
            x: self.layout.x(node),
            y: self.layout.y(node),
            depth: self.layout.depth(node),
            coverage_state: self.coverage.state(node),
            name: source.name().to_string(),
            rank: source.rank().to_string(),
            is_aggregate: false,
            aggregate_count: 0,
        }
    }
}
