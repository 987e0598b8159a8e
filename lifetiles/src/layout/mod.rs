//! Rectangular dendrogram layout.
//!
//! Assigns every node a depth, `x` (normalized depth) and `y` (normalized
//! leaf-order ordinate):
//!
//! ```text
//! depth  0     1     2
//!        │
//!        ├──── 2 ─┬── 4     y = 0.0
//!   1 ───┤        └── 5     y = 0.5
//!        └──── 3            y = 1.0
//! ```
//!
//! Leaves are numbered 0, 1, 2, ... in depth-first, children-in-input-order
//! visitation; each internal node sits at the mean of its direct children.
//! The result is bit-for-bit reproducible for a given edge order.

use std::time::Instant;

use tracing::info;

use crate::tree::{traverse, Hierarchy, NodeIndex, Tree};

/// Per-node layout, indexed by arena index.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    depth: Vec<u32>,
    raw_y: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    max_depth: u32,
    leaf_count: usize,
}

impl Layout {
    /// Depth of a node (root = 0).
    pub fn depth(&self, node: NodeIndex) -> u32 {
        self.depth[node]
    }

    /// Normalized depth in `[0, 1]`.
    pub fn x(&self, node: NodeIndex) -> f64 {
        self.x[node]
    }

    /// Normalized ordinate in `[0, 1]`.
    pub fn y(&self, node: NodeIndex) -> f64 {
        self.y[node]
    }

    /// Ordinate before normalization (leaf counter units).
    pub fn raw_y(&self, node: NodeIndex) -> f64 {
        self.raw_y[node]
    }

    /// Deepest depth in the tree.
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Number of leaves that received an ordinate.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of laid-out nodes.
    pub fn len(&self) -> usize {
        self.depth.len()
    }

    /// Whether the layout is empty.
    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }
}

/// Computes a [`Layout`] for a validated tree. Cannot fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEngine;

impl LayoutEngine {
    /// Create a layout engine.
    pub fn new() -> Self {
        Self
    }

    /// Lay out `tree`.
    pub fn compute(&self, tree: &Tree) -> Layout {
        let start = Instant::now();
        let order = tree.pre_order();
        let depth = traverse::depths(tree);

        let mut raw_y = vec![0.0f64; tree.len()];
        let mut leaf_count = 0usize;
        for &node in &order {
            if tree.children_of(node).is_empty() {
                raw_y[node] = leaf_count as f64;
                leaf_count += 1;
            }
        }

        // Reverse pre-order finalizes every child before its parent.
        for &node in order.iter().rev() {
            let children = tree.children_of(node);
            if !children.is_empty() {
                let sum: f64 = children.iter().map(|&c| raw_y[c]).sum();
                raw_y[node] = sum / children.len() as f64;
            }
        }

        let max_depth = depth.iter().copied().max().unwrap_or(0);
        let x = depth
            .iter()
            .map(|&d| {
                if max_depth > 0 {
                    d as f64 / max_depth as f64
                } else {
                    0.0
                }
            })
            .collect();
        let y = raw_y
            .iter()
            .map(|&r| {
                if leaf_count > 1 {
                    r / (leaf_count - 1) as f64
                } else {
                    0.0
                }
            })
            .collect();

        info!(
            nodes = tree.len(),
            leaves = leaf_count,
            max_depth,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Layout computed"
        );

        Layout {
            depth,
            raw_y,
            x,
            y,
            max_depth,
            leaf_count,
        }
    }
}
