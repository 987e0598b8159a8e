//! Per-bucket level-of-detail reduction.
//!
//! A bucket's candidate nodes form a forest: a node whose parent is not in
//! the bucket becomes a local root. Reduction runs in two passes over that
//! forest:
//!
//! - **Chain collapse** drops every node with a local parent and exactly
//!   one local child. Survivors point at their nearest surviving ancestor.
//! - **Aggregation** folds the deepest subtrees into single synthetic
//!   records until the bucket fits its budget. If every subtree is already
//!   folded and the local roots alone still overflow, consecutive roots
//!   are grouped.

use std::cmp::Reverse;
use std::collections::HashMap;

use super::annotated::AnnotatedTree;
use super::config::{AggregationOrder, TilingConfig};
use crate::coverage::CoverageState;
use crate::tile::TileRecord;
use crate::tree::traverse::{self, Hierarchy};
use crate::tree::{NodeIndex, TaxonId};

/// Counters for one reduced bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LodStats {
    /// Nodes passing the depth filter.
    pub candidates: usize,
    /// Nodes removed by chain collapse.
    pub collapsed: usize,
    /// Collapsed nodes not absorbed into an aggregate; they survive only
    /// as a rewritten edge above an emitted record.
    pub elided: usize,
    /// Subtrees folded into aggregate records.
    pub aggregated: usize,
    /// Groups of local roots merged by the fallback.
    pub grouped: usize,
    /// Records emitted.
    pub records: usize,
}

impl LodStats {
    /// Accumulate another bucket's counters.
    pub fn merge(&mut self, other: &LodStats) {
        self.candidates += other.candidates;
        self.collapsed += other.collapsed;
        self.elided += other.elided;
        self.aggregated += other.aggregated;
        self.grouped += other.grouped;
        self.records += other.records;
    }
}

/// Local forest over a subset of tree nodes.
///
/// `members` is in global pre-order, so local index order is traversal
/// order and children lists keep the tree's sibling order.
#[derive(Debug)]
pub(crate) struct BucketForest {
    members: Vec<NodeIndex>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    /// Parent id emitted for each member.
    parent_ids: Vec<Option<TaxonId>>,
    /// Collapsed chain nodes between each member and its local parent.
    hidden: Vec<u64>,
}

impl Hierarchy for BucketForest {
    fn node_count(&self) -> usize {
        self.members.len()
    }

    fn roots(&self) -> &[usize] {
        &self.roots
    }

    fn children_of(&self, node: usize) -> &[usize] {
        &self.children[node]
    }
}

impl BucketForest {
    /// Build the local forest for `members` (global pre-order).
    pub(crate) fn new(annotated: &AnnotatedTree<'_>, members: Vec<NodeIndex>) -> Self {
        let local: HashMap<NodeIndex, usize> = members
            .iter()
            .enumerate()
            .map(|(i, &node)| (node, i))
            .collect();

        let mut parents = Vec::with_capacity(members.len());
        let mut children = vec![Vec::new(); members.len()];
        let mut roots = Vec::new();
        let mut parent_ids = Vec::with_capacity(members.len());

        for (i, &node) in members.iter().enumerate() {
            let parent = annotated.tree[node]
                .parent()
                .and_then(|p| local.get(&p).copied());
            match parent {
                Some(p) => children[p].push(i),
                None => roots.push(i),
            }
            parents.push(parent);
            parent_ids.push(annotated.tree.parent_id(node));
        }

        let hidden = vec![0; members.len()];
        Self {
            members,
            parents,
            children,
            roots,
            parent_ids,
            hidden,
        }
    }

    /// Remove unbranched chain links, returning how many were dropped.
    ///
    /// A node is dropped when it has a local parent and exactly one local
    /// child. Each survivor's emitted parent becomes its nearest surviving
    /// local ancestor; local roots keep their real parent id. The dropped
    /// links are tallied on the survivor below them.
    pub(crate) fn collapse_chains(&mut self, annotated: &AnnotatedTree<'_>) -> usize {
        let n = self.members.len();
        let keep: Vec<bool> = (0..n)
            .map(|i| self.parents[i].is_none() || self.children[i].len() != 1)
            .collect();
        let dropped = keep.iter().filter(|&&k| !k).count();
        if dropped == 0 {
            return 0;
        }

        // Local roots are always kept, so every walk ends at a survivor.
        // Each dropped node has one child and is walked exactly once.
        let mut new_index = vec![usize::MAX; n];
        let mut members = Vec::with_capacity(n - dropped);
        let mut parents = Vec::with_capacity(n - dropped);
        let mut parent_ids = Vec::with_capacity(n - dropped);
        let mut hidden = Vec::with_capacity(n - dropped);
        for i in (0..n).filter(|&i| keep[i]) {
            new_index[i] = members.len();
            members.push(self.members[i]);

            let mut skipped = self.hidden[i];
            let mut ancestor = self.parents[i];
            while let Some(a) = ancestor {
                if keep[a] {
                    break;
                }
                skipped += 1 + self.hidden[a];
                ancestor = self.parents[a];
            }
            hidden.push(skipped);
            match ancestor {
                // Survivors are visited in pre-order, so the ancestor is
                // already renumbered.
                Some(a) => {
                    parents.push(Some(new_index[a]));
                    parent_ids.push(Some(annotated.tree[self.members[a]].id()));
                }
                None => {
                    parents.push(None);
                    parent_ids.push(self.parent_ids[i]);
                }
            }
        }

        let mut children = vec![Vec::new(); members.len()];
        let mut roots = Vec::new();
        for (i, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => children[*p].push(i),
                None => roots.push(i),
            }
        }

        self.members = members;
        self.parents = parents;
        self.children = children;
        self.roots = roots;
        self.parent_ids = parent_ids;
        self.hidden = hidden;
        dropped
    }
}

/// Aggregation bookkeeping for one local node.
#[derive(Debug, Clone, Copy)]
struct Folded {
    count: u64,
    coverage: CoverageState,
}

/// Reduce one bucket to at most `config.max_nodes_per_tile` records.
pub(crate) fn reduce_bucket(
    annotated: &AnnotatedTree<'_>,
    members: Vec<NodeIndex>,
    config: &TilingConfig,
) -> (Vec<TileRecord>, LodStats) {
    let mut stats = LodStats {
        candidates: members.len(),
        ..LodStats::default()
    };

    let mut forest = BucketForest::new(annotated, members);
    if config.collapse_chains {
        stats.collapsed = forest.collapse_chains(annotated);
    }

    let n = forest.node_count();
    let budget = config.max_nodes_per_tile;
    let mut alive = vec![true; n];
    let mut folded: Vec<Option<Folded>> = vec![None; n];
    let mut live = n;

    if live > budget {
        let sizes = traverse::fold_up(&forest, |_| 1u64, |acc, child| *acc += *child);
        let order = aggregation_order(annotated, &forest, &sizes, config.aggregation_order);

        // Deepest first: when `node` is reached every internal descendant
        // is already folded, so its live children are leaves or aggregates.
        for node in order {
            if live <= budget {
                break;
            }
            let mut count = 1u64;
            let mut coverage = annotated.coverage.state(forest.members[node]);
            for &child in &forest.children[node] {
                let (child_count, child_coverage) = match folded[child] {
                    Some(f) => (f.count, f.coverage),
                    None => (1, annotated.coverage.state(forest.members[child])),
                };
                // Links collapsed above `child` are real nodes of this subtree.
                count += child_count + forest.hidden[child];
                coverage = coverage.max(child_coverage);
                alive[child] = false;
            }
            live -= forest.children[node].len();
            folded[node] = Some(Folded { count, coverage });
            stats.aggregated += 1;
        }
    }

    stats.elided = (0..n)
        .filter(|&i| alive[i])
        .map(|i| forest.hidden[i] as usize)
        .sum();

    let mut records: Vec<TileRecord> = (0..n)
        .filter(|&i| alive[i])
        .map(|i| {
            let mut record = annotated.record(forest.members[i]);
            record.parent_id = forest.parent_ids[i];
            if let Some(f) = folded[i] {
                record.is_aggregate = true;
                record.aggregate_count = clamp_count(f.count);
                record.coverage_state = f.coverage;
            }
            record
        })
        .collect();

    if records.len() > budget {
        // Only local roots remain.
        let (grouped, groups) = group_roots(records, budget);
        records = grouped;
        stats.grouped = groups;
    }

    stats.records = records.len();
    (records, stats)
}

/// Internal nodes in folding order: depth descending, then the configured
/// tie-break, then traversal order.
fn aggregation_order(
    annotated: &AnnotatedTree<'_>,
    forest: &BucketForest,
    sizes: &[u64],
    order: AggregationOrder,
) -> Vec<usize> {
    let mut internal: Vec<usize> = (0..forest.node_count())
        .filter(|&i| !forest.children[i].is_empty())
        .collect();
    let depth = |i: usize| annotated.layout.depth(forest.members[i]);

    match order {
        AggregationOrder::MostDescendants => {
            internal.sort_by_key(|&i| (Reverse(depth(i)), Reverse(sizes[i]), i))
        }
        AggregationOrder::FewestDescendants => {
            internal.sort_by_key(|&i| (Reverse(depth(i)), sizes[i], i))
        }
        AggregationOrder::InputOrder => internal.sort_by_key(|&i| (Reverse(depth(i)), i)),
    }
    internal
}

/// Merge consecutive root records into groups of `ceil(len / budget)`.
///
/// A group takes its first member's identity and x; y is the members'
/// mean y.
fn group_roots(records: Vec<TileRecord>, budget: usize) -> (Vec<TileRecord>, usize) {
    let group_size = records.len().div_ceil(budget);
    let mut groups = 0;
    let merged = records
        .chunks(group_size)
        .map(|chunk| {
            if chunk.len() == 1 {
                return chunk[0].clone();
            }
            groups += 1;
            let mut group = chunk[0].clone();
            group.y = chunk.iter().map(|r| r.y).sum::<f64>() / chunk.len() as f64;
            group.coverage_state = chunk
                .iter()
                .map(|r| r.coverage_state)
                .max()
                .unwrap_or_default();
            group.aggregate_count =
                clamp_count(chunk.iter().map(TileRecord::represented_nodes).sum());
            group.is_aggregate = true;
            group
        })
        .collect();
    (merged, groups)
}

fn clamp_count(count: u64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
