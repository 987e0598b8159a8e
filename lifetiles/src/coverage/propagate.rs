//! Bottom-up coverage propagation.

use std::time::Instant;

use tracing::{debug, info};

use super::state::CoverageState;
use crate::tree::{traverse, NodeIndex, TaxonId, Tree};

/// Final coverage state per node, indexed by arena index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coverage {
    states: Vec<CoverageState>,
}

impl Coverage {
    /// Every node at `NO_DATA`.
    pub fn empty(node_count: usize) -> Self {
        Self {
            states: vec![CoverageState::NoData; node_count],
        }
    }

    /// Final state of `node`.
    pub fn state(&self, node: NodeIndex) -> CoverageState {
        self.states[node]
    }

    /// All states in arena order.
    pub fn states(&self) -> &[CoverageState] {
        &self.states
    }

    /// Number of nodes per state, indexed by state value.
    pub fn histogram(&self) -> [u64; 6] {
        let mut counts = [0u64; 6];
        for state in &self.states {
            counts[state.as_u8() as usize] += 1;
        }
        counts
    }
}

/// Assigns every node the maximum state over itself and its descendants.
///
/// A single post-order pass; the tree is acyclic so no fixed-point
/// iteration is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoveragePropagator;

impl CoveragePropagator {
    /// Create a propagator.
    pub fn new() -> Self {
        Self
    }

    /// Propagate `observations` over `tree`.
    ///
    /// Nodes without an observation start at `NO_DATA`. Ids that do not
    /// belong to the tree are ignored. If an id is observed more than once
    /// the best state wins.
    pub fn propagate<I>(&self, tree: &Tree, observations: I) -> Coverage
    where
        I: IntoIterator<Item = (TaxonId, CoverageState)>,
    {
        let start = Instant::now();
        let mut own = vec![CoverageState::NoData; tree.len()];
        let mut matched = 0usize;
        let mut ignored = 0usize;

        for (id, state) in observations {
            match tree.index_of(id) {
                Some(node) => {
                    own[node] = own[node].max(state);
                    matched += 1;
                }
                None => ignored += 1,
            }
        }

        if ignored > 0 {
            debug!(ignored, "Coverage observations for unknown ids ignored");
        }

        let states = traverse::fold_up(tree, |n| own[n], |acc, child| *acc = (*acc).max(*child));

        info!(
            observations = matched,
            ignored,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Coverage propagated"
        );

        Coverage { states }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Edge, Hierarchy, TreeBuilder};

    fn scenario_one() -> Tree {
        TreeBuilder::from_edges([
            Edge::root(1),
            Edge::new(1, 2),
            Edge::new(1, 3),
            Edge::new(2, 4),
            Edge::new(2, 5),
        ])
        .unwrap()
    }

    #[test]
    fn test_scenario_three() {
        let tree = scenario_one();
        let coverage = CoveragePropagator::new().propagate(&tree, [(4, CoverageState::Full)]);
        let state = |id| coverage.state(tree.index_of(id).unwrap());

        assert_eq!(state(4), CoverageState::Full);
        assert_eq!(state(2), CoverageState::Full);
        assert_eq!(state(1), CoverageState::Full);
        assert_eq!(state(3), CoverageState::NoData);
        assert_eq!(state(5), CoverageState::NoData);
    }

    #[test]
    fn test_internal_observation_kept_when_higher() {
        let tree = scenario_one();
        let coverage = CoveragePropagator::new().propagate(
            &tree,
            [
                (2, CoverageState::GenomeAnnotationOnly),
                (5, CoverageState::ReadsOnly),
            ],
        );
        assert_eq!(
            coverage.state(tree.index_of(2).unwrap()),
            CoverageState::GenomeAnnotationOnly
        );
        assert_eq!(
            coverage.state(tree.root()),
            CoverageState::GenomeAnnotationOnly
        );
    }

    #[test]
    fn test_unknown_ids_ignored() {
        let tree = scenario_one();
        let coverage = CoveragePropagator::new().propagate(&tree, [(999, CoverageState::Full)]);
        assert_eq!(coverage, Coverage::empty(tree.len()));
    }

    #[test]
    fn test_repeated_observation_best_wins() {
        let tree = scenario_one();
        let coverage = CoveragePropagator::new().propagate(
            &tree,
            [(3, CoverageState::GenomeOnly), (3, CoverageState::ReadsOnly)],
        );
        assert_eq!(
            coverage.state(tree.index_of(3).unwrap()),
            CoverageState::GenomeOnly
        );
    }

    #[test]
    fn test_histogram() {
        let tree = scenario_one();
        let coverage = CoveragePropagator::new().propagate(&tree, [(4, CoverageState::Full)]);
        let histogram = coverage.histogram();
        assert_eq!(histogram[0], 2);
        assert_eq!(histogram[5], 3);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_parent_dominates_children(
                parents in (1usize..200).prop_flat_map(|n| {
                    (1..n).map(|i| (0..i).boxed()).collect::<Vec<_>>()
                }),
                raw_states in proptest::collection::vec(0u8..6, 200),
            ) {
                let mut edges = vec![Edge::root(0)];
                for (i, &p) in parents.iter().enumerate() {
                    edges.push(Edge::new(p as TaxonId, (i + 1) as TaxonId));
                }
                let tree = TreeBuilder::from_edges(edges).unwrap();
                let observations = (0..tree.len()).map(|i| {
                    (i as TaxonId, CoverageState::try_from(raw_states[i]).unwrap())
                });
                let coverage = CoveragePropagator::new().propagate(&tree, observations);

                for node in 0..tree.len() {
                    for &child in tree.children_of(node) {
                        prop_assert!(coverage.state(node) >= coverage.state(child));
                    }
                    let own = CoverageState::try_from(raw_states[tree[node].id() as usize]).unwrap();
                    prop_assert!(coverage.state(node) >= own);
                }
            }
        }
    }
}
