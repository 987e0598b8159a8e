//! Per-rank coverage statistics.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::propagate::Coverage;
use super::state::CoverageState;
use crate::tree::Tree;

/// Ranks summarized when the caller does not name any.
pub const DEFAULT_RANKS: [&str; 5] = ["phylum", "class", "order", "family", "genus"];

/// Node counts per coverage state for one rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RankCounts {
    /// Counts indexed by state value (0-5).
    pub by_state: [u64; 6],
}

impl RankCounts {
    /// Total taxa at this rank.
    pub fn total(&self) -> u64 {
        self.by_state.iter().sum()
    }

    /// Count for one state.
    pub fn count(&self, state: CoverageState) -> u64 {
        self.by_state[state.as_u8() as usize]
    }

    /// Percentage of taxa in `state`, 0.0 for an empty rank.
    pub fn percent(&self, state: CoverageState) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.count(state) as f64 * 100.0 / total as f64
        }
    }
}

/// Coverage state counts grouped by rank label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RankStatistics {
    ranks: BTreeMap<String, RankCounts>,
}

impl RankStatistics {
    /// Count the final state of every node whose rank is in `ranks`.
    ///
    /// An empty `ranks` slice means every non-empty rank label.
    pub fn compute(tree: &Tree, coverage: &Coverage, ranks: &[&str]) -> Self {
        let mut stats = Self::default();
        for (index, node) in tree.nodes().enumerate() {
            let rank = node.rank();
            if rank.is_empty() || (!ranks.is_empty() && !ranks.contains(&rank)) {
                continue;
            }
            let state = coverage.state(index);
            stats.ranks.entry(rank.to_string()).or_default().by_state
                [state.as_u8() as usize] += 1;
        }
        stats
    }

    /// Counts for one rank.
    pub fn get(&self, rank: &str) -> Option<&RankCounts> {
        self.ranks.get(rank)
    }

    /// All ranks in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RankCounts)> {
        self.ranks.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether no ranked node was counted.
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

impl fmt::Display for RankStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (rank, counts) in self.iter() {
            writeln!(f, "{} ({} taxa)", rank, counts.total())?;
            for state in CoverageState::ALL.iter().rev() {
                writeln!(
                    f,
                    "  {:<28} {:>9} {:>6.2}%",
                    state.label(),
                    counts.count(*state),
                    counts.percent(*state)
                )?;
            }
        }
        Ok(())
    }
}
