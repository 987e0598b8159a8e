//! Coverage states and their upward propagation.
//!
//! Each taxon carries one of six ordered states describing which kinds of
//! experimental data exist for it. Observations are made on (mostly) leaf
//! taxa and propagated upward so every node shows the best state among
//! itself and its descendants.

mod propagate;
mod state;
mod stats;

pub use propagate::{Coverage, CoveragePropagator};
pub use state::{CoverageFlags, CoverageState, InvalidCoverageState};
pub use stats::{RankCounts, RankStatistics, DEFAULT_RANKS};
