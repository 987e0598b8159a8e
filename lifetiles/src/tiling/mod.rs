//! Level-of-detail tiling.
//!
//! For every zoom level `z` the engine:
//!
//! 1. buckets nodes by `floor(y * 2^z)`
//! 2. keeps only nodes with `depth <= z + depth_margin`
//! 3. collapses unbranched chains inside each bucket
//! 4. folds the deepest subtrees into aggregate records until the bucket
//!    fits `max_nodes_per_tile`
//! 5. emits one immutable tile per non-empty bucket
//!
//! Tiles at different `(zoom, bucket)` pairs share only read access to the
//! annotated tree and are built in parallel with rayon.

mod annotated;
mod config;
mod engine;
mod lod;

pub use annotated::AnnotatedTree;
pub use config::{
    AggregationOrder, TilingConfig, TilingError, DEFAULT_DEPTH_MARGIN, DEFAULT_MAX_NODES_PER_TILE,
};
pub use engine::{TilingEngine, TilingSummary};
pub use lod::LodStats;
