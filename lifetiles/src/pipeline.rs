//! End-to-end tile generation.
//!
//! Runs the stages in order and stops at the first fatal error:
//!
//! ```text
//! edges ─► TreeBuilder ─► [extract_subtree] ─► LayoutEngine ─► CoveragePropagator ─► TilingEngine ─► DirectoryStore
//! ```
//!
//! Nothing is written unless every stage succeeded.

use std::time::Instant;

use thiserror::Error;
use tracing::info;

use crate::coverage::{Coverage, CoveragePropagator, CoverageState, RankStatistics};
use crate::layout::{Layout, LayoutEngine};
use crate::source::SourceError;
use crate::store::{DirectoryStore, PublishReport, StoreError};
use crate::tile::TileSet;
use crate::tiling::{AnnotatedTree, TilingConfig, TilingEngine, TilingError, TilingSummary};
use crate::tree::{Edge, TaxonId, Tree, TreeBuilder, TreeError};

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input error: {0}")]
    Source(#[from] SourceError),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Tiling configuration error: {0}")]
    Tiling(#[from] TilingError),

    #[error("Publish error: {0}")]
    Store(#[from] StoreError),
}

/// Pipeline settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    pub tiling: TilingConfig,
    /// Restrict the run to the subtree rooted at this taxon.
    pub root: Option<TaxonId>,
}

impl PipelineConfig {
    pub fn with_tiling(mut self, tiling: TilingConfig) -> Self {
        self.tiling = tiling;
        self
    }

    pub fn with_root(mut self, root: Option<TaxonId>) -> Self {
        self.root = root;
        self
    }
}

/// Everything a pipeline run produced.
#[derive(Debug)]
pub struct PipelineOutput {
    pub tree: Tree,
    pub layout: Layout,
    pub coverage: Coverage,
    pub tiles: TileSet,
    pub summary: TilingSummary,
}

impl PipelineOutput {
    /// Coverage counts per rank (all ranks when `ranks` is empty).
    pub fn rank_statistics(&self, ranks: &[&str]) -> RankStatistics {
        RankStatistics::compute(&self.tree, &self.coverage, ranks)
    }
}

/// Orchestrates one tile build.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    engine: TilingEngine,
}

impl Pipeline {
    /// Create a pipeline; fails on an invalid tiling configuration.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let engine = TilingEngine::new(config.tiling.clone())?;
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build the tree and compute the tile set in memory.
    pub fn run<E, O>(&self, edges: E, observations: O) -> Result<PipelineOutput, PipelineError>
    where
        E: IntoIterator<Item = Edge>,
        O: IntoIterator<Item = (TaxonId, CoverageState)>,
    {
        let start = Instant::now();

        let mut tree = TreeBuilder::from_edges(edges)?;
        info!(nodes = tree.len(), elapsed_ms = start.elapsed().as_millis() as u64, "Tree built");

        if let Some(root) = self.config.root {
            tree = tree.extract_subtree(root)?;
            info!(root, nodes = tree.len(), "Restricted to subtree");
        }

        let layout = LayoutEngine::new().compute(&tree);
        let coverage = CoveragePropagator::new().propagate(&tree, observations);

        let annotated = AnnotatedTree::new(&tree, &layout, &coverage);
        let (tiles, summary) = self.engine.build_with_summary(&annotated);

        info!(
            nodes = tree.len(),
            tiles = summary.tiles,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Pipeline complete"
        );

        Ok(PipelineOutput {
            tree,
            layout,
            coverage,
            tiles,
            summary,
        })
    }

    /// Run and publish to `store`.
    pub fn run_and_publish<E, O>(
        &self,
        edges: E,
        observations: O,
        store: &DirectoryStore,
    ) -> Result<(PipelineOutput, PublishReport), PipelineError>
    where
        E: IntoIterator<Item = Edge>,
        O: IntoIterator<Item = (TaxonId, CoverageState)>,
    {
        let output = self.run(edges, observations)?;
        let report = store.publish(&output.tiles, &self.config.tiling)?;
        Ok((output, report))
    }
}
