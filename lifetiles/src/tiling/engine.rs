//! Tile set generation across zoom levels.

use std::fmt;

use rayon::prelude::*;
use tracing::{debug, info};

use super::annotated::AnnotatedTree;
use super::config::{TilingConfig, TilingError};
use super::lod::{reduce_bucket, LodStats};
use crate::tile::{bucket_count, bucket_for, Tile, TileKey, TileSet};
use crate::tree::NodeIndex;

/// Aggregate counters for one tiling run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TilingSummary {
    /// Non-empty tiles produced.
    pub tiles: usize,
    /// Largest record count in any tile.
    pub max_records: usize,
    /// Per-bucket counters summed over all tiles.
    pub lod: LodStats,
}

impl fmt::Display for TilingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tiles, {} records (max {}), {} collapsed, {} aggregated, {} root groups",
            self.tiles,
            self.lod.records,
            self.max_records,
            self.lod.collapsed,
            self.lod.aggregated,
            self.lod.grouped
        )
    }
}

/// Builds the full tile set for an annotated tree.
#[derive(Debug, Clone)]
pub struct TilingEngine {
    config: TilingConfig,
}

impl TilingEngine {
    /// Create an engine, validating the configuration.
    pub fn new(config: TilingConfig) -> Result<Self, TilingError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &TilingConfig {
        &self.config
    }

    /// Build every non-empty tile for zoom levels `0..=max_zoom`.
    pub fn build(&self, annotated: &AnnotatedTree<'_>) -> TileSet {
        self.build_with_summary(annotated).0
    }

    /// Build the tile set and report what the reduction did.
    pub fn build_with_summary(&self, annotated: &AnnotatedTree<'_>) -> (TileSet, TilingSummary) {
        let order = annotated.tree.pre_order();

        let mut jobs: Vec<(TileKey, Vec<NodeIndex>)> = Vec::new();
        for zoom in 0..=self.config.max_zoom {
            jobs.extend(self.bucket_zoom(annotated, &order, zoom));
        }
        debug!(jobs = jobs.len(), "Tiling jobs prepared");

        let built: Vec<(Tile, LodStats)> = jobs
            .into_par_iter()
            .map(|(key, members)| {
                let (records, stats) = reduce_bucket(annotated, members, &self.config);
                debug!(
                    tile = %key,
                    candidates = stats.candidates,
                    collapsed = stats.collapsed,
                    aggregated = stats.aggregated,
                    records = stats.records,
                    "Tile reduced"
                );
                (Tile::new(key, records), stats)
            })
            .collect();

        let mut summary = TilingSummary::default();
        let mut tiles = Vec::with_capacity(built.len());
        for (tile, stats) in built {
            summary.tiles += 1;
            summary.max_records = summary.max_records.max(tile.len());
            summary.lod.merge(&stats);
            tiles.push(tile);
        }

        info!(
            nodes = annotated.tree.len(),
            max_zoom = self.config.max_zoom,
            tiles = summary.tiles,
            records = summary.lod.records,
            max_records = summary.max_records,
            "Tile set built"
        );

        (TileSet::new(tiles, annotated.tree.len()), summary)
    }

    /// Candidate members of every non-empty bucket at `zoom`, each list in
    /// pre-order.
    fn bucket_zoom(
        &self,
        annotated: &AnnotatedTree<'_>,
        order: &[NodeIndex],
        zoom: u8,
    ) -> Vec<(TileKey, Vec<NodeIndex>)> {
        let limit = self.config.depth_limit(zoom);
        let mut buckets: Vec<Vec<NodeIndex>> = vec![Vec::new(); bucket_count(zoom) as usize];

        for &node in order {
            if annotated.layout.depth(node) > limit {
                continue;
            }
            let bucket = bucket_for(annotated.layout.y(node), zoom);
            buckets[bucket as usize].push(node);
        }

        buckets
            .into_iter()
            .enumerate()
            .filter(|(_, members)| !members.is_empty())
            .map(|(bucket, members)| (TileKey { zoom, bucket: bucket as u32 }, members))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{Coverage, CoveragePropagator, CoverageState};
    use crate::layout::{Layout, LayoutEngine};
    use crate::tile::TileRecord;
    use crate::tree::{Edge, TaxonId, Tree, TreeBuilder};

    fn annotate(edges: Vec<Edge>) -> (Tree, Layout, Coverage) {
        let tree = TreeBuilder::from_edges(edges).unwrap();
        let layout = LayoutEngine::new().compute(&tree);
        let coverage = CoveragePropagator::new().propagate(&tree, Vec::new());
        (tree, layout, coverage)
    }

    /// Binary tree of the given depth; ids are heap positions from 1.
    fn binary(depth: u32) -> Vec<Edge> {
        let mut edges = vec![Edge::root(1)];
        let count: i64 = (1 << (depth + 1)) - 1;
        for id in 2..=count {
            edges.push(Edge::new(id / 2, id));
        }
        edges
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(TilingEngine::new(TilingConfig::default().with_max_zoom(9)).is_err());
    }

    #[test]
    fn test_chain_in_single_bucket() {
        let (tree, layout, coverage) = annotate(vec![
            Edge::root(1),
            Edge::new(1, 2),
            Edge::new(2, 3),
            Edge::new(3, 4),
        ]);
        let annotated = AnnotatedTree::new(&tree, &layout, &coverage);
        let engine = TilingEngine::new(TilingConfig::default().with_max_zoom(0)).unwrap();
        let tiles = engine.build(&annotated);

        assert_eq!(tiles.len(), 1);
        let tile = tiles.get(&TileKey::new(0, 0).unwrap()).unwrap();
        let ids: Vec<TaxonId> = tile.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(tile.records[1].parent_id, Some(1));
    }

    #[test]
    fn test_depth_filter_per_zoom() {
        // Depth 6 binary tree, 127 nodes.
        let (tree, layout, coverage) = annotate(binary(6));
        let annotated = AnnotatedTree::new(&tree, &layout, &coverage);
        let engine = TilingEngine::new(TilingConfig::default()).unwrap();
        let tiles = engine.build(&annotated);

        for tile in tiles.iter() {
            let limit = tile.key.zoom as u32 + 3;
            assert!(tile.records.iter().all(|r| r.depth <= limit));
        }
        // Zoom 0 reveals depths 0..=3 only.
        let zoom0: usize = tiles.at_zoom(0).map(Tile::len).sum();
        assert_eq!(zoom0, 15);
    }

    #[test]
    fn test_empty_buckets_are_omitted() {
        // Two leaves: y = 0 and y = 1, root at 0.5.
        let (tree, layout, coverage) =
            annotate(vec![Edge::root(1), Edge::new(1, 2), Edge::new(1, 3)]);
        let annotated = AnnotatedTree::new(&tree, &layout, &coverage);
        let engine = TilingEngine::new(TilingConfig::default().with_max_zoom(3)).unwrap();
        let tiles = engine.build(&annotated);

        // Zoom 3 has 8 buckets but only 0, 4 and 7 are occupied.
        let keys: Vec<u32> = tiles.at_zoom(3).map(|t| t.key.bucket).collect();
        assert_eq!(keys, vec![0, 4, 7]);
        assert!(tiles.iter().all(|t| !t.is_empty()));
    }

    #[test]
    fn test_records_fall_inside_their_bucket() {
        let (tree, layout, coverage) = annotate(binary(8));
        let annotated = AnnotatedTree::new(&tree, &layout, &coverage);
        let engine = TilingEngine::new(TilingConfig::default()).unwrap();
        let tiles = engine.build(&annotated);

        for tile in tiles.iter() {
            for record in &tile.records {
                assert_eq!(bucket_for(record.y, tile.key.zoom), tile.key.bucket);
            }
        }
    }

    #[test]
    fn test_every_node_visible_at_max_zoom() {
        let (tree, layout, coverage) = annotate(binary(7));
        let annotated = AnnotatedTree::new(&tree, &layout, &coverage);
        let engine = TilingEngine::new(TilingConfig::default().with_collapse_chains(false))
            .unwrap();
        let tiles = engine.build(&annotated);

        let mut seen: Vec<TaxonId> = tiles
            .at_zoom(7)
            .flat_map(|t| t.records.iter().map(|r| r.id))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..=255).collect::<Vec<_>>());
    }

    #[test]
    fn test_budget_and_coverage_under_pressure() {
        let mut edges = vec![Edge::root(1)];
        edges.extend((0..500).map(|i| Edge::new(1, 10 + i)));
        let tree = TreeBuilder::from_edges(edges).unwrap();
        let layout = LayoutEngine::new().compute(&tree);
        let coverage = CoveragePropagator::new().propagate(&tree, [(250, CoverageState::Full)]);
        let annotated = AnnotatedTree::new(&tree, &layout, &coverage);

        let engine =
            TilingEngine::new(TilingConfig::default().with_max_nodes_per_tile(50)).unwrap();
        let (tiles, summary) = engine.build_with_summary(&annotated);

        assert!(summary.max_records <= 50);
        assert_eq!(tiles.max_records(), summary.max_records);
        for tile in tiles.iter() {
            let represented: u64 = tile.records.iter().map(TileRecord::represented_nodes).sum();
            assert!(represented >= tile.len() as u64);
        }
        let zoom0 = tiles.get(&TileKey::new(0, 0).unwrap()).unwrap();
        assert_eq!(zoom0.records.len(), 1);
        assert_eq!(zoom0.records[0].aggregate_count, 501);
        assert_eq!(zoom0.records[0].coverage_state, CoverageState::Full);
    }

    #[test]
    fn test_deterministic() {
        let (tree, layout, coverage) = annotate(binary(9));
        let annotated = AnnotatedTree::new(&tree, &layout, &coverage);
        let engine =
            TilingEngine::new(TilingConfig::default().with_max_nodes_per_tile(40)).unwrap();
        assert_eq!(engine.build(&annotated), engine.build(&annotated));
    }
}
