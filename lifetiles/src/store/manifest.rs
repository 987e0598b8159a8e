//! Tile set manifest.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::tile::{TileFormat, TileSet};
use crate::tiling::TilingConfig;

/// File name of the manifest inside a published tile tree.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Manifest layout version.
pub const MANIFEST_VERSION: u32 = 1;

/// One emitted tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub zoom: u8,
    pub bucket: u32,
    pub records: usize,
}

/// Description of a published tile tree.
///
/// Contains no timestamps so identical input publishes identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub source_nodes: usize,
    pub max_zoom: u8,
    pub depth_margin: u32,
    pub max_nodes_per_tile: usize,
    pub collapse_chains: bool,
    pub aggregation_order: String,
    /// Format names, in fetch preference order.
    pub formats: Vec<String>,
    /// Tiles in `(zoom, bucket)` order.
    pub tiles: Vec<ManifestEntry>,
}

impl Manifest {
    /// Describe `tiles` produced with `config`.
    pub fn describe(tiles: &TileSet, config: &TilingConfig, formats: &[TileFormat]) -> Self {
        Self {
            version: MANIFEST_VERSION,
            source_nodes: tiles.source_nodes(),
            max_zoom: config.max_zoom,
            depth_margin: config.depth_margin,
            max_nodes_per_tile: config.max_nodes_per_tile,
            collapse_chains: config.collapse_chains,
            aggregation_order: config.aggregation_order.name().to_string(),
            formats: formats.iter().map(|f| f.name().to_string()).collect(),
            tiles: tiles
                .iter()
                .map(|tile| ManifestEntry {
                    zoom: tile.key.zoom,
                    bucket: tile.key.bucket,
                    records: tile.len(),
                })
                .collect(),
        }
    }

    /// Read `manifest.json` from a published tile tree.
    pub fn load(root: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(root.join(MANIFEST_FILE))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Total records across all tiles.
    pub fn total_records(&self) -> usize {
        self.tiles.iter().map(|t| t.records).sum()
    }
}
