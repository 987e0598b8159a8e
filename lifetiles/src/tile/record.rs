//! Tile records and collections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::key::TileKey;
use crate::coverage::CoverageState;
use crate::tree::TaxonId;

/// One node entry in a tile.
///
/// A synthetic aggregate record stands in for a folded subtree: it reuses
/// the subtree root's id and position, and `aggregate_count` is the number
/// of real nodes it replaces. Plain records have `aggregate_count == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileRecord {
    pub id: TaxonId,
    pub parent_id: Option<TaxonId>,
    pub x: f64,
    pub y: f64,
    pub depth: u32,
    pub coverage_state: CoverageState,
    pub name: String,
    pub rank: String,
    #[serde(default)]
    pub is_aggregate: bool,
    #[serde(default)]
    pub aggregate_count: u32,
}

impl TileRecord {
    /// Number of real nodes this record represents (1 for a plain record).
    pub fn represented_nodes(&self) -> u64 {
        if self.is_aggregate {
            self.aggregate_count as u64
        } else {
            1
        }
    }
}

/// One immutable tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub key: TileKey,
    pub records: Vec<TileRecord>,
}

impl Tile {
    /// Create a tile.
    pub fn new(key: TileKey, records: Vec<TileRecord>) -> Self {
        Self { key, records }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the tile has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of aggregate records.
    pub fn aggregate_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_aggregate).count()
    }

    /// Total real nodes represented by the records.
    pub fn represented_nodes(&self) -> u64 {
        self.records.iter().map(TileRecord::represented_nodes).sum()
    }
}

/// The complete output of one tiling run, ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileSet {
    tiles: BTreeMap<TileKey, Tile>,
    source_nodes: usize,
}

impl TileSet {
    /// Create a tile set from tiles produced for a tree of `source_nodes` nodes.
    pub fn new(tiles: impl IntoIterator<Item = Tile>, source_nodes: usize) -> Self {
        Self {
            tiles: tiles.into_iter().map(|t| (t.key, t)).collect(),
            source_nodes,
        }
    }

    /// Tile at `key`, `None` if it was omitted.
    pub fn get(&self, key: &TileKey) -> Option<&Tile> {
        self.tiles.get(key)
    }

    /// All tiles in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Tiles at one zoom level.
    pub fn at_zoom(&self, zoom: u8) -> impl Iterator<Item = &Tile> {
        self.tiles
            .range(TileKey { zoom, bucket: 0 }..=TileKey { zoom, bucket: u32::MAX })
            .map(|(_, t)| t)
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Node count of the tree the tiles were built from.
    pub fn source_nodes(&self) -> usize {
        self.source_nodes
    }

    /// Largest record count of any tile.
    pub fn max_records(&self) -> usize {
        self.tiles.values().map(Tile::len).max().unwrap_or(0)
    }

    /// Sum of record counts.
    pub fn total_records(&self) -> usize {
        self.tiles.values().map(Tile::len).sum()
    }
}
