//! Integration tests for the tile generation pipeline.
//!
//! These tests drive the full flow:
//! - TSV input → tree → layout → coverage → tiles
//! - publishing to a directory tree and reading it back
//! - determinism of the published bytes
//!
//! Run with: `cargo test --test pipeline_integration`

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use lifetiles::coverage::CoverageState;
use lifetiles::pipeline::{Pipeline, PipelineConfig};
use lifetiles::source::{read_edges, read_observations};
use lifetiles::store::{DirectoryStore, Manifest};
use lifetiles::tile::{TileFormat, TileKey, TileRecord};
use lifetiles::tiling::TilingConfig;
use lifetiles::tree::Edge;

// ============================================================================
// Helper Functions
// ============================================================================

/// Synthetic taxonomy: 3 phyla × 8 families × 30 species, plus a 5-deep
/// unbranched lineage (900..=904) ending in species 999.
fn taxonomy_tsv() -> String {
    let mut tsv = String::from("parent_id\tid\tname\trank\n");
    tsv.push_str("\t1\tLife\tno rank\n");
    for phylum in 0..3 {
        let phylum_id = 10 + phylum;
        tsv.push_str(&format!("1\t{phylum_id}\tPhylum {phylum}\tphylum\n"));
        for family in 0..8 {
            let family_id = 1_000 + phylum * 100 + family;
            tsv.push_str(&format!("{phylum_id}\t{family_id}\tFamily {family_id}\tfamily\n"));
            for species in 0..30 {
                let species_id = 100_000 + family_id * 100 + species;
                tsv.push_str(&format!(
                    "{family_id}\t{species_id}\tSpecies {species_id}\tspecies\n"
                ));
            }
        }
    }
    let mut parent = 1;
    for link in 0..5 {
        let id = 900 + link;
        tsv.push_str(&format!("{parent}\t{id}\tLineage {link}\tclade\n"));
        parent = id;
    }
    tsv.push_str(&format!("{parent}\t999\tLone species\tspecies\n"));
    tsv
}

fn coverage_tsv() -> &'static str {
    "taxid\thas_assembly\thas_annotation\thas_reads\n\
     200000\t1\t1\t1\n\
     210100\t1\t0\t0\n\
     999\t0\t0\t1\n"
}

fn inputs() -> (Vec<Edge>, Vec<(i64, CoverageState)>) {
    let edges = read_edges(taxonomy_tsv().as_bytes()).unwrap();
    let observations = read_observations(coverage_tsv().as_bytes()).unwrap();
    (edges, observations)
}

/// All files under `root`, relative path → bytes.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut files = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let relative = path.strip_prefix(root).unwrap().to_path_buf();
                files.insert(relative, fs::read(&path).unwrap());
            }
        }
    }
    files
}

fn read_tile(root: &Path, key: TileKey, format: TileFormat) -> Vec<TileRecord> {
    let bytes = fs::read(root.join(key.path(format))).unwrap();
    format.decode(&bytes).unwrap()
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[test]
fn test_publish_is_byte_identical_across_runs() {
    let temp = TempDir::new().unwrap();
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();

    let first = temp.path().join("first");
    let second = temp.path().join("second");
    let (edges, observations) = inputs();
    pipeline
        .run_and_publish(edges, observations, &DirectoryStore::new(&first))
        .unwrap();
    let (edges, observations) = inputs();
    pipeline
        .run_and_publish(edges, observations, &DirectoryStore::new(&second))
        .unwrap();

    let a = snapshot(&first);
    let b = snapshot(&second);
    assert!(!a.is_empty());
    assert_eq!(a.keys().collect::<Vec<_>>(), b.keys().collect::<Vec<_>>());
    for (path, bytes) in &a {
        assert_eq!(bytes, &b[path], "differs: {}", path.display());
    }
}

#[test]
fn test_published_tree_matches_manifest() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("tiles");
    let (edges, observations) = inputs();
    let (output, report) = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run_and_publish(edges, observations, &DirectoryStore::new(&root))
        .unwrap();

    let manifest = Manifest::load(&root).unwrap();
    assert_eq!(manifest.source_nodes, output.tree.len());
    assert_eq!(manifest.tiles.len(), report.tiles);
    assert_eq!(manifest.max_zoom, 7);

    for entry in &manifest.tiles {
        let key = TileKey::new(entry.zoom, entry.bucket).unwrap();
        let columnar = read_tile(&root, key, TileFormat::Columnar);
        let text = read_tile(&root, key, TileFormat::Text);
        assert_eq!(columnar, text, "encodings disagree for {key}");
        assert_eq!(columnar.len(), entry.records);
        assert!(!columnar.is_empty());
    }
}

#[test]
fn test_every_tile_respects_budget() {
    let config = PipelineConfig::default()
        .with_tiling(TilingConfig::default().with_max_nodes_per_tile(25));
    let (edges, observations) = inputs();
    let output = Pipeline::new(config).unwrap().run(edges, observations).unwrap();

    for tile in output.tiles.iter() {
        assert!(tile.len() <= 25, "tile {} has {} records", tile.key, tile.len());
    }
    assert!(output.summary.lod.aggregated > 0);
}

#[test]
fn test_lineage_chain_is_collapsed() {
    let (edges, observations) = inputs();
    let output = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run(edges, observations)
        .unwrap();

    // The lineage and its species share the last bucket at zoom 7, so the
    // interior links drop out and 999 hangs directly off 900.
    let lone = output
        .tiles
        .at_zoom(7)
        .flat_map(|t| t.records.iter())
        .find(|r| r.id == 999)
        .unwrap();
    assert_eq!(lone.parent_id, Some(900));
    assert!(!output
        .tiles
        .at_zoom(7)
        .flat_map(|t| t.records.iter())
        .any(|r| (901..=904).contains(&r.id)));
    assert!(output.summary.lod.collapsed > 0);
}

#[test]
fn test_coverage_reaches_root() {
    let (edges, observations) = inputs();
    let output = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run(edges, observations)
        .unwrap();

    let root = output
        .tiles
        .get(&TileKey::new(0, 0).unwrap())
        .unwrap()
        .records
        .iter()
        .find(|r| r.id == 1)
        .unwrap()
        .clone();
    assert_eq!(root.coverage_state, CoverageState::Full);
}

#[test]
fn test_wide_bucket_is_aggregated_to_budget() {
    // One root with 24,999 leaf children: 25,000 nodes, all in bucket 0 at
    // zoom 0.
    let mut edges = vec![Edge::root(1)];
    edges.extend((0..24_999).map(|i| Edge::new(1, 10 + i)));
    let output = Pipeline::new(PipelineConfig::default().with_tiling(
        TilingConfig::default().with_max_zoom(0),
    ))
    .unwrap()
    .run(edges, Vec::new())
    .unwrap();

    let tile = output.tiles.get(&TileKey::new(0, 0).unwrap()).unwrap();
    assert!(tile.len() <= 20_000);
    assert_eq!(tile.represented_nodes(), 25_000);
}

#[test]
fn test_single_node_tree() {
    let output = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run(vec![Edge::root(42)], Vec::new())
        .unwrap();

    assert_eq!(output.tiles.len(), 8);
    for zoom in 0..=7 {
        let tiles: Vec<_> = output.tiles.at_zoom(zoom).collect();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].key.bucket, 0);
        assert_eq!(tiles[0].records[0].id, 42);
    }
}
