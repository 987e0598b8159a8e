//! Integration tests for the client tile loader against a published tree.
//!
//! These tests verify:
//! - loading the full tree at zoom 0 from a local directory
//! - partial viewports at deeper zooms
//! - columnar → text fallback when a payload is missing or corrupt
//! - absent tiles rendered without failing the frame
//!
//! Run with: `cargo test --test client_integration`

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use lifetiles::client::{ClientTileLoader, DirTileFetcher, LoaderConfig, SlotState, Viewport};
use lifetiles::pipeline::{Pipeline, PipelineConfig};
use lifetiles::store::DirectoryStore;
use lifetiles::tile::{TileFormat, TileKey};
use lifetiles::tree::Edge;

// ============================================================================
// Helper Functions
// ============================================================================

/// Balanced tree: root → 4 orders → 4 families → 8 species (133 nodes).
fn edges() -> Vec<Edge> {
    let mut edges = vec![Edge::root(1).with_name("root")];
    for order in 0..4 {
        let order_id = 10 + order;
        edges.push(Edge::new(1, order_id).with_rank("order"));
        for family in 0..4 {
            let family_id = 100 + order * 10 + family;
            edges.push(Edge::new(order_id, family_id).with_rank("family"));
            for species in 0..8 {
                edges.push(Edge::new(family_id, 10_000 + family_id * 10 + species));
            }
        }
    }
    edges
}

fn publish(root: &Path) -> usize {
    let (output, _) = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run_and_publish(edges(), Vec::new(), &DirectoryStore::new(root))
        .unwrap();
    output.tree.len()
}

fn loader(root: &Path) -> ClientTileLoader {
    ClientTileLoader::new(Arc::new(DirTileFetcher::new(root)))
}

// ============================================================================
// Loader Tests
// ============================================================================

#[tokio::test]
async fn test_full_view_at_zoom_zero() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("tiles");
    let nodes = publish(&root);

    let frame = loader(&root).load(Viewport::full()).await.unwrap();
    assert!(frame.is_complete());
    assert_eq!(frame.zoom, 0);
    // Depth 3 is within the zoom-0 margin, so every node is present.
    assert_eq!(frame.node_count(), nodes);
    // Every non-root node has its parent loaded.
    assert_eq!(frame.edges.len(), nodes - 1);
}

#[tokio::test]
async fn test_partial_viewport_loads_only_intersecting_tiles() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("tiles");
    publish(&root);

    let loader = loader(&root);
    let frame = loader.load(Viewport::new(0.0, 0.2, 3.0)).await.unwrap();
    assert_eq!(frame.zoom, 3);
    let keys: Vec<TileKey> = frame.tiles.iter().map(|t| t.key).collect();
    assert_eq!(keys, vec![TileKey::new(3, 0).unwrap(), TileKey::new(3, 1).unwrap()]);
    assert!(frame.nodes().all(|r| r.y < 0.25));
    assert!(loader.slots().get(&TileKey::new(3, 5).unwrap()).is_none());
}

#[tokio::test]
async fn test_fallback_to_text_when_columnar_missing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("tiles");
    publish(&root);
    fs::remove_file(root.join("0/0.bin")).unwrap();

    let loader = loader(&root);
    let frame = loader.load(Viewport::full()).await.unwrap();
    assert!(frame.is_complete());
    assert!(frame.node_count() > 0);
    assert!(matches!(
        loader.slots().get(&TileKey::new(0, 0).unwrap()),
        Some(SlotState::Cached {
            format: TileFormat::Text,
            ..
        })
    ));
}

#[tokio::test]
async fn test_corrupt_payloads_render_gap() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("tiles");
    publish(&root);
    fs::write(root.join("0/0.bin"), b"not a tile").unwrap();
    fs::write(root.join("0/0.json"), b"{").unwrap();

    let frame = loader(&root).load(Viewport::full()).await.unwrap();
    assert!(!frame.is_complete());
    assert_eq!(frame.gaps.len(), 1);
    assert_eq!(frame.gaps[0].key, TileKey::new(0, 0).unwrap());
    assert_eq!(frame.node_count(), 0);
}

#[tokio::test]
async fn test_missing_tile_is_absent() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("tiles");
    publish(&root);
    fs::remove_file(root.join("0/0.bin")).unwrap();
    fs::remove_file(root.join("0/0.json")).unwrap();

    let frame = loader(&root).load(Viewport::full()).await.unwrap();
    assert!(frame.is_complete());
    assert_eq!(frame.absent, vec![TileKey::new(0, 0).unwrap()]);
}

#[tokio::test]
async fn test_driven_by_viewport_channel() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("tiles");
    publish(&root);

    let config = LoaderConfig::default().with_debounce(Duration::from_millis(10));
    let loader = Arc::new(ClientTileLoader::with_config(
        Arc::new(DirTileFetcher::new(&root)),
        config,
    ));
    let (viewport_tx, viewport_rx) = mpsc::channel(4);
    let (frame_tx, mut frame_rx) = mpsc::channel(4);
    let shutdown = CancellationToken::new();
    let driver = tokio::spawn(Arc::clone(&loader).run(viewport_rx, frame_tx, shutdown.clone()));

    viewport_tx.send(Viewport::new(0.4, 0.6, 1.0)).await.unwrap();
    let frame = tokio::time::timeout(Duration::from_secs(5), frame_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frame.zoom, 1);
    assert_eq!(frame.tiles.len(), 2);

    shutdown.cancel();
    driver.await.unwrap();
}
