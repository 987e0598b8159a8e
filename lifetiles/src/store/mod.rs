//! Tile store publishing.
//!
//! The pipeline writes a finished [`TileSet`](crate::tile::TileSet) to a
//! directory tree of `{zoom}/{bucket}.{ext}` files plus a `manifest.json`.
//! Publishing is all-or-nothing: tiles are written into a staging
//! directory which replaces the destination only once every file is on
//! disk.

mod directory;
mod manifest;

pub use directory::{DirectoryStore, PublishReport, StoreError};
pub use manifest::{Manifest, ManifestEntry, MANIFEST_FILE, MANIFEST_VERSION};
