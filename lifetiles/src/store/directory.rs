//! Staged directory publisher.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::manifest::{Manifest, MANIFEST_FILE};
use crate::tile::{CodecError, Tile, TileFormat, TileSet};
use crate::tiling::TilingConfig;

/// Errors from publishing a tile tree.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No tile formats configured")]
    NoFormats,

    #[error("Output path has no parent directory: {0}")]
    InvalidRoot(PathBuf),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode tile {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: CodecError,
    },

    #[error("Failed to write manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub root: PathBuf,
    pub tiles: usize,
    pub files: usize,
    pub bytes: u64,
}

/// Publishes tile sets to a directory tree.
///
/// ```text
/// <root>/manifest.json
/// <root>/<zoom>/<bucket>.bin
/// <root>/<zoom>/<bucket>.json
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    formats: Vec<TileFormat>,
}

impl DirectoryStore {
    /// Store writing both encodings under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            formats: TileFormat::ALL.to_vec(),
        }
    }

    /// Restrict the encodings written.
    pub fn with_formats(mut self, formats: Vec<TileFormat>) -> Self {
        self.formats = formats;
        self
    }

    /// Destination directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Encodings written.
    pub fn formats(&self) -> &[TileFormat] {
        &self.formats
    }

    /// Write `tiles` and swap them into place.
    ///
    /// Nothing under `root` changes unless every tile and the manifest were
    /// written successfully.
    pub fn publish(
        &self,
        tiles: &TileSet,
        config: &TilingConfig,
    ) -> Result<PublishReport, StoreError> {
        if self.formats.is_empty() {
            return Err(StoreError::NoFormats);
        }
        let staging = self.sibling("staging")?;
        let previous = self.sibling("previous")?;

        remove_if_exists(&staging)?;
        let result = self.write_staging(&staging, tiles, config);
        let (files, bytes) = match result {
            Ok(counts) => counts,
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&staging) {
                    warn!(path = %staging.display(), error = %cleanup, "Failed to clean staging directory");
                }
                return Err(e);
            }
        };

        self.swap_into_place(&staging, &previous)?;

        info!(
            root = %self.root.display(),
            tiles = tiles.len(),
            files,
            bytes,
            "Tile set published"
        );

        Ok(PublishReport {
            root: self.root.clone(),
            tiles: tiles.len(),
            files,
            bytes,
        })
    }

    fn write_staging(
        &self,
        staging: &Path,
        tiles: &TileSet,
        config: &TilingConfig,
    ) -> Result<(usize, u64), StoreError> {
        fs::create_dir_all(staging).map_err(|e| StoreError::io(staging, e))?;
        for zoom in tiles.iter().map(|t| t.key.zoom) {
            let dir = staging.join(zoom.to_string());
            if !dir.exists() {
                fs::create_dir(&dir).map_err(|e| StoreError::io(&dir, e))?;
            }
        }

        let all: Vec<&Tile> = tiles.iter().collect();
        let bytes = all
            .par_iter()
            .map(|tile| self.write_tile(staging, tile))
            .try_reduce(|| 0u64, |a, b| Ok(a + b))?;

        let manifest = Manifest::describe(tiles, config, &self.formats);
        let mut json = serde_json::to_vec_pretty(&manifest)?;
        json.push(b'\n');
        let manifest_path = staging.join(MANIFEST_FILE);
        fs::write(&manifest_path, &json).map_err(|e| StoreError::io(&manifest_path, e))?;

        let files = tiles.len() * self.formats.len() + 1;
        Ok((files, bytes + json.len() as u64))
    }

    fn write_tile(&self, staging: &Path, tile: &Tile) -> Result<u64, StoreError> {
        let mut written = 0u64;
        for &format in &self.formats {
            let payload = format
                .encode(&tile.records)
                .map_err(|source| StoreError::Encode {
                    key: tile.key.to_string(),
                    source,
                })?;
            let path = staging.join(tile.key.path(format));
            fs::write(&path, &payload).map_err(|e| StoreError::io(&path, e))?;
            written += payload.len() as u64;
        }
        debug!(tile = %tile.key, bytes = written, "Tile written");
        Ok(written)
    }

    fn swap_into_place(&self, staging: &Path, previous: &Path) -> Result<(), StoreError> {
        let replacing = self.root.exists();
        if replacing {
            remove_if_exists(previous)?;
            fs::rename(&self.root, previous).map_err(|e| StoreError::io(&self.root, e))?;
        }

        if let Err(e) = fs::rename(staging, &self.root) {
            if replacing {
                // Put the old tree back before reporting.
                if let Err(restore) = fs::rename(previous, &self.root) {
                    warn!(path = %self.root.display(), error = %restore, "Failed to restore previous tile tree");
                }
            }
            return Err(StoreError::io(&self.root, e));
        }

        if replacing {
            if let Err(e) = fs::remove_dir_all(previous) {
                warn!(path = %previous.display(), error = %e, "Failed to remove previous tile tree");
            }
        }
        Ok(())
    }

    /// Hidden sibling of the root used during publishing.
    fn sibling(&self, suffix: &str) -> Result<PathBuf, StoreError> {
        let name = self
            .root
            .file_name()
            .ok_or_else(|| StoreError::InvalidRoot(self.root.clone()))?;
        let parent = match self.root.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            Some(_) => PathBuf::from("."),
            None => return Err(StoreError::InvalidRoot(self.root.clone())),
        };
        Ok(parent.join(format!(".{}.{suffix}", name.to_string_lossy())))
    }
}

fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}
