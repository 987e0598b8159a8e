//! Tile byte sources.
//!
//! A [`TileFetcher`] returns the raw payload of one `(key, format)` pair.
//! Decoding and format fallback live in the loader, so fetchers only deal
//! with transport.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::trace;

use crate::tile::{TileFormat, TileKey};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default request timeout for HTTP fetches.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors fetching tile bytes.
///
/// Clonable so a failure can be kept in the slot table and reported with
/// the frame that rendered the gap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Tile not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Request timed out: {0}")]
    Timeout(String),
}

impl FetchError {
    /// Whether the tile is known not to exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}

/// Source of encoded tile payloads.
pub trait TileFetcher: Send + Sync {
    /// Fetch the payload of `key` in `format`.
    fn fetch(&self, key: TileKey, format: TileFormat) -> BoxFuture<'_, Result<Bytes, FetchError>>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Fetches tiles from a web server serving a published tile tree.
pub struct HttpTileFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTileFetcher {
    /// Create a fetcher for `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a fetcher with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// URL of one tile payload.
    pub fn url_for(&self, key: TileKey, format: TileFormat) -> String {
        format!("{}/{}", self.base_url, key.path(format))
    }
}

impl TileFetcher for HttpTileFetcher {
    fn fetch(&self, key: TileKey, format: TileFormat) -> BoxFuture<'_, Result<Bytes, FetchError>> {
        let url = self.url_for(key, format);
        Box::pin(async move {
            trace!(url = %url, "HTTP tile request");
            let response = self.client.get(&url).send().await.map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(url.clone())
                } else {
                    FetchError::Transport(format!("Request to {} failed: {}", url, e))
                }
            })?;

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(FetchError::NotFound(url));
            }
            if !status.is_success() {
                return Err(FetchError::Http {
                    url,
                    status: status.as_u16(),
                });
            }

            response
                .bytes()
                .await
                .map_err(|e| FetchError::Transport(format!("Failed to read response: {}", e)))
        })
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// Reads tiles from a local published tile tree.
#[derive(Debug, Clone)]
pub struct DirTileFetcher {
    root: PathBuf,
}

impl DirTileFetcher {
    /// Create a fetcher rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TileFetcher for DirTileFetcher {
    fn fetch(&self, key: TileKey, format: TileFormat) -> BoxFuture<'_, Result<Bytes, FetchError>> {
        let path = self.root.join(key.path(format));
        Box::pin(async move {
            match tokio::fs::read(&path).await {
                Ok(data) => Ok(Bytes::from(data)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(FetchError::NotFound(path.display().to_string()))
                }
                Err(e) => Err(FetchError::Io(format!("{}: {}", path.display(), e))),
            }
        })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
