//! Viewport-driven tile loading.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{join_all, FutureExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::debounce::{Debouncer, DEFAULT_DEBOUNCE};
use super::fetcher::{BoxFuture, TileFetcher};
use super::slot::{Claim, FetchAttempt, LoadFailure, PendingFetch, SlotOutcome, SlotState, SlotTable};
use super::viewport::Viewport;
use crate::tile::{Tile, TileFormat, TileKey, TileRecord};
use crate::tree::TaxonId;

/// Loader settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Formats tried for each tile, in order.
    pub formats: Vec<TileFormat>,
    /// Viewport coalescing window for [`ClientTileLoader::run`].
    pub debounce: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            formats: TileFormat::ALL.to_vec(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl LoaderConfig {
    pub fn with_formats(mut self, formats: Vec<TileFormat>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// An edge drawn between two loaded nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderEdge {
    pub parent_id: TaxonId,
    pub child_id: TaxonId,
    pub from: (f64, f64),
    pub to: (f64, f64),
}

/// Everything needed to draw one settled viewport.
#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub viewport: Viewport,
    pub zoom: u8,
    pub generation: u64,
    /// Loaded tiles, in bucket order.
    pub tiles: Vec<Arc<Tile>>,
    /// Edges whose endpoints are both loaded.
    pub edges: Vec<RenderEdge>,
    /// Tiles that failed in every format; drawn as gaps.
    pub gaps: Vec<LoadFailure>,
    /// Tiles known not to exist.
    pub absent: Vec<TileKey>,
}

impl RenderFrame {
    fn assemble(
        viewport: Viewport,
        generation: u64,
        resolved: BTreeMap<TileKey, SlotOutcome>,
    ) -> Self {
        let mut tiles = Vec::new();
        let mut gaps = Vec::new();
        let mut absent = Vec::new();
        for (key, outcome) in resolved {
            match outcome {
                SlotOutcome::Loaded { tile, .. } => tiles.push(tile),
                SlotOutcome::Absent => absent.push(key),
                SlotOutcome::Failed(failure) => gaps.push(failure),
            }
        }

        let positions: HashMap<TaxonId, (f64, f64)> = tiles
            .iter()
            .flat_map(|tile| tile.records.iter())
            .map(|r| (r.id, (r.x, r.y)))
            .collect();
        let edges = tiles
            .iter()
            .flat_map(|tile| tile.records.iter())
            .filter_map(|r| {
                let parent = r.parent_id?;
                let from = *positions.get(&parent)?;
                Some(RenderEdge {
                    parent_id: parent,
                    child_id: r.id,
                    from,
                    to: (r.x, r.y),
                })
            })
            .collect();

        Self {
            viewport,
            zoom: viewport.zoom_level(),
            generation,
            tiles,
            edges,
            gaps,
            absent,
        }
    }

    /// All loaded records.
    pub fn nodes(&self) -> impl Iterator<Item = &TileRecord> {
        self.tiles.iter().flat_map(|tile| tile.records.iter())
    }

    /// Number of loaded records.
    pub fn node_count(&self) -> usize {
        self.tiles.iter().map(|tile| tile.len()).sum()
    }

    /// True when no tile failed.
    pub fn is_complete(&self) -> bool {
        self.gaps.is_empty()
    }
}

/// Fetches, caches and renders the tiles intersecting a viewport.
///
/// Each call to [`load`](Self::load) bumps a generation counter. Fetches
/// from a superseded call still complete and fill the cache, but that call
/// returns `None` instead of a frame.
pub struct ClientTileLoader {
    fetcher: Arc<dyn TileFetcher>,
    slots: Arc<SlotTable>,
    generation: AtomicU64,
    config: LoaderConfig,
}

impl ClientTileLoader {
    /// Loader with the default configuration.
    pub fn new(fetcher: Arc<dyn TileFetcher>) -> Self {
        Self::with_config(fetcher, LoaderConfig::default())
    }

    pub fn with_config(fetcher: Arc<dyn TileFetcher>, config: LoaderConfig) -> Self {
        Self {
            fetcher,
            slots: Arc::new(SlotTable::new()),
            generation: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Slot table, for inspection.
    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// Generation of the most recent load.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Load every tile intersecting `viewport`.
    ///
    /// Returns `None` if another load started before this one finished.
    pub async fn load(&self, viewport: Viewport) -> Option<RenderFrame> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let keys = viewport.tile_keys();

        let mut resolved = BTreeMap::new();
        let mut waiting = Vec::new();
        let mut started = 0usize;
        for key in keys {
            let (claim, is_new) = self
                .slots
                .claim(key, generation, || self.start_fetch(key));
            match claim {
                Claim::Settled(state) => {
                    if let Some(outcome) = settled_outcome(state) {
                        resolved.insert(key, outcome);
                    }
                }
                Claim::Wait(fetch) => {
                    if is_new {
                        started += 1;
                        self.spawn_settle(key, generation, fetch.clone());
                    }
                    waiting.push(async move { (key, is_new, fetch.await) });
                }
            }
        }
        debug!(
            generation,
            zoom = viewport.zoom_level(),
            cached = resolved.len(),
            waiting = waiting.len(),
            started,
            "Viewport load"
        );

        for (key, is_new, outcome) in join_all(waiting).await {
            if is_new {
                self.slots.settle(key, generation, outcome.clone());
            }
            resolved.insert(key, outcome);
        }

        let current = self.generation.load(Ordering::SeqCst);
        if current != generation {
            debug!(generation, current, "Viewport superseded, frame dropped");
            return None;
        }

        let frame = RenderFrame::assemble(viewport, generation, resolved);
        for gap in &frame.gaps {
            warn!(tile = %gap.key, failure = %gap, "Tile unavailable, rendering gap");
        }
        Some(frame)
    }

    /// Drive the loader from a stream of viewport changes until `shutdown`
    /// fires or the input closes.
    ///
    /// Inputs are debounced; every settled viewport that is still current
    /// when its tiles arrive produces one frame on `frames`.
    pub async fn run(
        self: Arc<Self>,
        viewports: mpsc::Receiver<Viewport>,
        frames: mpsc::Sender<RenderFrame>,
        shutdown: CancellationToken,
    ) {
        let mut debouncer = Debouncer::new(viewports, self.config.debounce);
        info!(source = %self.fetcher.describe(), "Tile loader started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Tile loader shutting down");
                    break;
                }

                viewport = debouncer.next() => {
                    let Some(viewport) = viewport else {
                        debug!("Viewport input closed");
                        break;
                    };
                    let loader = Arc::clone(&self);
                    let frames = frames.clone();
                    tokio::spawn(async move {
                        if let Some(frame) = loader.load(viewport).await {
                            let _ = frames.send(frame).await;
                        }
                    });
                }
            }
        }
    }

    fn start_fetch(&self, key: TileKey) -> PendingFetch {
        let fetcher = Arc::clone(&self.fetcher);
        let formats = self.config.formats.clone();
        let fetch: BoxFuture<'static, SlotOutcome> =
            Box::pin(fetch_with_fallback(fetcher, key, formats));
        fetch.shared()
    }

    /// Settle the slot even if every interested load is dropped.
    fn spawn_settle(&self, key: TileKey, generation: u64, fetch: PendingFetch) {
        let slots = Arc::clone(&self.slots);
        tokio::spawn(async move {
            let outcome = fetch.await;
            slots.settle(key, generation, outcome);
        });
    }
}

fn settled_outcome(state: SlotState) -> Option<SlotOutcome> {
    match state {
        SlotState::Cached { tile, format } => Some(SlotOutcome::Loaded { tile, format }),
        SlotState::Absent => Some(SlotOutcome::Absent),
        SlotState::Failed(failure) => Some(SlotOutcome::Failed(failure)),
        SlotState::Pending { .. } => None,
    }
}

/// Try each format in turn; the first payload that decodes wins.
async fn fetch_with_fallback(
    fetcher: Arc<dyn TileFetcher>,
    key: TileKey,
    formats: Vec<TileFormat>,
) -> SlotOutcome {
    let mut attempts = Vec::with_capacity(formats.len());
    for format in formats {
        let attempt = match fetcher.fetch(key, format).await {
            Ok(bytes) => match format.decode(&bytes) {
                Ok(records) => {
                    if !attempts.is_empty() {
                        debug!(tile = %key, format = format.name(), "Loaded via fallback format");
                    }
                    return SlotOutcome::Loaded {
                        tile: Arc::new(Tile::new(key, records)),
                        format,
                    };
                }
                Err(e) => FetchAttempt::decode(format, e),
            },
            Err(e) => FetchAttempt::fetch(format, &e),
        };
        debug!(tile = %key, format = format.name(), error = %attempt.error, "Tile attempt failed");
        attempts.push(attempt);
    }

    if !attempts.is_empty() && attempts.iter().all(|a| a.not_found) {
        SlotOutcome::Absent
    } else {
        SlotOutcome::Failed(LoadFailure { key, attempts })
    }
}
