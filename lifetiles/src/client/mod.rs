//! Client-side tile loading.
//!
//! The [`ClientTileLoader`] turns a viewport into the set of intersecting
//! tile keys, fetches each key at most once per session through a
//! [`TileFetcher`], and assembles a [`RenderFrame`]. Columnar payloads are
//! tried first with the text encoding as fallback; a tile that fails in
//! both is reported and rendered as a gap.

mod debounce;
mod fetcher;
mod loader;
mod slot;
mod viewport;

pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use fetcher::{BoxFuture, DirTileFetcher, FetchError, HttpTileFetcher, TileFetcher, DEFAULT_TIMEOUT};
pub use loader::{ClientTileLoader, LoaderConfig, RenderEdge, RenderFrame};
pub use slot::{FetchAttempt, LoadFailure, PendingFetch, SlotOutcome, SlotState, SlotTable};
pub use viewport::Viewport;
