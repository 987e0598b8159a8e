//! Per-tile load state machine.
//!
//! ```text
//! (absent) ──claim──> Pending ──┬──> Cached   (terminal)
//!                               ├──> Absent   (terminal, both formats 404)
//!                               └──> Failed ──claim──> Pending
//! ```
//!
//! Tiles are immutable, so `Cached` and `Absent` are never revisited
//! within a session. `Failed` is retried on the next viewport change.

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::Shared;

use super::fetcher::{BoxFuture, FetchError};
use crate::tile::{Tile, TileFormat, TileKey};

/// One failed fetch or decode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAttempt {
    pub format: TileFormat,
    pub error: String,
    pub not_found: bool,
}

impl FetchAttempt {
    pub(crate) fn fetch(format: TileFormat, error: &FetchError) -> Self {
        Self {
            format,
            error: error.to_string(),
            not_found: error.is_not_found(),
        }
    }

    pub(crate) fn decode(format: TileFormat, error: impl fmt::Display) -> Self {
        Self {
            format,
            error: format!("Decode failed: {error}"),
            not_found: false,
        }
    }
}

/// A tile that could not be loaded in any format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub key: TileKey,
    pub attempts: Vec<FetchAttempt>,
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile {}:", self.key)?;
        for attempt in &self.attempts {
            write!(f, " [{}] {};", attempt.format.name(), attempt.error)?;
        }
        Ok(())
    }
}

/// Result of one fallback fetch sequence.
#[derive(Debug, Clone)]
pub enum SlotOutcome {
    Loaded {
        tile: Arc<Tile>,
        format: TileFormat,
    },
    Absent,
    Failed(LoadFailure),
}

/// In-flight fetch, awaitable by every interested load.
pub type PendingFetch = Shared<BoxFuture<'static, SlotOutcome>>;

/// State of one tile key.
#[derive(Clone)]
pub enum SlotState {
    /// A fetch is in flight, started by the load with `generation`.
    Pending {
        generation: u64,
        fetch: PendingFetch,
    },
    Cached {
        tile: Arc<Tile>,
        format: TileFormat,
    },
    Absent,
    Failed(LoadFailure),
}

impl fmt::Debug for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotState::Pending { generation, .. } => {
                f.debug_struct("Pending").field("generation", generation).finish()
            }
            SlotState::Cached { tile, format } => f
                .debug_struct("Cached")
                .field("records", &tile.len())
                .field("format", format)
                .finish(),
            SlotState::Absent => f.write_str("Absent"),
            SlotState::Failed(failure) => f.debug_tuple("Failed").field(failure).finish(),
        }
    }
}

impl SlotState {
    fn from_outcome(outcome: SlotOutcome) -> Self {
        match outcome {
            SlotOutcome::Loaded { tile, format } => SlotState::Cached { tile, format },
            SlotOutcome::Absent => SlotState::Absent,
            SlotOutcome::Failed(failure) => SlotState::Failed(failure),
        }
    }

    /// Short label for logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            SlotState::Pending { .. } => "pending",
            SlotState::Cached { .. } => "cached",
            SlotState::Absent => "absent",
            SlotState::Failed(_) => "failed",
        }
    }
}

/// What a load should do about one key.
pub(crate) enum Claim {
    /// Already settled; nothing to fetch.
    Settled(SlotState),
    /// Await this in-flight fetch.
    Wait(PendingFetch),
}

/// Slot table shared by the loader and its background fetch tasks.
#[derive(Default)]
pub struct SlotTable {
    slots: DashMap<TileKey, SlotState>,
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `key`; `None` means never requested.
    pub fn get(&self, key: &TileKey) -> Option<SlotState> {
        self.slots.get(key).map(|slot| slot.value().clone())
    }

    /// Number of keys in each state: `(pending, cached, absent, failed)`.
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0);
        for slot in self.slots.iter() {
            match slot.value() {
                SlotState::Pending { .. } => counts.0 += 1,
                SlotState::Cached { .. } => counts.1 += 1,
                SlotState::Absent => counts.2 += 1,
                SlotState::Failed(_) => counts.3 += 1,
            }
        }
        counts
    }

    /// Claim `key` for `generation`.
    ///
    /// Unrequested and failed keys move to `Pending` with the fetch built
    /// by `start`; the returned flag is true when this call started it.
    pub(crate) fn claim<F>(&self, key: TileKey, generation: u64, start: F) -> (Claim, bool)
    where
        F: FnOnce() -> PendingFetch,
    {
        match self.slots.entry(key) {
            Entry::Vacant(vacant) => {
                let fetch = start();
                vacant.insert(SlotState::Pending {
                    generation,
                    fetch: fetch.clone(),
                });
                (Claim::Wait(fetch), true)
            }
            Entry::Occupied(mut occupied) => match occupied.get() {
                SlotState::Pending { fetch, .. } => (Claim::Wait(fetch.clone()), false),
                SlotState::Cached { .. } | SlotState::Absent => {
                    (Claim::Settled(occupied.get().clone()), false)
                }
                SlotState::Failed(_) => {
                    let fetch = start();
                    occupied.insert(SlotState::Pending {
                        generation,
                        fetch: fetch.clone(),
                    });
                    (Claim::Wait(fetch), true)
                }
            },
        }
    }

    /// Record the outcome of a fetch started by `generation`.
    ///
    /// Ignored unless the slot is still pending for that generation, so a
    /// late writer cannot clobber a newer fetch.
    pub(crate) fn settle(&self, key: TileKey, generation: u64, outcome: SlotOutcome) {
        if let Some(mut slot) = self.slots.get_mut(&key) {
            if matches!(slot.value(), SlotState::Pending { generation: g, .. } if *g == generation)
            {
                *slot.value_mut() = SlotState::from_outcome(outcome);
            }
        }
    }
}
