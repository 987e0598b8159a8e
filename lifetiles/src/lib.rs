//! LifeTiles - level-of-detail tiles for very large taxonomies
//!
//! This library turns a rooted, labeled tree with millions of nodes into a
//! set of zoom-leveled, bounded-size tiles that a map-style client can
//! stream incrementally, and provides the client-side loader that consumes
//! them.
//!
//! # Pipeline
//!
//! ```text
//! edges ──► TreeBuilder ──► LayoutEngine ──► CoveragePropagator ──► TilingEngine ──► TileStore
//!                                                                                      │
//!                                                              TileLoader (client) ◄───┘
//! ```
//!
//! Each stage is a pure function of its input plus configuration. See
//! [`pipeline::Pipeline`] for the orchestrated run.

pub mod client;
pub mod config;
pub mod coverage;
pub mod layout;
pub mod logging;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod tile;
pub mod tiling;
pub mod tree;

/// Version of the LifeTiles library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
