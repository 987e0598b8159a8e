//! Tile schema, addressing and physical encodings.
//!
//! A tile is addressed by `(zoom, bucket)` where `bucket = floor(y * 2^zoom)`
//! partitions the normalized ordinate into `2^zoom` equal bands. Both the
//! tiling engine and the client loader derive keys from this scheme; there
//! is no other index.
//!
//! # Addressing
//!
//! ```text
//! zoom 0: [           0           ]
//! zoom 1: [     0     |     1     ]
//! zoom 2: [  0  |  1  |  2  |  3  ]
//!          y=0.0                 y=1.0
//! ```
//!
//! Paths take the form `{zoom}/{bucket}.{ext}`.
//!
//! # Encodings
//!
//! The same logical record list is written in two interchangeable forms:
//! - [`TileFormat::Columnar`] - gzip-compressed bincode column vectors
//! - [`TileFormat::Text`] - a JSON array of records

mod codec;
mod key;
mod record;

pub use codec::{CodecError, TileFormat};
pub use key::{bucket_count, bucket_for, TileKey, TileKeyError, MAX_ZOOM, MIN_ZOOM};
pub use record::{Tile, TileRecord, TileSet};
