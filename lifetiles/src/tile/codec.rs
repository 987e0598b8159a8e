//! Columnar and text tile encodings.
//!
//! Both encodings carry the identical logical schema
//! (`id, parent_id, x, y, depth, coverage_state, name, rank, is_aggregate,
//! aggregate_count`) and are interchangeable: decoding either yields the
//! same record list.
//!
//! # Columnar layout
//!
//! ```text
//! ┌──────────┬──────────────────────────────────────────┐
//! │ "LTC1"   │ gzip( bincode( ColumnarTile ) )          │
//! └──────────┴──────────────────────────────────────────┘
//! ```
//!
//! Encoding is deterministic: the gzip header carries no timestamp, so the
//! same records always produce the same bytes.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::record::TileRecord;
use crate::coverage::{CoverageState, InvalidCoverageState};
use crate::tree::TaxonId;

/// Magic prefix of the columnar encoding.
const COLUMNAR_MAGIC: &[u8; 4] = b"LTC1";

/// Upper bound on a decompressed columnar payload (256 MB).
const MAX_DECODED_BYTES: u64 = 256 * 1024 * 1024;

/// Errors from encoding or decoding tiles.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Columnar payload does not start with the expected magic.
    #[error("Not a columnar tile (bad magic)")]
    BadMagic,

    /// Gzip stream is corrupt.
    #[error("Decompression failed: {0}")]
    Decompress(#[source] std::io::Error),

    /// Payload exceeds the decode size limit.
    #[error("Decoded payload exceeds the 256 MB limit")]
    TooLarge,

    /// Bincode (de)serialization failed.
    #[error("Columnar codec error: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON (de)serialization failed.
    #[error("Text codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Column vectors have different lengths.
    #[error("Column '{column}' has {actual} entries, expected {expected}")]
    ColumnLengthMismatch {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A coverage byte is out of range.
    #[error(transparent)]
    Coverage(#[from] InvalidCoverageState),

    /// Writing the compressed stream failed.
    #[error("Compression failed: {0}")]
    Compress(#[source] std::io::Error),
}

/// Physical tile encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileFormat {
    /// Compact columnar binary.
    Columnar,
    /// JSON array of records.
    Text,
}

impl TileFormat {
    /// Both formats, in client preference order.
    pub const ALL: [TileFormat; 2] = [TileFormat::Columnar, TileFormat::Text];

    /// File extension.
    pub fn extension(self) -> &'static str {
        match self {
            TileFormat::Columnar => "bin",
            TileFormat::Text => "json",
        }
    }

    /// Format for a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "bin" => Some(TileFormat::Columnar),
            "json" => Some(TileFormat::Text),
            _ => None,
        }
    }

    /// Short name used in configuration.
    pub fn name(self) -> &'static str {
        match self {
            TileFormat::Columnar => "columnar",
            TileFormat::Text => "text",
        }
    }

    /// Parse a configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "columnar" | "bin" => Some(TileFormat::Columnar),
            "text" | "json" => Some(TileFormat::Text),
            _ => None,
        }
    }

    /// Encode records.
    pub fn encode(self, records: &[TileRecord]) -> Result<Vec<u8>, CodecError> {
        match self {
            TileFormat::Columnar => encode_columnar(records),
            TileFormat::Text => Ok(serde_json::to_vec(records)?),
        }
    }

    /// Decode records.
    pub fn decode(self, bytes: &[u8]) -> Result<Vec<TileRecord>, CodecError> {
        match self {
            TileFormat::Columnar => decode_columnar(bytes),
            TileFormat::Text => Ok(serde_json::from_slice(bytes)?),
        }
    }
}

/// Column-major form of a record list.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ColumnarTile {
    ids: Vec<TaxonId>,
    parent_ids: Vec<Option<TaxonId>>,
    xs: Vec<f64>,
    ys: Vec<f64>,
    depths: Vec<u32>,
    coverage: Vec<u8>,
    names: Vec<String>,
    ranks: Vec<String>,
    is_aggregate: Vec<bool>,
    aggregate_counts: Vec<u32>,
}

impl ColumnarTile {
    fn from_records(records: &[TileRecord]) -> Self {
        let mut columns = ColumnarTile::default();
        for r in records {
            columns.ids.push(r.id);
            columns.parent_ids.push(r.parent_id);
            columns.xs.push(r.x);
            columns.ys.push(r.y);
            columns.depths.push(r.depth);
            columns.coverage.push(r.coverage_state.as_u8());
            columns.names.push(r.name.clone());
            columns.ranks.push(r.rank.clone());
            columns.is_aggregate.push(r.is_aggregate);
            columns.aggregate_counts.push(r.aggregate_count);
        }
        columns
    }

    fn check_lengths(&self) -> Result<usize, CodecError> {
        let expected = self.ids.len();
        let lengths = [
            ("parent_id", self.parent_ids.len()),
            ("x", self.xs.len()),
            ("y", self.ys.len()),
            ("depth", self.depths.len()),
            ("coverage_state", self.coverage.len()),
            ("name", self.names.len()),
            ("rank", self.ranks.len()),
            ("is_aggregate", self.is_aggregate.len()),
            ("aggregate_count", self.aggregate_counts.len()),
        ];
        for (column, actual) in lengths {
            if actual != expected {
                return Err(CodecError::ColumnLengthMismatch {
                    column,
                    expected,
                    actual,
                });
            }
        }
        Ok(expected)
    }

    fn into_records(self) -> Result<Vec<TileRecord>, CodecError> {
        let len = self.check_lengths()?;
        let mut records = Vec::with_capacity(len);

        let rows = self
            .ids
            .into_iter()
            .zip(self.parent_ids)
            .zip(self.xs)
            .zip(self.ys)
            .zip(self.depths)
            .zip(self.coverage)
            .zip(self.names)
            .zip(self.ranks)
            .zip(self.is_aggregate)
            .zip(self.aggregate_counts);

        for (
            ((((((((id, parent_id), x), y), depth), coverage), name), rank), is_aggregate),
            aggregate_count,
        ) in rows
        {
            records.push(TileRecord {
                id,
                parent_id,
                x,
                y,
                depth,
                coverage_state: CoverageState::try_from(coverage)?,
                name,
                rank,
                is_aggregate,
                aggregate_count,
            });
        }

        Ok(records)
    }
}

fn encode_columnar(records: &[TileRecord]) -> Result<Vec<u8>, CodecError> {
    let payload = bincode::serialize(&ColumnarTile::from_records(records))?;

    let mut out = Vec::with_capacity(payload.len() / 2 + COLUMNAR_MAGIC.len());
    out.extend_from_slice(COLUMNAR_MAGIC);
    let mut encoder = GzEncoder::new(out, Compression::default());
    encoder.write_all(&payload).map_err(CodecError::Compress)?;
    encoder.finish().map_err(CodecError::Compress)
}

fn decode_columnar(bytes: &[u8]) -> Result<Vec<TileRecord>, CodecError> {
    let body = bytes
        .strip_prefix(COLUMNAR_MAGIC.as_slice())
        .ok_or(CodecError::BadMagic)?;

    let mut payload = Vec::new();
    GzDecoder::new(body)
        .take(MAX_DECODED_BYTES + 1)
        .read_to_end(&mut payload)
        .map_err(CodecError::Decompress)?;
    if payload.len() as u64 > MAX_DECODED_BYTES {
        return Err(CodecError::TooLarge);
    }

    let columns: ColumnarTile = bincode::deserialize(&payload)?;
    columns.into_records()
}
