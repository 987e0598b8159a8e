//! Tile keys and bucket arithmetic.

use std::fmt;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::codec::TileFormat;

/// Lowest zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Highest zoom level.
pub const MAX_ZOOM: u8 = 7;

/// Errors constructing or parsing a tile key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileKeyError {
    #[error("Invalid zoom level: {0} (expected 0-7)")]
    InvalidZoom(u8),

    #[error("Bucket {bucket} out of range for zoom {zoom}")]
    InvalidBucket { zoom: u8, bucket: u32 },

    #[error("Not a tile path: {0}")]
    InvalidPath(String),
}

/// Number of buckets at `zoom`.
#[inline]
pub fn bucket_count(zoom: u8) -> u32 {
    1u32 << zoom
}

/// Bucket of a normalized ordinate: `floor(y * 2^zoom)`, clamped to the
/// valid range so that `y = 1.0` lands in the last bucket.
#[inline]
pub fn bucket_for(y: f64, zoom: u8) -> u32 {
    let count = bucket_count(zoom);
    let scaled = (y.clamp(0.0, 1.0) * count as f64).floor() as u32;
    scaled.min(count - 1)
}

/// Address of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileKey {
    pub zoom: u8,
    pub bucket: u32,
}

impl TileKey {
    /// Create a validated key.
    pub fn new(zoom: u8, bucket: u32) -> Result<Self, TileKeyError> {
        if zoom > MAX_ZOOM {
            return Err(TileKeyError::InvalidZoom(zoom));
        }
        if bucket >= bucket_count(zoom) {
            return Err(TileKeyError::InvalidBucket { zoom, bucket });
        }
        Ok(Self { zoom, bucket })
    }

    /// Key of the tile containing ordinate `y` at `zoom`.
    pub fn for_y(y: f64, zoom: u8) -> Self {
        Self {
            zoom,
            bucket: bucket_for(y, zoom),
        }
    }

    /// Inclusive bucket range covering `[y_min, y_max]` at `zoom`.
    ///
    /// The bounds are clamped to `[0, 1]` and swapped if reversed.
    pub fn bucket_range(y_min: f64, y_max: f64, zoom: u8) -> RangeInclusive<u32> {
        let (lo, hi) = if y_min <= y_max {
            (y_min, y_max)
        } else {
            (y_max, y_min)
        };
        bucket_for(lo, zoom)..=bucket_for(hi, zoom)
    }

    /// All keys covering `[y_min, y_max]` at `zoom`, in bucket order.
    pub fn covering(y_min: f64, y_max: f64, zoom: u8) -> impl Iterator<Item = TileKey> {
        Self::bucket_range(y_min, y_max, zoom).map(move |bucket| TileKey { zoom, bucket })
    }

    /// Ordinate interval `[start, end)` covered by this tile.
    pub fn y_span(&self) -> (f64, f64) {
        let count = bucket_count(self.zoom) as f64;
        (self.bucket as f64 / count, (self.bucket + 1) as f64 / count)
    }

    /// Relative path `{zoom}/{bucket}.{ext}`.
    pub fn path(&self, format: TileFormat) -> String {
        format!("{}/{}.{}", self.zoom, self.bucket, format.extension())
    }

    /// Parse a path ending in `{zoom}/{bucket}.{ext}`.
    ///
    /// Leading directories are ignored.
    pub fn from_path(path: &Path) -> Result<(Self, TileFormat), TileKeyError> {
        let invalid = || TileKeyError::InvalidPath(path.display().to_string());

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(TileFormat::from_extension)
            .ok_or_else(invalid)?;
        let bucket: u32 = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)?;
        let zoom: u8 = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)?;

        Ok((Self::new(zoom, bucket)?, format))
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.zoom, self.bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_for_edges() {
        assert_eq!(bucket_for(0.0, 0), 0);
        assert_eq!(bucket_for(1.0, 0), 0);
        assert_eq!(bucket_for(0.0, 3), 0);
        assert_eq!(bucket_for(1.0, 3), 7);
        assert_eq!(bucket_for(0.5, 1), 1);
        assert_eq!(bucket_for(0.499, 1), 0);
        assert_eq!(bucket_for(-0.2, 2), 0);
        assert_eq!(bucket_for(7.0, 2), 3);
    }

    #[test]
    fn test_new_validates() {
        assert!(TileKey::new(7, 127).is_ok());
        assert_eq!(TileKey::new(8, 0), Err(TileKeyError::InvalidZoom(8)));
        assert_eq!(
            TileKey::new(2, 4),
            Err(TileKeyError::InvalidBucket { zoom: 2, bucket: 4 })
        );
    }

    #[test]
    fn test_bucket_range() {
        assert_eq!(TileKey::bucket_range(0.1, 0.6, 2), 0..=2);
        assert_eq!(TileKey::bucket_range(0.6, 0.1, 2), 0..=2);
        assert_eq!(TileKey::bucket_range(-1.0, 2.0, 3), 0..=7);
        let keys: Vec<TileKey> = TileKey::covering(0.0, 0.3, 2).collect();
        assert_eq!(
            keys,
            vec![
                TileKey { zoom: 2, bucket: 0 },
                TileKey { zoom: 2, bucket: 1 }
            ]
        );
    }

    #[test]
    fn test_y_span() {
        let key = TileKey::new(2, 1).unwrap();
        assert_eq!(key.y_span(), (0.25, 0.5));
    }

    #[test]
    fn test_path_roundtrip() {
        let key = TileKey::new(5, 17).unwrap();
        let path = key.path(TileFormat::Text);
        assert_eq!(path, "5/17.json");

        let full = Path::new("/srv/tiles").join(&path);
        assert_eq!(TileKey::from_path(&full), Ok((key, TileFormat::Text)));
    }

    #[test]
    fn test_from_path_rejects_garbage() {
        assert!(TileKey::from_path(Path::new("5/abc.json")).is_err());
        assert!(TileKey::from_path(Path::new("5/3.txt")).is_err());
        assert!(TileKey::from_path(Path::new("x/3.bin")).is_err());
        assert!(matches!(
            TileKey::from_path(Path::new("1/9.bin")),
            Err(TileKeyError::InvalidBucket { .. })
        ));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_bucket_in_range(y in 0.0..=1.0_f64, zoom in 0u8..=MAX_ZOOM) {
                let bucket = bucket_for(y, zoom);
                prop_assert!(bucket < bucket_count(zoom));
                let (start, end) = TileKey { zoom, bucket }.y_span();
                prop_assert!(start <= y);
                prop_assert!(y < end || (y == 1.0 && end == 1.0));
            }

            #[test]
            fn test_covering_contains_endpoints(
                a in 0.0..=1.0_f64,
                b in 0.0..=1.0_f64,
                zoom in 0u8..=MAX_ZOOM,
            ) {
                let keys: Vec<TileKey> = TileKey::covering(a, b, zoom).collect();
                prop_assert!(keys.contains(&TileKey::for_y(a, zoom)));
                prop_assert!(keys.contains(&TileKey::for_y(b, zoom)));
            }
        }
    }
}
