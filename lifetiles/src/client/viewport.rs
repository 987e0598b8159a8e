//! Visible region of the tree.

use crate::tile::{TileKey, MAX_ZOOM, MIN_ZOOM};

/// Visible ordinate interval and continuous zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub y_min: f64,
    pub y_max: f64,
    pub zoom: f64,
}

impl Viewport {
    /// Create a viewport; reversed bounds are swapped.
    pub fn new(y_min: f64, y_max: f64, zoom: f64) -> Self {
        let (y_min, y_max) = if y_min <= y_max {
            (y_min, y_max)
        } else {
            (y_max, y_min)
        };
        Self {
            y_min,
            y_max,
            zoom,
        }
    }

    /// Whole tree at zoom 0.
    pub fn full() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// Integer zoom level: rounded, clamped to the tiled range.
    pub fn zoom_level(&self) -> u8 {
        if !self.zoom.is_finite() {
            return if self.zoom == f64::INFINITY {
                MAX_ZOOM
            } else {
                MIN_ZOOM
            };
        }
        self.zoom.round().clamp(MIN_ZOOM as f64, MAX_ZOOM as f64) as u8
    }

    /// Keys of every tile intersecting the viewport, in bucket order.
    pub fn tile_keys(&self) -> Vec<TileKey> {
        TileKey::covering(self.y_min, self.y_max, self.zoom_level()).collect()
    }

    /// Whether `y` lies inside the visible interval.
    pub fn contains(&self, y: f64) -> bool {
        y >= self.y_min && y <= self.y_max
    }
}
