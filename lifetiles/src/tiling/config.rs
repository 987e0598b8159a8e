//! Tiling parameters.

use thiserror::Error;

use crate::tile::MAX_ZOOM;

/// Default record budget per tile.
pub const DEFAULT_MAX_NODES_PER_TILE: usize = 20_000;

/// Default number of levels revealed beyond the zoom level.
///
/// Matches the client's rendering depth budget.
pub const DEFAULT_DEPTH_MARGIN: u32 = 3;

/// Invalid tiling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TilingError {
    #[error("Max zoom {0} exceeds supported maximum {MAX}", MAX = MAX_ZOOM)]
    ZoomOutOfRange(u8),

    #[error("Tile budget must be at least 1 record")]
    ZeroBudget,
}

/// Order in which equally deep subtrees are folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregationOrder {
    /// Largest subtree first (fewest aggregations for a given reduction).
    #[default]
    MostDescendants,
    /// Smallest subtree first (keeps big clades expanded longer).
    FewestDescendants,
    /// Depth-first traversal order.
    InputOrder,
}

impl AggregationOrder {
    /// Configuration name.
    pub fn name(self) -> &'static str {
        match self {
            AggregationOrder::MostDescendants => "most_descendants",
            AggregationOrder::FewestDescendants => "fewest_descendants",
            AggregationOrder::InputOrder => "input_order",
        }
    }

    /// Parse a configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "most_descendants" => Some(AggregationOrder::MostDescendants),
            "fewest_descendants" => Some(AggregationOrder::FewestDescendants),
            "input_order" => Some(AggregationOrder::InputOrder),
            _ => None,
        }
    }
}

/// Configuration for the [`TilingEngine`](super::TilingEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilingConfig {
    /// Highest zoom level produced (levels `0..=max_zoom`).
    pub max_zoom: u8,

    /// Nodes with `depth <= zoom + depth_margin` are candidates.
    pub depth_margin: u32,

    /// Record budget per tile.
    pub max_nodes_per_tile: usize,

    /// Whether unbranched chains are collapsed.
    pub collapse_chains: bool,

    /// Tie-break for equally deep aggregation candidates.
    pub aggregation_order: AggregationOrder,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            max_zoom: MAX_ZOOM,
            depth_margin: DEFAULT_DEPTH_MARGIN,
            max_nodes_per_tile: DEFAULT_MAX_NODES_PER_TILE,
            collapse_chains: true,
            aggregation_order: AggregationOrder::default(),
        }
    }
}

impl TilingConfig {
    /// Set the highest zoom level.
    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    /// Set the depth margin.
    pub fn with_depth_margin(mut self, margin: u32) -> Self {
        self.depth_margin = margin;
        self
    }

    /// Set the per-tile record budget.
    pub fn with_max_nodes_per_tile(mut self, max: usize) -> Self {
        self.max_nodes_per_tile = max;
        self
    }

    /// Enable or disable chain collapsing.
    pub fn with_collapse_chains(mut self, collapse: bool) -> Self {
        self.collapse_chains = collapse;
        self
    }

    /// Set the aggregation tie-break.
    pub fn with_aggregation_order(mut self, order: AggregationOrder) -> Self {
        self.aggregation_order = order;
        self
    }

    /// Deepest depth included at `zoom`.
    pub fn depth_limit(&self, zoom: u8) -> u32 {
        zoom as u32 + self.depth_margin
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<(), TilingError> {
        if self.max_zoom > MAX_ZOOM {
            return Err(TilingError::ZoomOutOfRange(self.max_zoom));
        }
        if self.max_nodes_per_tile == 0 {
            return Err(TilingError::ZeroBudget);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TilingConfig::default();
        assert_eq!(config.max_zoom, 7);
        assert_eq!(config.depth_margin, 3);
        assert_eq!(config.max_nodes_per_tile, 20_000);
        assert!(config.collapse_chains);
        assert_eq!(config.aggregation_order, AggregationOrder::MostDescendants);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_and_depth_limit() {
        let config = TilingConfig::default()
            .with_max_zoom(3)
            .with_depth_margin(1)
            .with_max_nodes_per_tile(10)
            .with_collapse_chains(false)
            .with_aggregation_order(AggregationOrder::InputOrder);
        assert_eq!(config.depth_limit(0), 1);
        assert_eq!(config.depth_limit(3), 4);
        assert!(!config.collapse_chains);
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            TilingConfig::default().with_max_zoom(8).validate(),
            Err(TilingError::ZoomOutOfRange(8))
        );
        assert_eq!(
            TilingConfig::default().with_max_nodes_per_tile(0).validate(),
            Err(TilingError::ZeroBudget)
        );
    }

    #[test]
    fn test_aggregation_order_names() {
        for order in [
            AggregationOrder::MostDescendants,
            AggregationOrder::FewestDescendants,
            AggregationOrder::InputOrder,
        ] {
            assert_eq!(AggregationOrder::from_name(order.name()), Some(order));
        }
        assert_eq!(AggregationOrder::from_name("random"), None);
    }
}
