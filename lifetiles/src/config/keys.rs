//! Addressable configuration keys (`section.key`).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::{ConfigError, ConfigFile};
use crate::tile::{TileFormat, MAX_ZOOM};
use crate::tiling::AggregationOrder;

/// One configuration setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    TilingMaxZoom,
    TilingDepthMargin,
    TilingMaxNodesPerTile,
    TilingCollapseChains,
    TilingAggregationOrder,
    OutputDirectory,
    OutputFormats,
    ClientBaseUrl,
    ClientDebounceMs,
    ClientTimeoutSecs,
    LoggingLevel,
    LoggingDirectory,
}

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::TilingMaxZoom,
            ConfigKey::TilingDepthMargin,
            ConfigKey::TilingMaxNodesPerTile,
            ConfigKey::TilingCollapseChains,
            ConfigKey::TilingAggregationOrder,
            ConfigKey::OutputDirectory,
            ConfigKey::OutputFormats,
            ConfigKey::ClientBaseUrl,
            ConfigKey::ClientDebounceMs,
            ConfigKey::ClientTimeoutSecs,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingDirectory,
        ]
    }

    /// INI section.
    pub fn section(self) -> &'static str {
        match self {
            ConfigKey::TilingMaxZoom
            | ConfigKey::TilingDepthMargin
            | ConfigKey::TilingMaxNodesPerTile
            | ConfigKey::TilingCollapseChains
            | ConfigKey::TilingAggregationOrder => "tiling",
            ConfigKey::OutputDirectory | ConfigKey::OutputFormats => "output",
            ConfigKey::ClientBaseUrl | ConfigKey::ClientDebounceMs | ConfigKey::ClientTimeoutSecs => {
                "client"
            }
            ConfigKey::LoggingLevel | ConfigKey::LoggingDirectory => "logging",
        }
    }

    /// Key within its section.
    pub fn key_name(self) -> &'static str {
        match self {
            ConfigKey::TilingMaxZoom => "max_zoom",
            ConfigKey::TilingDepthMargin => "depth_margin",
            ConfigKey::TilingMaxNodesPerTile => "max_nodes_per_tile",
            ConfigKey::TilingCollapseChains => "collapse_chains",
            ConfigKey::TilingAggregationOrder => "aggregation_order",
            ConfigKey::OutputDirectory => "directory",
            ConfigKey::OutputFormats => "formats",
            ConfigKey::ClientBaseUrl => "base_url",
            ConfigKey::ClientDebounceMs => "debounce_ms",
            ConfigKey::ClientTimeoutSecs => "timeout_secs",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingDirectory => "directory",
        }
    }

    /// Full `section.key` name.
    pub fn name(self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; empty when unset.
    pub fn get(self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::TilingMaxZoom => config.tiling.max_zoom.to_string(),
            ConfigKey::TilingDepthMargin => config.tiling.depth_margin.to_string(),
            ConfigKey::TilingMaxNodesPerTile => config.tiling.max_nodes_per_tile.to_string(),
            ConfigKey::TilingCollapseChains => config.tiling.collapse_chains.to_string(),
            ConfigKey::TilingAggregationOrder => config.tiling.aggregation_order.name().to_string(),
            ConfigKey::OutputDirectory => config.output.directory.display().to_string(),
            ConfigKey::OutputFormats => config
                .output
                .formats
                .iter()
                .map(|f| f.name())
                .collect::<Vec<_>>()
                .join(","),
            ConfigKey::ClientBaseUrl => config.client.base_url.clone().unwrap_or_default(),
            ConfigKey::ClientDebounceMs => config.client.debounce_ms.to_string(),
            ConfigKey::ClientTimeoutSecs => config.client.timeout_secs.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parse and store `value`.
    pub fn set(self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match self {
            ConfigKey::TilingMaxZoom => {
                let zoom: u8 = value.parse().map_err(|_| invalid("expected an integer"))?;
                if zoom > MAX_ZOOM {
                    return Err(invalid("expected 0-7"));
                }
                config.tiling.max_zoom = zoom;
            }
            ConfigKey::TilingDepthMargin => {
                config.tiling.depth_margin =
                    value.parse().map_err(|_| invalid("expected an integer"))?;
            }
            ConfigKey::TilingMaxNodesPerTile => {
                let max: usize = value.parse().map_err(|_| invalid("expected an integer"))?;
                if max == 0 {
                    return Err(invalid("must be at least 1"));
                }
                config.tiling.max_nodes_per_tile = max;
            }
            ConfigKey::TilingCollapseChains => {
                config.tiling.collapse_chains =
                    parse_bool(value).ok_or_else(|| invalid("expected true or false"))?;
            }
            ConfigKey::TilingAggregationOrder => {
                config.tiling.aggregation_order = AggregationOrder::from_name(value).ok_or_else(
                    || invalid("expected most_descendants, fewest_descendants or input_order"),
                )?;
            }
            ConfigKey::OutputDirectory => {
                if value.is_empty() {
                    return Err(invalid("must not be empty"));
                }
                config.output.directory = PathBuf::from(value);
            }
            ConfigKey::OutputFormats => {
                let formats = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(TileFormat::from_name)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| invalid("expected columnar and/or text"))?;
                if formats.is_empty() {
                    return Err(invalid("at least one format is required"));
                }
                config.output.formats = formats;
            }
            ConfigKey::ClientBaseUrl => {
                config.client.base_url = (!value.is_empty()).then(|| value.to_string());
            }
            ConfigKey::ClientDebounceMs => {
                config.client.debounce_ms =
                    value.parse().map_err(|_| invalid("expected milliseconds"))?;
            }
            ConfigKey::ClientTimeoutSecs => {
                config.client.timeout_secs =
                    value.parse().map_err(|_| invalid("expected seconds"))?;
            }
            ConfigKey::LoggingLevel => {
                if value.is_empty() {
                    return Err(invalid("must not be empty"));
                }
                config.logging.level = value.to_string();
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = (!value.is_empty()).then(|| PathBuf::from(value));
            }
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s.trim())
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
