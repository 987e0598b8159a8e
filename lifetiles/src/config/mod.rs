//! Configuration file.
//!
//! Settings live in an INI file at [`config_file_path`]:
//!
//! ```ini
//! [tiling]
//! max_zoom = 7
//! depth_margin = 3
//! max_nodes_per_tile = 20000
//! collapse_chains = true
//! aggregation_order = most_descendants
//!
//! [output]
//! directory = ./tiles
//! formats = columnar,text
//!
//! [client]
//! base_url = https://example.org/tiles
//! debounce_ms = 100
//! timeout_secs = 30
//!
//! [logging]
//! level = info
//! directory = /var/log/lifetiles
//! ```
//!
//! Missing files and missing keys fall back to defaults.

mod file;
mod keys;

pub use file::{config_file_path, ClientSettings, ConfigError, ConfigFile, OutputSettings};
pub use keys::ConfigKey;

/// Human-readable byte size.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
