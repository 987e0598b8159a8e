//! INI configuration file loading and saving.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::keys::ConfigKey;
use crate::client::{LoaderConfig, DEFAULT_DEBOUNCE, DEFAULT_TIMEOUT};
use crate::logging::LoggingConfig;
use crate::pipeline::PipelineConfig;
use crate::store::DirectoryStore;
use crate::tile::TileFormat;
use crate::tiling::TilingConfig;
use crate::tree::TaxonId;

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    /// Published tile tree location.
    pub directory: PathBuf,
    /// Encodings written, in client fetch preference order.
    pub formats: Vec<TileFormat>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("tiles"),
            formats: TileFormat::ALL.to_vec(),
        }
    }
}

/// `[client]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Tile server base URL; local directory fetches when unset.
    pub base_url: Option<String>,
    pub debounce_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl ClientSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub tiling: TilingConfig,
    pub output: OutputSettings,
    pub client: ClientSettings,
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Load from [`config_file_path`], or defaults if the file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(e) => ConfigError::Parse(e.to_string()),
        })?;
        Self::from_ini(&ini)
    }

    /// Parse INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for key in ConfigKey::all() {
            if let Some(value) = ini.get_from(Some(key.section()), key.key_name()) {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Render as INI; unset optional values are omitted.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini
    }

    /// Save to [`config_file_path`].
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        self.to_ini().write_to_file(path).map_err(io_err)
    }

    /// Pipeline settings, optionally restricted to a subtree.
    pub fn pipeline_config(&self, root: Option<TaxonId>) -> PipelineConfig {
        PipelineConfig::default()
            .with_tiling(self.tiling.clone())
            .with_root(root)
    }

    /// Store for the configured output directory and formats.
    pub fn store(&self) -> DirectoryStore {
        DirectoryStore::new(&self.output.directory).with_formats(self.output.formats.clone())
    }

    /// Client loader settings.
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::default()
            .with_formats(self.output.formats.clone())
            .with_debounce(self.client.debounce())
    }
}

/// Default configuration file location.
///
/// `~/.config/lifetiles/config.ini` on Linux; falls back to the working
/// directory when no config directory is known.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lifetiles")
        .join("config.ini")
}
