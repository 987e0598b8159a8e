//! CLI error type.

use thiserror::Error;

use lifetiles::client::FetchError;
use lifetiles::config::ConfigError;
use lifetiles::logging::LoggingError;
use lifetiles::pipeline::PipelineError;
use lifetiles::source::SourceError;
use lifetiles::tile::{CodecError, TileKeyError};
use lifetiles::tree::TreeError;

/// Errors surfaced to the user.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad configuration or arguments.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline aborted.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Input table could not be read.
    #[error("Input error: {0}")]
    Source(#[from] SourceError),

    /// Tree could not be built.
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    /// Tile payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Client could not reach the tile source.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Logging could not be initialized.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// Async runtime failure.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Source(_) | CliError::Tree(_) => 3,
            CliError::Pipeline(PipelineError::Source(_) | PipelineError::Tree(_)) => 3,
            _ => 1,
        }
    }
}

// Config and decode failures are reported by message only.

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<CodecError> for CliError {
    fn from(e: CodecError) -> Self {
        CliError::Decode(e.to_string())
    }
}

impl From<TileKeyError> for CliError {
    fn from(e: TileKeyError) -> Self {
        CliError::Decode(e.to_string())
    }
}
