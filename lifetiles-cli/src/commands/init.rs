//! Init command - write the configuration file.

use std::path::Path;

use lifetiles::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
///
/// An existing file is loaded and rewritten, so unknown formatting is
/// normalized but values are kept.
pub fn run(path: Option<&Path>) -> Result<(), CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);

    let config = if path.exists() {
        ConfigFile::load_from(&path)?
    } else {
        ConfigFile::default()
    };
    config.save_to(&path)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to customize tiling, output and client settings.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
