//! LifeTiles CLI - build and browse level-of-detail taxonomy tiles.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

use commands::config::ConfigCommands;
use error::CliError;
use lifetiles::config::ConfigFile;
use lifetiles::logging::init_logging;

#[derive(Debug, Parser)]
#[command(name = "lifetiles", version, about = "Level-of-detail tiles for very large taxonomies")]
struct Cli {
    /// Configuration file (defaults to the per-user config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build and publish a tile tree from an edge list
    Build(commands::build::BuildArgs),

    /// Decode a tile file and summarize its records
    Inspect(commands::inspect::InspectArgs),

    /// Load the tiles covering a viewport and print what would render
    View(commands::view::ViewArgs),

    /// Print per-rank coverage statistics
    Stats(commands::stats::StatsArgs),

    /// Write the default configuration file
    Init,

    /// View or change configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    // Config management works on the file itself, never on a merged view.
    let command = match cli.command {
        Commands::Init => return commands::init::run(cli.config.as_deref()),
        Commands::Config { command } => {
            return commands::config::run(command, cli.config.as_deref())
        }
        other => other,
    };

    let config = match &cli.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    let _guard = init_logging(&logging)?;

    match command {
        Commands::Build(args) => commands::build::run(args, &config),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::View(args) => commands::view::run(args, &config),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Init | Commands::Config { .. } => Ok(()),
    }
}
