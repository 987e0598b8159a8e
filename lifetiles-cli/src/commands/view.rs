//! View command - load a viewport the way the client does.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;
use lifetiles::client::{ClientTileLoader, DirTileFetcher, HttpTileFetcher, TileFetcher, Viewport};
use lifetiles::config::ConfigFile;
use tracing::info;

use crate::error::CliError;

/// Arguments for `lifetiles view`.
#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Tile directory or http(s) base URL (defaults to client.base_url, then output.directory)
    #[arg(long)]
    pub source: Option<String>,

    /// Top of the viewport in layout units
    #[arg(long, default_value_t = 0.0)]
    pub y_min: f64,

    /// Bottom of the viewport in layout units
    #[arg(long, default_value_t = 1.0)]
    pub y_max: f64,

    /// Continuous zoom; rounded to a tile zoom level
    #[arg(long, default_value_t = 0.0)]
    pub zoom: f64,

    /// Print the first N visible nodes
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
}

/// Run the view command.
pub fn run(args: ViewArgs, config: &ConfigFile) -> Result<(), CliError> {
    let source = args
        .source
        .clone()
        .or_else(|| config.client.base_url.clone())
        .unwrap_or_else(|| config.output.directory.display().to_string());

    let fetcher: Arc<dyn TileFetcher> = if is_url(&source) {
        Arc::new(HttpTileFetcher::with_timeout(source, config.client.timeout())?)
    } else {
        Arc::new(DirTileFetcher::new(PathBuf::from(source)))
    };
    let description = fetcher.describe();
    let loader = ClientTileLoader::with_config(fetcher, config.loader_config());
    let viewport = Viewport::new(args.y_min, args.y_max, args.zoom);
    info!(source = %description, zoom = viewport.zoom_level(), "Loading viewport");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;
    let frame = runtime
        .block_on(loader.load(viewport))
        .ok_or_else(|| CliError::Runtime("Viewport load was superseded".to_string()))?;

    println!(
        "{} {} at zoom {} (y {:.4}..{:.4})",
        style("Viewport").bold(),
        description,
        frame.zoom,
        frame.viewport.y_min,
        frame.viewport.y_max
    );
    println!("  Tiles:   {}", frame.tiles.len());
    println!("  Nodes:   {}", frame.node_count());
    println!("  Edges:   {}", frame.edges.len());
    if !frame.absent.is_empty() {
        let keys: Vec<String> = frame.absent.iter().map(|k| k.to_string()).collect();
        println!("  Absent:  {}", keys.join(", "));
    }
    for failure in &frame.gaps {
        println!("  {} {}", style("Gap:").yellow(), failure);
    }

    for record in frame.nodes().take(args.limit) {
        println!(
            "  {:>10} x={:<4} y={:.6} {}",
            record.id, record.x, record.y, record.name
        );
    }
    Ok(())
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
