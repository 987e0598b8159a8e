//! Build command - run the pipeline and publish a tile tree.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use lifetiles::config::{format_size, ConfigFile};
use lifetiles::pipeline::Pipeline;
use lifetiles::source::{read_edges_file, read_observations_file};
use lifetiles::tile::TileFormat;
use lifetiles::tree::TaxonId;
use tracing::info;

use crate::error::CliError;

/// Arguments for `lifetiles build`.
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Edge list (TSV with parent_id, id and optional name, rank)
    #[arg(long)]
    pub tree: PathBuf,

    /// Coverage table (TSV keyed by taxid)
    #[arg(long)]
    pub coverage: Option<PathBuf>,

    /// Restrict the build to the subtree rooted at this taxon
    #[arg(long)]
    pub root: Option<TaxonId>,

    /// Output directory (overrides output.directory)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Skip the text encoding
    #[arg(long)]
    pub no_text: bool,

    /// Record budget per tile (overrides tiling.max_nodes_per_tile)
    #[arg(long)]
    pub max_nodes: Option<usize>,
}

/// Run the build command.
pub fn run(args: BuildArgs, config: &ConfigFile) -> Result<(), CliError> {
    let mut config = config.clone();
    if let Some(out) = args.out {
        config.output.directory = out;
    }
    if args.no_text {
        config.output.formats.retain(|f| *f != TileFormat::Text);
        if config.output.formats.is_empty() {
            config.output.formats.push(TileFormat::Columnar);
        }
    }
    if let Some(max) = args.max_nodes {
        config.tiling.max_nodes_per_tile = max;
    }

    let start = Instant::now();
    let progress = spinner();

    progress.set_message(format!("Reading {}", args.tree.display()));
    let edges = read_edges_file(&args.tree)?;
    let observations = match &args.coverage {
        Some(path) => {
            progress.set_message(format!("Reading {}", path.display()));
            read_observations_file(path)?
        }
        None => Vec::new(),
    };

    progress.set_message(format!("Tiling {} taxa", edges.len()));
    let pipeline = Pipeline::new(config.pipeline_config(args.root))?;
    let store = config.store();
    let result = pipeline.run_and_publish(edges, observations, &store);
    progress.finish_and_clear();
    let (output, report) = result?;
    info!(tiles = report.tiles, bytes = report.bytes, "Build finished");

    println!(
        "{} {} tiles for {} taxa in {:.1}s",
        style("Published").green().bold(),
        report.tiles,
        output.tree.len(),
        start.elapsed().as_secs_f64()
    );
    println!("  Output:   {}", report.root.display());
    println!(
        "  Formats:  {}",
        store
            .formats()
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Files:    {} ({})", report.files, format_size(report.bytes));
    println!("  Summary:  {}", output.summary);
    Ok(())
}

fn spinner() -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        progress.set_style(template);
    }
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}
