//! Stats command - coverage per rank.

use std::path::PathBuf;

use clap::Args;
use console::style;
use lifetiles::coverage::{CoveragePropagator, RankStatistics, DEFAULT_RANKS};
use lifetiles::source::{read_edges_file, read_observations_file};
use lifetiles::tree::{TaxonId, TreeBuilder};

use crate::error::CliError;

/// Arguments for `lifetiles stats`.
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Edge list
    #[arg(long)]
    pub tree: PathBuf,

    /// Coverage table
    #[arg(long)]
    pub coverage: Option<PathBuf>,

    /// Rank to summarize (repeatable; defaults to phylum through genus)
    #[arg(long = "rank")]
    pub ranks: Vec<String>,

    /// Restrict to the subtree rooted at this taxon
    #[arg(long)]
    pub root: Option<TaxonId>,
}

/// Run the stats command.
pub fn run(args: StatsArgs) -> Result<(), CliError> {
    let mut tree = TreeBuilder::from_edges(read_edges_file(&args.tree)?)?;
    if let Some(root) = args.root {
        tree = tree.extract_subtree(root)?;
    }
    let observations = match &args.coverage {
        Some(path) => read_observations_file(path)?,
        None => Vec::new(),
    };
    let coverage = CoveragePropagator::new().propagate(&tree, observations);

    let ranks: Vec<&str> = if args.ranks.is_empty() {
        DEFAULT_RANKS.to_vec()
    } else {
        args.ranks.iter().map(String::as_str).collect()
    };
    let stats = RankStatistics::compute(&tree, &coverage, &ranks);

    println!(
        "{} {} taxa, root state {}",
        style("Coverage").bold(),
        tree.len(),
        coverage.state(tree.root()).label()
    );
    if stats.is_empty() {
        println!("  No taxa carry the requested ranks");
    } else {
        print!("{}", stats);
    }
    Ok(())
}
