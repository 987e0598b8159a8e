//! Inspect command - decode one tile file.

use std::path::PathBuf;

use clap::Args;
use console::style;
use lifetiles::coverage::CoverageState;
use lifetiles::tile::{TileFormat, TileKey, TileRecord};

use crate::error::CliError;

/// Arguments for `lifetiles inspect`.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Tile file (`<zoom>/<bucket>.bin` or `.json`)
    pub file: PathBuf,

    /// Print the first N records
    #[arg(long, default_value_t = 0)]
    pub records: usize,
}

/// Run the inspect command.
pub fn run(args: InspectArgs) -> Result<(), CliError> {
    let (key, format) = match TileKey::from_path(&args.file) {
        Ok((key, format)) => (Some(key), format),
        Err(_) => {
            let format = args
                .file
                .extension()
                .and_then(|e| e.to_str())
                .and_then(TileFormat::from_extension)
                .ok_or_else(|| {
                    CliError::Config(format!(
                        "Cannot tell the encoding of {}; expected .bin or .json",
                        args.file.display()
                    ))
                })?;
            (None, format)
        }
    };

    let bytes = std::fs::read(&args.file)?;
    let records = format.decode(&bytes)?;
    let summary = TileSummary::of(&records);

    match key {
        Some(key) => {
            let (start, end) = key.y_span();
            println!(
                "{} {} ({}), y in [{:.4}, {:.4})",
                style("Tile").bold(),
                key,
                format.name(),
                start,
                end
            );
        }
        None => println!("{} {} ({})", style("Tile").bold(), args.file.display(), format.name()),
    }
    println!("  Payload:     {} bytes", bytes.len());
    println!("  Records:     {}", records.len());
    println!("  Aggregates:  {}", summary.aggregates);
    println!("  Represents:  {} taxa", summary.represented);
    if let Some((min, max)) = summary.depth {
        println!("  Depth:       {}..={}", min, max);
    }
    println!("  Coverage:");
    for state in CoverageState::ALL {
        let count = summary.coverage[state.as_u8() as usize];
        if count > 0 {
            println!("    {:<28} {}", state.label(), count);
        }
    }

    for record in records.iter().take(args.records) {
        println!(
            "  {:>10} parent={:<10} depth={:<3} y={:.6} {}{}",
            record.id,
            record
                .parent_id
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            record.depth,
            record.y,
            record.name,
            if record.is_aggregate {
                format!(" [+{}]", record.aggregate_count)
            } else {
                String::new()
            }
        );
    }
    Ok(())
}

struct TileSummary {
    aggregates: usize,
    represented: u64,
    depth: Option<(u32, u32)>,
    coverage: [u64; 6],
}

impl TileSummary {
    fn of(records: &[TileRecord]) -> Self {
        let mut coverage = [0u64; 6];
        for record in records {
            coverage[record.coverage_state.as_u8() as usize] += 1;
        }
        let depth = records
            .iter()
            .map(|r| r.depth)
            .fold(None, |acc: Option<(u32, u32)>, d| match acc {
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
                None => Some((d, d)),
            });
        Self {
            aggregates: records.iter().filter(|r| r.is_aggregate).count(),
            represented: records.iter().map(TileRecord::represented_nodes).sum(),
            depth,
            coverage,
        }
    }
}
