//! Tab-separated input readers.
//!
//! Header-driven adapters for the two pipeline inputs:
//!
//! - edge lists with `parent_id` and `id` columns, plus optional `name`
//!   and `rank`
//! - coverage tables keyed by `taxid` (or `id`) with either a numeric
//!   `coverage_state` column or the `has_assembly`, `has_annotation` and
//!   `has_reads` flags
//!
//! Column order is free; unknown columns are ignored. Blank lines and
//! lines starting with `#` are skipped.

mod table;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::coverage::{CoverageFlags, CoverageState};
use crate::tree::{Edge, TaxonId};
use table::Table;

/// Errors from reading an input table.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Input has no header line")]
    MissingHeader,

    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Line {line}: invalid {column} value '{value}'")]
    InvalidValue {
        line: usize,
        column: &'static str,
        value: String,
    },
}

/// Parent values meaning "no parent".
const ROOT_SENTINELS: [&str; 3] = ["", "0", "-1"];

/// Read an edge list.
pub fn read_edges<R: BufRead>(reader: R) -> Result<Vec<Edge>, SourceError> {
    let mut table = Table::new(reader)?;
    let parent_col = table.require(&["parent_id", "parent"], "parent_id")?;
    let id_col = table.require(&["id", "taxid"], "id")?;
    let name_col = table.column(&["name"]);
    let rank_col = table.column(&["rank"]);

    let mut edges = Vec::new();
    while let Some(row) = table.next_row()? {
        let id = parse_id(row.get(id_col), row.line, "id")?;
        let parent_raw = row.get(parent_col);
        let mut edge = if ROOT_SENTINELS.contains(&parent_raw) {
            Edge::root(id)
        } else {
            Edge::new(parse_id(parent_raw, row.line, "parent_id")?, id)
        };
        if let Some(col) = name_col {
            edge = edge.with_name(row.get(col));
        }
        if let Some(col) = rank_col {
            edge = edge.with_rank(row.get(col));
        }
        edges.push(edge);
    }
    Ok(edges)
}

/// Read coverage observations.
pub fn read_observations<R: BufRead>(
    reader: R,
) -> Result<Vec<(TaxonId, CoverageState)>, SourceError> {
    let mut table = Table::new(reader)?;
    let id_col = table.require(&["taxid", "id"], "taxid")?;
    let state_col = table.column(&["coverage_state"]);
    let flag_cols = match state_col {
        Some(_) => None,
        None => Some((
            table.require(&["has_assembly"], "has_assembly")?,
            table.column(&["has_annotation"]),
            table.column(&["has_reads"]),
        )),
    };

    let mut observations = Vec::new();
    while let Some(row) = table.next_row()? {
        let id = parse_id(row.get(id_col), row.line, "taxid")?;
        let state = match (state_col, flag_cols) {
            (Some(col), _) => parse_state(row.get(col), row.line)?,
            (None, Some((assembly, annotation, reads))) => CoverageFlags {
                has_assembly: parse_flag(row.get(assembly), row.line, "has_assembly")?,
                has_annotation: match annotation {
                    Some(col) => parse_flag(row.get(col), row.line, "has_annotation")?,
                    None => false,
                },
                has_reads: match reads {
                    Some(col) => parse_flag(row.get(col), row.line, "has_reads")?,
                    None => false,
                },
            }
            .state(),
            (None, None) => CoverageState::NoData,
        };
        observations.push((id, state));
    }
    Ok(observations)
}

/// Read an edge list from a file.
pub fn read_edges_file(path: &Path) -> Result<Vec<Edge>, SourceError> {
    read_edges(open(path)?)
}

/// Read coverage observations from a file.
pub fn read_observations_file(path: &Path) -> Result<Vec<(TaxonId, CoverageState)>, SourceError> {
    read_observations(open(path)?)
}

fn open(path: &Path) -> Result<BufReader<File>, SourceError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn parse_id(value: &str, line: usize, column: &'static str) -> Result<TaxonId, SourceError> {
    value.parse().map_err(|_| SourceError::InvalidValue {
        line,
        column,
        value: value.to_string(),
    })
}

fn parse_state(value: &str, line: usize) -> Result<CoverageState, SourceError> {
    value
        .parse::<u8>()
        .ok()
        .and_then(|v| CoverageState::try_from(v).ok())
        .ok_or_else(|| SourceError::InvalidValue {
            line,
            column: "coverage_state",
            value: value.to_string(),
        })
}

fn parse_flag(value: &str, line: usize, column: &'static str) -> Result<bool, SourceError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" => Ok(true),
        "" | "0" | "false" | "f" | "no" | "n" => Ok(false),
        _ => Err(SourceError::InvalidValue {
            line,
            column,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeBuilder;

    #[test]
    fn test_read_edges() {
        let input = "id\tparent_id\tname\trank\n\
                     1\t\tLife\tno rank\n\
                     2\t1\tAnimals\tkingdom\n\
                     # comment\n\
                     \n\
                     3\t2\tCats\tfamily\n";
        let edges = read_edges(input.as_bytes()).unwrap();
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[0].parent_id, None);
        assert_eq!(edges[1].parent_id, Some(1));
        assert_eq!(edges[2].name.as_deref(), Some("Cats"));
        assert_eq!(edges[2].rank.as_deref(), Some("family"));

        let tree = TreeBuilder::from_edges(edges).unwrap();
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_quotes_are_literal_and_rows_may_be_ragged() {
        let input = "parent_id\tid\tname\trank\n\
                     \t1\t\"Candidatus\" Foo\n\
                     1\t2\n";
        let edges = read_edges(input.as_bytes()).unwrap();
        assert_eq!(edges[0].name.as_deref(), Some("\"Candidatus\" Foo"));
        assert_eq!(edges[0].rank.as_deref(), Some(""));
        assert_eq!(edges[1].name.as_deref(), Some(""));
    }

    #[test]
    fn test_root_sentinels() {
        for sentinel in ["", "0", "-1"] {
            let input = format!("parent_id\tid\n{sentinel}\t7\n7\t8\n");
            let edges = read_edges(input.as_bytes()).unwrap();
            assert_eq!(edges[0].parent_id, None, "sentinel {sentinel:?}");
        }
    }

    #[test]
    fn test_edges_optional_columns_absent() {
        let edges = read_edges("parent_id\tid\n\t1\n".as_bytes()).unwrap();
        assert_eq!(edges[0].name, None);
        assert_eq!(edges[0].rank, None);
    }

    #[test]
    fn test_edges_missing_column() {
        let err = read_edges("id\tname\n1\tx\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn("parent_id")));
    }

    #[test]
    fn test_edges_invalid_id() {
        let err = read_edges("parent_id\tid\n\tabc\n".as_bytes()).unwrap_err();
        match err {
            SourceError::InvalidValue { line, column, value } => {
                assert_eq!(line, 2);
                assert_eq!(column, "id");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            read_edges("".as_bytes()),
            Err(SourceError::MissingHeader)
        ));
    }

    #[test]
    fn test_read_observation_flags() {
        let input = "taxid\thas_assembly\thas_annotation\thas_reads\n\
                     10\t1\t1\t1\n\
                     11\ttrue\tfalse\tfalse\n\
                     12\t0\t0\t1\n\
                     13\t\t\t\n";
        let observations = read_observations(input.as_bytes()).unwrap();
        assert_eq!(
            observations,
            vec![
                (10, CoverageState::Full),
                (11, CoverageState::GenomeOnly),
                (12, CoverageState::ReadsOnly),
                (13, CoverageState::NoData),
            ]
        );
    }

    #[test]
    fn test_read_observation_states() {
        let input = "id\tcoverage_state\n4\t5\n5\t2\n";
        let observations = read_observations(input.as_bytes()).unwrap();
        assert_eq!(
            observations,
            vec![(4, CoverageState::Full), (5, CoverageState::GenomeOnly)]
        );

        let err = read_observations("id\tcoverage_state\n4\t9\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SourceError::InvalidValue { line: 2, .. }));
    }

    #[test]
    fn test_invalid_flag() {
        let err =
            read_observations("taxid\thas_assembly\n1\tmaybe\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            SourceError::InvalidValue {
                column: "has_assembly",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = read_edges_file(Path::new("/nonexistent/edges.tsv")).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
