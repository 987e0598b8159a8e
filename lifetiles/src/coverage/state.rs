//! The six-state coverage enum.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered coverage state; higher is better.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum CoverageState {
    /// No assembly, annotation or reads.
    #[default]
    NoData = 0,
    /// Sequencing reads without an assembly.
    ReadsOnly = 1,
    /// Assembly only.
    GenomeOnly = 2,
    /// Assembly and reads, no annotation.
    GenomeReadsNoAnnotation = 3,
    /// Annotated assembly, no reads.
    GenomeAnnotationOnly = 4,
    /// Annotated assembly plus reads.
    Full = 5,
}

/// A byte outside `0..=5` was read as a coverage state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid coverage state {0} (expected 0-5)")]
pub struct InvalidCoverageState(pub u8);

impl CoverageState {
    /// All states in ascending order.
    pub const ALL: [CoverageState; 6] = [
        CoverageState::NoData,
        CoverageState::ReadsOnly,
        CoverageState::GenomeOnly,
        CoverageState::GenomeReadsNoAnnotation,
        CoverageState::GenomeAnnotationOnly,
        CoverageState::Full,
    ];

    /// Numeric encoding used in tiles.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Upper-case label.
    pub fn label(self) -> &'static str {
        match self {
            CoverageState::NoData => "NO_DATA",
            CoverageState::ReadsOnly => "READS_ONLY",
            CoverageState::GenomeOnly => "GENOME_ONLY",
            CoverageState::GenomeReadsNoAnnotation => "GENOME_READS_NO_ANNOTATION",
            CoverageState::GenomeAnnotationOnly => "GENOME_ANNOTATION_ONLY",
            CoverageState::Full => "FULL",
        }
    }
}

impl From<CoverageState> for u8 {
    fn from(state: CoverageState) -> Self {
        state.as_u8()
    }
}

impl TryFrom<u8> for CoverageState {
    type Error = InvalidCoverageState;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        CoverageState::ALL
            .get(value as usize)
            .copied()
            .ok_or(InvalidCoverageState(value))
    }
}

impl fmt::Display for CoverageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw per-species data availability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoverageFlags {
    pub has_assembly: bool,
    pub has_annotation: bool,
    pub has_reads: bool,
}

impl CoverageFlags {
    /// Create a flag set.
    pub fn new(has_assembly: bool, has_annotation: bool, has_reads: bool) -> Self {
        Self {
            has_assembly,
            has_annotation,
            has_reads,
        }
    }

    /// Collapse the flags into a single state.
    ///
    /// An annotation implies an assembly, so annotation alone is enough for
    /// the two annotated states.
    pub fn state(self) -> CoverageState {
        match (self.has_assembly, self.has_annotation, self.has_reads) {
            (_, true, true) => CoverageState::Full,
            (_, true, false) => CoverageState::GenomeAnnotationOnly,
            (true, false, true) => CoverageState::GenomeReadsNoAnnotation,
            (true, false, false) => CoverageState::GenomeOnly,
            (false, false, true) => CoverageState::ReadsOnly,
            (false, false, false) => CoverageState::NoData,
        }
    }
}

impl From<CoverageFlags> for CoverageState {
    fn from(flags: CoverageFlags) -> Self {
        flags.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(CoverageState::NoData < CoverageState::ReadsOnly);
        assert!(CoverageState::GenomeAnnotationOnly < CoverageState::Full);
        assert_eq!(
            CoverageState::ALL.iter().max(),
            Some(&CoverageState::Full)
        );
    }

    #[test]
    fn test_u8_conversion() {
        for (i, state) in CoverageState::ALL.iter().enumerate() {
            assert_eq!(state.as_u8() as usize, i);
            assert_eq!(CoverageState::try_from(i as u8), Ok(*state));
        }
        assert_eq!(CoverageState::try_from(6), Err(InvalidCoverageState(6)));
    }

    #[test]
    fn test_flags_classification() {
        let cases = [
            ((true, true, true), CoverageState::Full),
            ((false, true, true), CoverageState::Full),
            ((true, true, false), CoverageState::GenomeAnnotationOnly),
            ((true, false, true), CoverageState::GenomeReadsNoAnnotation),
            ((true, false, false), CoverageState::GenomeOnly),
            ((false, false, true), CoverageState::ReadsOnly),
            ((false, false, false), CoverageState::NoData),
        ];
        for ((asm, ann, reads), expected) in cases {
            assert_eq!(CoverageFlags::new(asm, ann, reads).state(), expected);
        }
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&CoverageState::GenomeOnly).unwrap();
        assert_eq!(json, "2");
        let back: CoverageState = serde_json::from_str("5").unwrap();
        assert_eq!(back, CoverageState::Full);
        assert!(serde_json::from_str::<CoverageState>("9").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(CoverageState::Full.to_string(), "FULL");
    }
}
