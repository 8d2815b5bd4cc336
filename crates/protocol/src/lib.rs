use anyhow::Result;
use semalign_aligner::{gap_blocks, AlignedRow, Token};
use serde::{Deserialize, Serialize};

pub mod fixture;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Two token sequences in either accepted shape.
///
/// `null` entries are gaps left over from a previous alignment and are dropped
/// from their side.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum AlignmentInput {
    /// `{"left": [...], "right": [...]}`
    Columns {
        left: Vec<Option<Token>>,
        right: Vec<Option<Token>>,
    },
    /// `[[left|null, right|null], ...]`
    Rows(Vec<(Option<Token>, Option<Token>)>),
}

impl AlignmentInput {
    #[must_use]
    pub fn from_sides(left: Vec<Token>, right: Vec<Token>) -> Self {
        Self::Columns {
            left: left.into_iter().map(Some).collect(),
            right: right.into_iter().map(Some).collect(),
        }
    }

    /// Left and right sequences with gaps removed
    #[must_use]
    pub fn into_sides(self) -> (Vec<Token>, Vec<Token>) {
        match self {
            Self::Columns { left, right } => (
                left.into_iter().flatten().collect(),
                right.into_iter().flatten().collect(),
            ),
            Self::Rows(rows) => {
                let (left, right): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
                (
                    left.into_iter().flatten().collect(),
                    right.into_iter().flatten().collect(),
                )
            }
        }
    }
}

/// Pre-computed chunk alignments to fold into one
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StitchRequest {
    #[serde(default)]
    pub overlap_size: Option<usize>,
    pub chunks: Vec<Vec<AlignedRow>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentMode {
    SingleShot,
    Chunked,
    Stitch,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlignmentStats {
    pub rows: usize,
    pub matches: usize,
    pub gap_left: usize,
    pub gap_right: usize,
    pub gap_blocks: usize,
}

impl AlignmentStats {
    #[must_use]
    pub fn from_rows(rows: &[AlignedRow]) -> Self {
        let mut stats = Self {
            rows: rows.len(),
            gap_blocks: gap_blocks(rows).len(),
            ..Self::default()
        };
        for row in rows {
            match row {
                AlignedRow::Match { .. } => stats.matches += 1,
                AlignedRow::GapLeft(_) => stats.gap_left += 1,
                AlignedRow::GapRight(_) => stats.gap_right += 1,
            }
        }
        stats
    }
}

/// JSON output of an alignment run
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AlignmentReport {
    pub schema_version: u32,
    pub mode: AlignmentMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap_size: Option<usize>,
    pub stats: AlignmentStats,
    pub rows: Vec<AlignedRow>,
}

impl AlignmentReport {
    #[must_use]
    pub fn new(mode: AlignmentMode, rows: Vec<AlignedRow>) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            mode,
            model: None,
            gap_penalty: None,
            chunk_size: None,
            overlap_size: None,
            stats: AlignmentStats::from_rows(&rows),
            rows,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
