use crate::error::{AlignerError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Range;

/// An opaque token. Equality is exact string equality.
pub type Token = String;

/// Ordered sequence of rows produced by the aligner or the stitcher
pub type Alignment = Vec<AlignedRow>;

/// One output pairing of the alignment.
///
/// A row with both sides absent cannot be represented. On the wire a row is a
/// two-element array `[left|null, right|null]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlignedRow {
    /// Both sides present
    Match { left: Token, right: Token },

    /// Left token present, right side absent
    GapLeft(Token),

    /// Right token present, left side absent
    GapRight(Token),
}

/// Which side of the alignment a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Serialize for AlignedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (self.left(), self.right()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AlignedRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (left, right) = <(Option<Token>, Option<Token>)>::deserialize(deserializer)?;
        Self::from_pair(left, right).map_err(serde::de::Error::custom)
    }
}

impl AlignedRow {
    /// Builder: row with both sides present
    pub fn matched(left: impl Into<Token>, right: impl Into<Token>) -> Self {
        Self::Match {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Builder: left token only
    pub fn gap_left(left: impl Into<Token>) -> Self {
        Self::GapLeft(left.into())
    }

    /// Builder: right token only
    pub fn gap_right(right: impl Into<Token>) -> Self {
        Self::GapRight(right.into())
    }

    /// Build a row from a pair of optional tokens.
    ///
    /// Fails when both sides are absent.
    pub fn from_pair(left: Option<Token>, right: Option<Token>) -> Result<Self> {
        match (left, right) {
            (Some(left), Some(right)) => Ok(Self::Match { left, right }),
            (Some(left), None) => Ok(Self::GapLeft(left)),
            (None, Some(right)) => Ok(Self::GapRight(right)),
            (None, None) => Err(AlignerError::invariant(
                "aligned row with both sides absent",
            )),
        }
    }

    #[must_use]
    pub fn into_pair(self) -> (Option<Token>, Option<Token>) {
        match self {
            Self::Match { left, right } => (Some(left), Some(right)),
            Self::GapLeft(left) => (Some(left), None),
            Self::GapRight(right) => (None, Some(right)),
        }
    }

    #[must_use]
    pub fn left(&self) -> Option<&str> {
        match self {
            Self::Match { left, .. } | Self::GapLeft(left) => Some(left),
            Self::GapRight(_) => None,
        }
    }

    #[must_use]
    pub fn right(&self) -> Option<&str> {
        match self {
            Self::Match { right, .. } | Self::GapRight(right) => Some(right),
            Self::GapLeft(_) => None,
        }
    }

    /// Token on the given side, if present
    #[must_use]
    pub fn side(&self, side: Side) -> Option<&str> {
        match side {
            Side::Left => self.left(),
            Side::Right => self.right(),
        }
    }

    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }

    #[must_use]
    pub const fn is_gap(&self) -> bool {
        !self.is_match()
    }

    /// Present tokens tagged with their side
    pub fn tokens(&self) -> impl Iterator<Item = (Side, &str)> {
        self.left()
            .map(|t| (Side::Left, t))
            .into_iter()
            .chain(self.right().map(|t| (Side::Right, t)))
    }

    /// True when both rows carry a token on the same side and the tokens differ
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        let differs =
            |a: Option<&str>, b: Option<&str>| matches!((a, b), (Some(a), Some(b)) if a != b);
        differs(self.left(), other.left()) || differs(self.right(), other.right())
    }

    /// True when every token `other` carries is carried by `self` on the same side
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.tokens().all(|(side, token)| self.side(side) == Some(token))
    }

    /// Merge two rows describing the same position.
    ///
    /// Rows are compatible when they share at least one token on the same side and
    /// disagree on none. The merged row carries the union of both sides, so a gap
    /// paired with a row supplying its missing side is upgraded to a match.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Option<Self> {
        if self.conflicts_with(other) {
            return None;
        }
        let shared = self.tokens().any(|(side, token)| other.side(side) == Some(token));
        if !shared {
            return None;
        }
        let left = self.left().or_else(|| other.left()).map(str::to_string);
        let right = self.right().or_else(|| other.right()).map(str::to_string);
        Self::from_pair(left, right).ok()
    }
}

impl fmt::Display for AlignedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {}",
            self.left().unwrap_or(""),
            self.right().unwrap_or("")
        )
    }
}

/// Alignment computed over one window of the two inputs.
///
/// `left` and `right` are the index ranges of the inputs the window selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub left: Range<usize>,
    pub right: Range<usize>,
    pub rows: Alignment,
}

impl Chunk {
    #[must_use]
    pub const fn new(
        index: usize,
        left: Range<usize>,
        right: Range<usize>,
        rows: Alignment,
    ) -> Self {
        Self {
            index,
            left,
            right,
            rows,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl AsRef<[AlignedRow]> for Chunk {
    fn as_ref(&self) -> &[AlignedRow] {
        &self.rows
    }
}

/// Left tokens in row order
#[must_use]
pub fn left_projection(rows: &[AlignedRow]) -> Vec<&str> {
    rows.iter().filter_map(AlignedRow::left).collect()
}

/// Right tokens in row order
#[must_use]
pub fn right_projection(rows: &[AlignedRow]) -> Vec<&str> {
    rows.iter().filter_map(AlignedRow::right).collect()
}

/// Maximal runs of consecutive gap rows, as row index ranges
#[must_use]
pub fn gap_blocks(rows: &[AlignedRow]) -> Vec<Range<usize>> {
    let mut blocks = Vec::new();
    let mut start = None;
    for (idx, row) in rows.iter().enumerate() {
        match (row.is_gap(), start) {
            (true, None) => start = Some(idx),
            (false, Some(begin)) => {
                blocks.push(begin..idx);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = start {
        blocks.push(begin..rows.len());
    }
    blocks
}

/// Check that projecting `rows` onto each side reproduces the inputs in order.
pub fn verify_coverage(rows: &[AlignedRow], left: &[Token], right: &[Token]) -> Result<()> {
    verify_side("left", &left_projection(rows), left)?;
    verify_side("right", &right_projection(rows), right)
}

fn verify_side(label: &str, projected: &[&str], expected: &[Token]) -> Result<()> {
    if let Some(pos) = projected
        .iter()
        .zip(expected)
        .position(|(got, want)| *got != want.as_str())
    {
        return Err(AlignerError::invariant(format!(
            "{label} projection diverges at token {pos}: expected '{}', found '{}'",
            expected[pos], projected[pos]
        )));
    }
    if projected.len() != expected.len() {
        return Err(AlignerError::invariant(format!(
            "{label} projection has {} tokens, input has {}",
            projected.len(),
            expected.len()
        )));
    }
    Ok(())
}
