//! Merging of per-window alignments into one global alignment.
//!
//! Every join works on a bounded window of `2 * overlap_size` rows at the end of
//! the accumulated result (the tail window) and at the start of the incoming chunk
//! (the head window):
//!
//! ```text
//! accumulator  ... frozen ... | tail window (<= W_max rows)
//!                                     p = compatible anchor
//! new chunk                    head window | rest of chunk
//!                              q = first Match (canonical anchor)
//! ```
//!
//! Rows before `p` stay in place, head gaps before `q` are reconciled against them,
//! rows from `p`/`q` onward are merged pairwise until the first conflict, and the
//! rest of the chunk is appended unchanged.

use crate::error::{AlignerError, Result};
use crate::types::{AlignedRow, Alignment, Side};
use std::collections::HashSet;

/// Result of one join: drop `retract` rows from the end of the accumulator,
/// then append `rows`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub retract: usize,
    pub rows: Vec<AlignedRow>,
    pub outcome: JoinOutcome,
}

/// How a chunk was joined onto the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// First chunk, copied verbatim
    Seeded,

    /// The head window holds no Match row; chunk appended unchanged
    NoHeadAnchor,

    /// The canonical anchor has no compatible row in the tail window; chunk
    /// appended unchanged
    Unanchored,

    /// Chunk reconciled around the anchor
    Anchored {
        /// Anchor position inside the tail window
        tail_index: usize,
        /// Anchor position inside the head window
        head_index: usize,
        /// Rows merged pairwise from the anchor forward
        merged: usize,
        /// Head gaps before the anchor that had no counterpart in the tail
        leftovers: usize,
        /// Tail rows dropped because the chunk re-supplies their tokens
        superseded: usize,
        /// Whether the forward walk stopped on disagreeing rows
        conflict: bool,
    },
}

impl Splice {
    fn append(chunk: &[AlignedRow], outcome: JoinOutcome) -> Self {
        Self {
            retract: 0,
            rows: chunk.to_vec(),
            outcome,
        }
    }
}

/// Index of the first Match row: the synchronization landmark of a chunk
#[must_use]
pub fn canonical_anchor(head_window: &[AlignedRow]) -> Option<usize> {
    head_window.iter().position(AlignedRow::is_match)
}

/// Closest row (searching backward) that the anchor equals or upgrades
fn find_tail_anchor(tail_window: &[AlignedRow], anchor: &AlignedRow) -> Option<usize> {
    (0..tail_window.len())
        .rev()
        .find(|&idx| anchor.covers(&tail_window[idx]))
}

/// Join `chunk` onto `tail`, the end of the accumulated alignment.
///
/// `tail` may be the whole accumulator or any suffix of it with at least
/// `2 * overlap_size` rows; only that many rows are examined. The returned
/// [`Splice`] is relative to the end of `tail`.
#[must_use]
pub fn stitch_two(tail: &[AlignedRow], chunk: &[AlignedRow], overlap_size: usize) -> Splice {
    let window = overlap_size.saturating_mul(2);
    let tail_window = &tail[tail.len().saturating_sub(window)..];
    let head_window = &chunk[..chunk.len().min(window)];

    let Some(head_index) = canonical_anchor(head_window) else {
        return Splice::append(chunk, JoinOutcome::NoHeadAnchor);
    };
    let anchor = &head_window[head_index];
    let Some(tail_index) = find_tail_anchor(tail_window, anchor) else {
        return Splice::append(chunk, JoinOutcome::Unanchored);
    };

    let leftovers = reconcile_head_prefix(&tail_window[..tail_index], &head_window[..head_index]);
    let walk = walk_forward(&tail_window[tail_index..], &chunk[head_index..]);

    // Tokens the new rows will carry near the join; a stale tail row whose
    // tokens all reappear here is a duplicate, anything else must be kept.
    let horizon_end = chunk.len().min(head_index + walk.head_next + window);
    let supplied: HashSet<(Side, &str)> = leftovers
        .iter()
        .chain(&walk.merged)
        .chain(&chunk[head_index + walk.head_next..horizon_end])
        .flat_map(AlignedRow::tokens)
        .collect();

    let mut superseded = 0;
    let mut kept = Vec::new();
    for row in &tail_window[tail_index + walk.tail_next..] {
        if row.tokens().all(|token| supplied.contains(&token)) {
            superseded += 1;
        } else {
            kept.push(row.clone());
        }
    }

    let outcome = JoinOutcome::Anchored {
        tail_index,
        head_index,
        merged: walk.merged.len(),
        leftovers: leftovers.len(),
        superseded,
        conflict: walk.conflict,
    };

    let remaining = chunk[head_index..]
        .iter()
        .enumerate()
        .skip(walk.head_next)
        .filter(|(idx, _)| !walk.taken.contains(idx))
        .map(|(_, row)| row.clone());

    let mut rows = leftovers;
    rows.extend(walk.merged);
    rows.extend(kept);
    rows.extend(remaining);

    Splice {
        retract: tail_window.len() - tail_index,
        rows,
        outcome,
    }
}

/// Pair the head gaps that precede the anchor with the tail rows that precede it.
///
/// Walking outward from the anchor, each head gap is searched for among the tail
/// rows before the anchor, closest first, and pairs with the first row carrying
/// the same token on the same side. Tail gaps with other tokens are skipped
/// because gap order inside a block is a tie-breaking artifact; a tail Match
/// with a different token on that side ends the search. Head gaps with no
/// counterpart are returned in head order.
fn reconcile_head_prefix(
    tail_prefix: &[AlignedRow],
    head_prefix: &[AlignedRow],
) -> Vec<AlignedRow> {
    debug_assert!(head_prefix.iter().all(AlignedRow::is_gap));

    // Per side: which tail rows already supplied that side's token.
    let mut consumed = vec![[false; 2]; tail_prefix.len()];
    // Per side: a Match that absorbed a later head gap caps the search for
    // earlier gaps on that side, so Match rows keep their order. The other
    // side is unaffected.
    let mut bound = [tail_prefix.len(); 2];
    let mut leftovers = Vec::new();

    for head_row in head_prefix.iter().rev() {
        let Some((side, token)) = head_row.tokens().next() else {
            continue;
        };
        let slot = side_slot(side);
        let mut paired = false;

        for idx in (0..bound[slot]).rev() {
            if consumed[idx][slot] {
                continue;
            }
            let tail_row = &tail_prefix[idx];
            if tail_row.side(side) == Some(token) {
                consumed[idx][slot] = true;
                if tail_row.is_match() {
                    bound[slot] = idx;
                }
                paired = true;
                break;
            }
            if tail_row.is_match() {
                break;
            }
        }

        if !paired {
            leftovers.push(head_row.clone());
        }
    }

    leftovers.reverse();
    leftovers
}

const fn side_slot(side: Side) -> usize {
    match side {
        Side::Left => 0,
        Side::Right => 1,
    }
}

struct ForwardWalk {
    merged: Vec<AlignedRow>,
    /// First tail row (relative to the anchor) that was not merged
    tail_next: usize,
    /// First head row (relative to the anchor) that was not merged
    head_next: usize,
    /// Head rows at or after `head_next` consumed out of position
    taken: HashSet<usize>,
    conflict: bool,
}

/// Merge tail and head rows pairwise starting at the anchor.
///
/// Two gaps that do not merge positionally may still pair by identity inside the
/// head's current gap block; the tail order wins. Any other disagreement stops
/// the walk.
fn walk_forward(tail_rest: &[AlignedRow], head_rest: &[AlignedRow]) -> ForwardWalk {
    let mut merged = Vec::new();
    let mut taken = HashSet::new();
    let (mut i, mut j) = (0, 0);
    let mut conflict = false;

    while i < tail_rest.len() {
        while taken.contains(&j) {
            j += 1;
        }
        let Some(head_row) = head_rest.get(j) else {
            break;
        };
        let tail_row = &tail_rest[i];

        if let Some(row) = tail_row.merge(head_row) {
            merged.push(row);
            i += 1;
            j += 1;
            continue;
        }

        if tail_row.is_gap() && head_row.is_gap() {
            let permuted = (j + 1..head_rest.len())
                .take_while(|&k| head_rest[k].is_gap())
                .find(|&k| !taken.contains(&k) && head_rest[k] == *tail_row);
            if let Some(k) = permuted {
                taken.insert(k);
                merged.push(tail_row.clone());
                i += 1;
                continue;
            }
        }

        conflict = true;
        break;
    }

    ForwardWalk {
        merged,
        tail_next: i,
        head_next: j,
        taken,
        conflict,
    }
}

/// Global alignment under construction.
///
/// Rows before the frozen cursor are final. Each join may only rewrite rows in the
/// tail window after the cursor, and the cursor never moves backward.
#[derive(Debug, Clone)]
pub struct Accumulator {
    rows: Alignment,
    frozen: usize,
    overlap_size: usize,
    joins: usize,
}

impl Accumulator {
    #[must_use]
    pub const fn new(overlap_size: usize) -> Self {
        Self {
            rows: Vec::new(),
            frozen: 0,
            overlap_size,
            joins: 0,
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    /// Number of leading rows that can no longer change
    #[must_use]
    pub const fn frozen(&self) -> usize {
        self.frozen
    }

    /// Number of chunks joined so far
    #[must_use]
    pub const fn joins(&self) -> usize {
        self.joins
    }

    #[must_use]
    pub fn into_rows(self) -> Alignment {
        self.rows
    }

    /// Merge the next chunk. The first chunk seeds the accumulator verbatim.
    pub fn join(&mut self, chunk: &[AlignedRow]) -> Result<JoinOutcome> {
        self.joins += 1;
        if self.joins == 1 {
            self.rows.extend_from_slice(chunk);
            return Ok(JoinOutcome::Seeded);
        }

        let window = self.overlap_size.saturating_mul(2);
        self.frozen = self.frozen.max(self.rows.len().saturating_sub(window));
        let splice = stitch_two(&self.rows[self.frozen..], chunk, self.overlap_size);
        self.apply(splice)
    }

    fn apply(&mut self, splice: Splice) -> Result<JoinOutcome> {
        let live = self.rows.len() - self.frozen;
        if splice.retract > live {
            return Err(AlignerError::invariant(format!(
                "join retracts {} rows but only {live} are past the frozen boundary",
                splice.retract
            )));
        }
        self.rows.truncate(self.rows.len() - splice.retract);
        self.rows.extend(splice.rows);
        Ok(splice.outcome)
    }
}

/// Fold an ordered sequence of chunks into one alignment.
///
/// Zero chunks yield an empty alignment and a single chunk is returned unchanged.
///
/// Rows are reconciled by token identity, so a token repeated inside the
/// overlap window can pair with the wrong occurrence and the result may not
/// cover the inputs. Callers check coverage; this is a known limitation.
pub fn stitch_all<I>(chunks: I, overlap_size: usize) -> Result<Alignment>
where
    I: IntoIterator,
    I::Item: AsRef<[AlignedRow]>,
{
    let mut acc = Accumulator::new(overlap_size);
    let mut unreconciled = 0usize;
    let mut conflicts = 0usize;

    for chunk in chunks {
        let outcome = acc.join(chunk.as_ref())?;
        log::debug!("Join {}: {outcome:?} ({} rows)", acc.joins(), acc.rows().len());
        match outcome {
            JoinOutcome::NoHeadAnchor | JoinOutcome::Unanchored => {
                unreconciled += 1;
                log::warn!(
                    "Chunk {} appended without reconciliation ({outcome:?})",
                    acc.joins() - 1
                );
            }
            JoinOutcome::Anchored { conflict: true, .. } => conflicts += 1,
            _ => {}
        }
    }

    log::info!(
        "Stitched {} chunks into {} rows ({unreconciled} unreconciled, {conflicts} with conflicts)",
        acc.joins(),
        acc.rows().len()
    );
    Ok(acc.into_rows())
}
