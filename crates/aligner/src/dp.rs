use crate::error::{AlignerError, Result};
use crate::types::{AlignedRow, Alignment, Token};
use ndarray::Array2;

/// Default cost of leaving a token unpaired
pub const DEFAULT_GAP_PENALTY: f64 = 0.1;

/// Predecessor that produced the minimum for a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Origin,
    Diagonal,
    /// Consume a left token only (right side absent)
    Up,
    /// Consume a right token only (left side absent)
    Left,
}

/// Reject gap penalties that would make the cost recurrence meaningless
pub fn validate_gap_penalty(gap_penalty: f64) -> Result<()> {
    if !gap_penalty.is_finite() || gap_penalty <= 0.0 {
        return Err(AlignerError::invalid_input(format!(
            "gap_penalty must be a finite value > 0, got {gap_penalty}"
        )));
    }
    Ok(())
}

/// Compute the minimum-cost alignment of `left` against `right`.
///
/// `distance` is the cost of pairing two tokens; every unpaired token costs
/// `gap_penalty`. When several predecessors tie, a match is preferred over a
/// left-only gap, which is preferred over a right-only gap. Runs in
/// `O(|left| * |right|)` time and space; the matrices are dropped on return.
pub fn align<F>(
    left: &[Token],
    right: &[Token],
    gap_penalty: f64,
    mut distance: F,
) -> Result<Alignment>
where
    F: FnMut(&str, &str) -> f64,
{
    validate_gap_penalty(gap_penalty)?;

    let (n, m) = (left.len(), right.len());
    log::trace!("Aligning {n}x{m} tokens (gap_penalty={gap_penalty})");

    let mut cost = Array2::<f64>::zeros((n + 1, m + 1));
    let mut steps = Array2::from_elem((n + 1, m + 1), Step::Origin);

    for i in 1..=n {
        cost[[i, 0]] = i as f64 * gap_penalty;
        steps[[i, 0]] = Step::Up;
    }
    for j in 1..=m {
        cost[[0, j]] = j as f64 * gap_penalty;
        steps[[0, j]] = Step::Left;
    }

    for i in 1..=n {
        for j in 1..=m {
            let pair = distance(&left[i - 1], &right[j - 1]);
            // NaN would poison every comparison below
            let pair = if pair.is_nan() { f64::INFINITY } else { pair };

            let mut best = cost[[i - 1, j - 1]] + pair;
            let mut step = Step::Diagonal;

            let up = cost[[i - 1, j]] + gap_penalty;
            if up < best {
                best = up;
                step = Step::Up;
            }
            let across = cost[[i, j - 1]] + gap_penalty;
            if across < best {
                best = across;
                step = Step::Left;
            }

            cost[[i, j]] = best;
            steps[[i, j]] = step;
        }
    }

    let rows = traceback(left, right, &steps)?;
    log::debug!(
        "Alignment complete: {} rows, total cost {:.4}",
        rows.len(),
        cost[[n, m]]
    );
    Ok(rows)
}

fn traceback(left: &[Token], right: &[Token], steps: &Array2<Step>) -> Result<Alignment> {
    let (mut i, mut j) = (left.len(), right.len());
    let mut rows = Vec::with_capacity(i + j);

    while i > 0 || j > 0 {
        match steps[[i, j]] {
            Step::Diagonal => {
                rows.push(AlignedRow::matched(left[i - 1].clone(), right[j - 1].clone()));
                i -= 1;
                j -= 1;
            }
            Step::Up => {
                rows.push(AlignedRow::gap_left(left[i - 1].clone()));
                i -= 1;
            }
            Step::Left => {
                rows.push(AlignedRow::gap_right(right[j - 1].clone()));
                j -= 1;
            }
            Step::Origin => {
                return Err(AlignerError::invariant(format!(
                    "missing backpointer at ({i}, {j})"
                )));
            }
        }
    }

    rows.reverse();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::verify_coverage;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn toks(items: &[&str]) -> Vec<Token> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn exact(a: &str, b: &str) -> f64 {
        if a == b {
            0.0
        } else {
            1.0
        }
    }

    #[test]
    fn identical_sequences_align_diagonally() {
        let seq = toks(&["a", "b", "c"]);
        let rows = align(&seq, &seq, 0.5, exact).unwrap();
        assert_eq!(
            rows,
            vec![
                AlignedRow::matched("a", "a"),
                AlignedRow::matched("b", "b"),
                AlignedRow::matched("c", "c"),
            ]
        );
    }

    #[test]
    fn empty_side_yields_gaps_of_the_other() {
        let seq = toks(&["a", "b"]);
        assert_eq!(
            align(&seq, &[], 0.1, exact).unwrap(),
            vec![AlignedRow::gap_left("a"), AlignedRow::gap_left("b")]
        );
        assert_eq!(
            align(&[], &seq, 0.1, exact).unwrap(),
            vec![AlignedRow::gap_right("a"), AlignedRow::gap_right("b")]
        );
        assert!(align(&[], &[], 0.1, exact).unwrap().is_empty());
    }

    #[test]
    fn cheap_gaps_beat_expensive_matches() {
        // Pairing "a" with "x" costs 1.0, two gaps cost 0.2.
        let rows = align(&toks(&["a"]), &toks(&["x"]), 0.1, exact).unwrap();
        assert_eq!(rows, vec![AlignedRow::gap_right("x"), AlignedRow::gap_left("a")]);
    }

    #[test]
    fn ties_prefer_match_then_left_gap() {
        // Diagonal cost 0.2 equals two gaps at 0.1 each: match wins.
        let rows = align(&toks(&["a"]), &toks(&["x"]), 0.1, |_, _| 0.2).unwrap();
        assert_eq!(rows, vec![AlignedRow::matched("a", "x")]);

        // Both gap orders cost 1.0 and the left-only gap wins the tie at the last
        // cell, so it is emitted last.
        let rows = align(&toks(&["a"]), &toks(&["x"]), 0.5, |_, _| 1.5).unwrap();
        assert_eq!(rows, vec![AlignedRow::gap_right("x"), AlignedRow::gap_left("a")]);
    }

    #[test]
    fn skips_unmatched_token_in_the_middle() {
        let left = toks(&["dog", "pizza", "house"]);
        let right = toks(&["dog", "house"]);
        let rows = align(&left, &right, 0.3, exact).unwrap();
        assert_eq!(
            rows,
            vec![
                AlignedRow::matched("dog", "dog"),
                AlignedRow::gap_left("pizza"),
                AlignedRow::matched("house", "house"),
            ]
        );
    }

    #[test]
    fn nan_distance_never_wins() {
        let rows = align(&toks(&["a"]), &toks(&["b"]), 0.1, |_, _| f64::NAN).unwrap();
        assert!(rows.iter().all(AlignedRow::is_gap));
    }

    #[test]
    fn rejects_non_positive_gap_penalty() {
        for penalty in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = align(&toks(&["a"]), &toks(&["b"]), penalty, exact).unwrap_err();
            assert!(matches!(err, AlignerError::InvalidInput(_)), "{penalty}");
        }
    }

    proptest! {
        #[test]
        fn proptest_alignment_covers_both_inputs(
            left in proptest::collection::vec("[a-d]{1,2}", 0..12),
            right in proptest::collection::vec("[a-d]{1,2}", 0..12),
            gap in 0.05f64..2.0,
        ) {
            let rows = align(&left, &right, gap, exact).unwrap();
            prop_assert!(verify_coverage(&rows, &left, &right).is_ok());
            prop_assert!(rows.len() >= left.len().max(right.len()));
            prop_assert!(rows.len() <= left.len() + right.len());
        }
    }
}
