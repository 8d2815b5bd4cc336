//! Plain-text pair format used by hand-written fixtures.
//!
//! One row per line, `left , right`. Whitespace around each side is trimmed and
//! a blank side is absent. A line without a comma carries only a left token.
//! Blank lines are skipped.

use crate::AlignmentInput;
use semalign_aligner::{AlignedRow, Token};

fn side(raw: &str) -> Option<Token> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse pair text into row-shaped input
#[must_use]
pub fn parse_pairs_text(text: &str) -> AlignmentInput {
    let rows = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.split_once(',') {
            Some((left, right)) => (side(left), side(right)),
            None => (side(line), None),
        })
        .collect();
    AlignmentInput::Rows(rows)
}

/// Render rows back into pair text, one `left , right` line per row
#[must_use]
pub fn render_pairs_text(rows: &[AlignedRow]) -> String {
    let width = rows
        .iter()
        .filter_map(AlignedRow::left)
        .map(|t| t.chars().count())
        .max()
        .unwrap_or(0);
    rows.iter()
        .map(|row| {
            format!(
                "{:<width$} , {}\n",
                row.left().unwrap_or(""),
                row.right().unwrap_or("")
            )
            .replace(" \n", "\n")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_aligned_columns_with_tabs_and_blanks() {
        let text = "\
watch a tutorial to learn a new skill      , watch a tutorial
create a list of emergency contacts\t, create a list
                                           , distribute it to family members

set boundaries for personal time           ,
";
        let AlignmentInput::Rows(rows) = parse_pairs_text(text) else {
            panic!("expected row input");
        };
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].0.as_deref(), Some("create a list of emergency contacts"));
        assert_eq!(rows[2], (None, Some("distribute it to family members".to_string())));
        assert_eq!(rows[3], (Some("set boundaries for personal time".to_string()), None));
    }

    #[test]
    fn line_without_comma_is_left_only() {
        let (left, right) = parse_pairs_text("alpha\n").into_sides();
        assert_eq!(left, vec!["alpha"]);
        assert!(right.is_empty());
    }

    #[test]
    fn rendered_text_parses_back() {
        let rows = vec![
            AlignedRow::gap_left("dog"),
            AlignedRow::gap_right("cat"),
            AlignedRow::matched("pizza", "pizza pie"),
        ];
        let text = render_pairs_text(&rows);
        assert_eq!(text, "dog   ,\n      , cat\npizza , pizza pie\n");
        let AlignmentInput::Rows(parsed) = parse_pairs_text(&text) else {
            panic!("expected row input");
        };
        let back: Vec<AlignedRow> = parsed
            .into_iter()
            .map(|(l, r)| AlignedRow::from_pair(l, r).unwrap())
            .collect();
        assert_eq!(back, rows);
    }
}
