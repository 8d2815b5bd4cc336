use semalign_aligner::AlignedRow;
use semalign_protocol::AlignmentStats;

/// Numbered two-column table, one line per row; a gap side is left blank
pub fn render_table(rows: &[AlignedRow]) -> String {
    let index_width = rows.len().to_string().len().max(3);
    let left_width = rows
        .iter()
        .filter_map(AlignedRow::left)
        .map(|t| t.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        let line = format!(
            "{:>index_width$}. {:<left_width$} | {}",
            i + 1,
            row.left().unwrap_or(""),
            row.right().unwrap_or("")
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.truncate(out.trim_end().len());
    out
}

pub fn render_summary(stats: &AlignmentStats) -> String {
    format!(
        "{} rows: {} matched, {} left-only, {} right-only, {} gap blocks",
        stats.rows, stats.matches, stats.gap_left, stats.gap_right, stats.gap_blocks
    )
}

/// Vector preview for `semalign embed`
pub fn render_vector(token: &str, vector: &[f32], limit: usize) -> String {
    let shown: Vec<String> = vector.iter().take(limit).map(|v| format!("{v:.4}")).collect();
    let more = if vector.len() > limit { " ..." } else { "" };
    format!("{token}\t[{}]\t{}{more}", vector.len(), shown.join(" "))
}
