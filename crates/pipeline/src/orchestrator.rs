use crate::error::{PipelineError, Result};
use crate::options::AlignOptions;
use semalign_aligner::{
    align, stitch_all, verify_coverage, AlignedRow, AlignerError, Alignment, Chunk, Token,
};
use semalign_chunker::Chunker;
use semalign_embedder::{Embedder, EmbeddingTable};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Align two token sequences by semantic similarity.
///
/// Every distinct token is embedded once before any alignment work starts, so an
/// embedding failure leaves nothing half-built. Without `chunk_size` the whole
/// input is aligned in one pass; otherwise every window is aligned on the
/// blocking pool in parallel and the windows are stitched in order.
pub async fn align_sequences(
    left: &[Token],
    right: &[Token],
    options: &AlignOptions,
    embedder: Arc<dyn Embedder>,
) -> Result<Alignment> {
    options.validate()?;
    log::info!(
        "Aligning {}x{} tokens ({})",
        left.len(),
        right.len(),
        options
            .chunk_size
            .map_or_else(|| "single-shot".to_string(), |size| format!("chunk_size={size}"))
    );

    let tokens = left.iter().chain(right).map(String::as_str);
    let table = Arc::new(EmbeddingTable::build(embedder, tokens, options.embed_limits()).await?);
    let gap_penalty = options.gap_penalty;
    let left: Arc<[Token]> = Arc::from(left);
    let right: Arc<[Token]> = Arc::from(right);

    let rows = match options.chunker_config() {
        None => {
            let (table, l, r) = (table.clone(), left.clone(), right.clone());
            tokio::task::spawn_blocking(move || {
                align(&l, &r, gap_penalty, |a, b| table.distance(a, b, gap_penalty))
            })
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))??
        }
        Some(config) => {
            let chunker = Chunker::new(config)?;
            let plan = chunker.plan(left.len(), right.len());
            let mut tasks = JoinSet::new();
            for window in plan {
                let (table, l, r) = (table.clone(), left.clone(), right.clone());
                tasks.spawn_blocking(move || {
                    let rows = align(
                        &l[window.left.clone()],
                        &r[window.right.clone()],
                        gap_penalty,
                        |a, b| table.distance(a, b, gap_penalty),
                    )?;
                    Ok::<_, AlignerError>(Chunk::new(window.index, window.left, window.right, rows))
                });
            }

            let mut chunks = Vec::with_capacity(tasks.len());
            while let Some(joined) = tasks.join_next().await {
                chunks.push(joined.map_err(|e| PipelineError::Task(e.to_string()))??);
            }
            chunks.sort_by_key(|chunk| chunk.index);
            stitch_all(&chunks, chunker.overlap())?
        }
    };

    verify_output(&rows, &left, &right)?;
    Ok(rows)
}

/// Same dispatch as [`align_sequences`] with a caller-supplied distance and no
/// embedding step. Windows are aligned sequentially.
pub fn align_sequences_with<F>(
    left: &[Token],
    right: &[Token],
    options: &AlignOptions,
    mut distance: F,
) -> Result<Alignment>
where
    F: FnMut(&str, &str) -> f64,
{
    options.validate()?;

    let rows = match options.chunker_config() {
        None => align(left, right, options.gap_penalty, distance)?,
        Some(config) => {
            let chunker = Chunker::new(config)?;
            let plan = chunker.plan(left.len(), right.len());
            let chunks = chunker
                .split(&plan, left, right)
                .map(|slices| {
                    align(slices.left, slices.right, options.gap_penalty, &mut distance)
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            stitch_all(&chunks, chunker.overlap())?
        }
    };

    verify_output(&rows, left, right)?;
    Ok(rows)
}

fn verify_output(rows: &[AlignedRow], left: &[Token], right: &[Token]) -> Result<()> {
    verify_coverage(rows, left, right).map_err(|err| {
        log::error!("Rejecting alignment of {} rows: {err}", rows.len());
        PipelineError::from(err)
    })
}
