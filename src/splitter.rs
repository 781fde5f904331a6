//! Content splitter
//!
//! Packs rendered fragments greedily into chunks of at most `max_bytes`
//! UTF-8 bytes. Chunk boundaries always fall between fragments, so joining
//! the chunks in order gives back exactly the rendered report. Items too
//! large for the budget on their own have their titles shortened while
//! rendering, before any packing happens.

use crate::config::TextFormat;
use crate::error::{Error, Result};
use crate::format::{ELLIPSIS, clip_to_bytes};
use crate::render::render_fitted;
use crate::types::ReportData;

/// Split a report into chunks of at most `max_bytes` bytes
///
/// `max_bytes` is the content budget, i.e. the channel's batch size with the
/// header reserve already subtracted. Only a budget too small for even a
/// shortened item leaves an oversized chunk behind; see [`clamp_oversized`].
///
/// # Errors
///
/// Returns [`Error::BudgetExhausted`] when `max_bytes` is zero.
pub fn split(report: &ReportData, format: TextFormat, max_bytes: usize) -> Result<Vec<String>> {
    if max_bytes == 0 {
        return Err(Error::BudgetExhausted {
            max_batch_bytes: max_bytes,
            header_reserve: 0,
        });
    }
    Ok(pack(render_fitted(report, format, max_bytes), max_bytes))
}

/// Greedily pack fragments into chunks, preserving order
pub fn pack<I>(fragments: I, max_bytes: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut chunks = Vec::new();
    let mut current = String::new();

    for fragment in fragments {
        if current.len() + fragment.len() <= max_bytes {
            current.push_str(&fragment);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if fragment.len() > max_bytes {
            tracing::warn!(
                bytes = fragment.len(),
                max_bytes,
                "single report item exceeds the batch budget, sending it alone"
            );
            chunks.push(fragment);
        } else {
            current = fragment;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Cut chunks that exceed `max_bytes` down to size, marking the cut with `…`
///
/// Chunks within budget pass through untouched. Cuts land on a character
/// boundary but ignore markup, so this is only a last resort for budgets
/// smaller than a bare item line.
pub fn clamp_oversized(chunks: Vec<String>, max_bytes: usize) -> Vec<String> {
    chunks
        .into_iter()
        .map(|chunk| {
            if chunk.len() <= max_bytes {
                return chunk;
            }
            tracing::warn!(
                bytes = chunk.len(),
                max_bytes,
                "clipping oversized chunk to the batch budget"
            );
            if max_bytes < ELLIPSIS.len() {
                return clip_to_bytes(&chunk, max_bytes).to_string();
            }
            let mut clipped = clip_to_bytes(&chunk, max_bytes - ELLIPSIS.len()).to_string();
            clipped.push_str(ELLIPSIS);
            clipped
        })
        .collect()
}
