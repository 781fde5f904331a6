//! Batch headers
//!
//! Every batch starts with a short banner: its position `i/n`, the report
//! label and the generation time in the configured clock offset. Room for the banner is reserved before
//! splitting, using the worst-case header for the channel's format, so
//! attaching it can never push a batch over the channel limit.

use chrono::{DateTime, FixedOffset, Utc};

use crate::config::{ChannelProfile, TextFormat};
use crate::error::{Error, Result};
use crate::format::clip_to_bytes;
use crate::splitter;
use crate::types::{Batch, ReportData};

/// Longest report label shown in a header, in bytes
pub const MAX_LABEL_BYTES: usize = 64;

/// Largest batch count the header reserve accounts for
const MAX_BATCH_NUMBER: usize = 9999;

const TIMESTAMP_FORMAT: &str = "%m-%d %H:%M";

/// Report metadata shown in every header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderMeta {
    label: String,
    timestamp: String,
}

impl HeaderMeta {
    /// Metadata with a sanitized, clipped label and the time shown at `offset`
    pub fn new(label: &str, generated_at: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            label: sanitize_label(label),
            timestamp: generated_at
                .with_timezone(&offset)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
        }
    }

    /// Metadata for a report
    pub fn from_report(report: &ReportData, offset: FixedOffset) -> Self {
        Self::new(&report.report_type, report.generated_at, offset)
    }
}

/// Drop characters that would act as markup in any format, then clip
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .filter(|c| !matches!(c, '*' | '_' | '~' | '`' | '[' | ']' | '<' | '>' | '&' | '"'))
        .collect();
    clip_to_bytes(cleaned.trim(), MAX_LABEL_BYTES).trim_end().to_string()
}

/// Render the header for batch `index` of `total`
pub fn render_header(format: TextFormat, index: usize, total: usize, meta: &HeaderMeta) -> String {
    let HeaderMeta { label, timestamp } = meta;
    match format {
        TextFormat::Markdown | TextFormat::Mrkdwn => {
            format!("**[{index}/{total}] {label}** · {timestamp}\n\n")
        }
        TextFormat::JsonCard => {
            format!("<font color='grey'>[{index}/{total}] {timestamp}</font>\n**{label}**\n\n")
        }
        TextFormat::PlainHtml => format!("<b>[{index}/{total}] {label}</b> · {timestamp}\n\n"),
        TextFormat::PlainText => format!("[{index}/{total}] {label} · {timestamp}\n\n"),
    }
}

/// Bytes to reserve for the header in `format`
///
/// This is the size of the largest header the format can produce, so any
/// header for up to 9999 batches fits.
pub fn header_reserve_bytes(format: TextFormat) -> usize {
    let worst = HeaderMeta {
        label: "x".repeat(MAX_LABEL_BYTES),
        timestamp: "00-00 00:00".to_string(),
    };
    render_header(format, MAX_BATCH_NUMBER, MAX_BATCH_NUMBER, &worst).len()
}

/// Content budget left after reserving header space
///
/// # Errors
///
/// Returns [`Error::BudgetExhausted`] when the reserve leaves no room.
pub fn content_budget(max_batch_bytes: usize, format: TextFormat) -> Result<usize> {
    let header_reserve = header_reserve_bytes(format);
    if header_reserve >= max_batch_bytes {
        return Err(Error::BudgetExhausted {
            max_batch_bytes,
            header_reserve,
        });
    }
    Ok(max_batch_bytes - header_reserve)
}

/// Prefix every chunk with its header
///
/// # Errors
///
/// Returns [`Error::HeaderOverflow`] if a batch ends up larger than
/// `max_batch_bytes`, which means the chunks were not split against
/// [`content_budget`].
pub fn attach_headers(
    chunks: Vec<String>,
    format: TextFormat,
    meta: &HeaderMeta,
    max_batch_bytes: usize,
) -> Result<Vec<Batch>> {
    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, raw_content)| {
            let sequence_number = i + 1;
            let mut with_header = render_header(format, sequence_number, total, meta);
            with_header.push_str(&raw_content);

            if with_header.len() > max_batch_bytes {
                return Err(Error::HeaderOverflow {
                    batch: sequence_number,
                    size: with_header.len(),
                    max: max_batch_bytes,
                });
            }

            Ok(Batch {
                sequence_number,
                total_batches: total,
                raw_content,
                with_header,
            })
        })
        .collect()
}

/// Split a report and attach headers according to a channel profile
///
/// Header timestamps are shown at `offset`. Oversized items are shortened
/// while rendering, and anything still over budget is clipped, so every
/// batch fits `profile.max_batch_bytes`.
///
/// # Errors
///
/// Returns [`Error::BudgetExhausted`] when the profile's batch size cannot
/// hold a header.
pub fn prepare_batches(
    report: &ReportData,
    profile: &ChannelProfile,
    offset: FixedOffset,
) -> Result<Vec<Batch>> {
    let budget = content_budget(profile.max_batch_bytes, profile.format)?;
    let chunks = splitter::split(report, profile.format, budget)?;
    let chunks = splitter::clamp_oversized(chunks, budget);
    attach_headers(
        chunks,
        profile.format,
        &HeaderMeta::from_report(report, offset),
        profile.max_batch_bytes,
    )
}
