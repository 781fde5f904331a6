//! Core types for radar-notify

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::ChannelKind;
use crate::error::Error;

/// Which kind of report is being sent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Everything matched today
    #[default]
    Daily,
    /// Snapshot of the current rankings
    Current,
    /// Only items that are new since the previous run
    Incremental,
}

impl ReportMode {
    /// Section heading shown in the report body
    pub fn heading(&self) -> &'static str {
        match self {
            ReportMode::Daily => "Daily trend summary",
            ReportMode::Current => "Current ranking",
            ReportMode::Incremental => "New since last run",
        }
    }

    /// ASCII-only title, safe for HTTP header values
    pub fn ascii_title(&self) -> &'static str {
        match self {
            ReportMode::Daily => "Daily Summary",
            ReportMode::Current => "Current Ranking",
            ReportMode::Incremental => "Incremental Update",
        }
    }
}

/// One matched news item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportItem {
    /// Headline text
    pub title: String,
    /// Platform the item was found on
    pub source: String,
    /// Link to the item, if known
    #[serde(default)]
    pub url: Option<String>,
    /// How many times the item appeared across fetches
    #[serde(default = "default_count")]
    pub count: u32,
    /// Whether the item first appeared in this run
    #[serde(default)]
    pub is_new: bool,
}

impl ReportItem {
    /// Create an item without a link
    pub fn new(title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            url: None,
            count: 1,
            is_new: false,
        }
    }

    /// Attach a link
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// All items matched by one keyword, in display order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicGroup {
    /// The keyword or topic
    pub keyword: String,
    /// Matched items
    pub items: Vec<ReportItem>,
}

/// Notice that a newer release of the reporting tool is available
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNotice {
    /// Version currently running
    pub current_version: String,
    /// Latest published version
    pub latest_version: String,
}

/// A fully analysed report, produced upstream and read-only during dispatch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportData {
    /// Display label, e.g. "Daily Summary"
    pub report_type: String,
    /// Report mode
    #[serde(default)]
    pub mode: ReportMode,
    /// When the report was generated
    pub generated_at: DateTime<Utc>,
    /// Keyword groups, in display order
    pub topics: Vec<TopicGroup>,
    /// Sources that could not be fetched this run
    #[serde(default)]
    pub failed_sources: Vec<String>,
    /// Optional new-version notice
    #[serde(default)]
    pub update: Option<UpdateNotice>,
}

impl ReportData {
    /// Create an empty report
    pub fn new(report_type: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            report_type: report_type.into(),
            mode: ReportMode::default(),
            generated_at,
            topics: Vec::new(),
            failed_sources: Vec::new(),
            update: None,
        }
    }

    /// Total number of matched items across all topics
    pub fn total_items(&self) -> usize {
        self.topics.iter().map(|t| t.items.len()).sum()
    }

    /// Number of topics with at least one item
    pub fn active_topics(&self) -> usize {
        self.topics.iter().filter(|t| !t.items.is_empty()).count()
    }

    /// True when no topic matched any item
    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }
}

/// Optional add-on content for one topic (generated audio and summary)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEntry {
    /// Topic the entry belongs to
    pub topic: String,
    /// Link to the generated audio
    #[serde(default)]
    pub audio_url: Option<String>,
    /// Generated summary text
    #[serde(default)]
    pub summary: Option<String>,
    /// Number of items the summary covers
    #[serde(default)]
    pub item_count: u32,
}

impl SideEntry {
    /// Trimmed audio URL, if non-blank
    pub fn audio_url(&self) -> Option<&str> {
        self.audio_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Trimmed summary, if non-blank
    pub fn summary(&self) -> Option<&str> {
        self.summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// An entry with neither audio nor summary has nothing to show
    pub fn is_usable(&self) -> bool {
        !self.topic.trim().is_empty() && (self.audio_url().is_some() || self.summary().is_some())
    }
}

/// Side content keyed by topic, in display order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideData {
    /// Entries in display order
    pub entries: Vec<SideEntry>,
}

impl SideData {
    /// Create side data from entries
    pub fn new(entries: Vec<SideEntry>) -> Self {
        Self { entries }
    }

    /// Entries worth displaying, capped at `limit` (0 = no cap)
    pub fn usable(&self, limit: usize) -> Vec<&SideEntry> {
        let usable = self.entries.iter().filter(|e| e.is_usable());
        if limit == 0 {
            usable.collect()
        } else {
            usable.take(limit).collect()
        }
    }
}

/// One platform-sized unit of a report
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    /// Logical position (1-indexed)
    pub sequence_number: usize,
    /// Total number of batches for this dispatch
    pub total_batches: usize,
    /// Content without the header
    pub raw_content: String,
    /// Header followed by content; this is what gets sent
    pub with_header: String,
}

impl Batch {
    /// Encoded size of the sendable text in bytes
    pub fn byte_len(&self) -> usize {
        self.with_header.len()
    }

    /// Whether this is the first logical batch
    pub fn is_first(&self) -> bool {
        self.sequence_number == 1
    }
}

/// Terminal state of one channel dispatch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// Every batch was accepted (or there was nothing to send)
    Succeeded,
    /// Best-effort channel where some, but not all, batches were accepted
    PartialSuccess,
    /// The channel failed
    Failed,
}

/// Aggregate result of dispatching one report to one channel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// The channel dispatched to
    pub channel: ChannelKind,
    /// Account label, when several accounts share a channel
    pub label: Option<String>,
    /// Number of batches the report was split into
    pub batches_total: usize,
    /// Number of batches the platform accepted
    pub batches_succeeded: usize,
    /// Single verdict for the channel
    pub overall_success: bool,
    /// Terminal state
    pub status: DispatchStatus,
    /// The most recent error, if any
    pub last_error: Option<Error>,
}

impl DispatchOutcome {
    /// Outcome for a channel that failed before sending anything
    pub fn failed_early(channel: ChannelKind, label: Option<String>, error: Error) -> Self {
        Self {
            channel,
            label,
            batches_total: 0,
            batches_succeeded: 0,
            overall_success: false,
            status: DispatchStatus::Failed,
            last_error: Some(error),
        }
    }
}

fn default_count() -> u32 {
    1
}
