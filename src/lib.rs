//! # radar-notify
//!
//! Batch-splitting, multi-channel notification dispatch for trend reports.
//!
//! ## Design Philosophy
//!
//! radar-notify is designed to be:
//! - **Size-safe** - Every batch fits the channel's byte budget, header included
//! - **Channel-aware** - Each platform keeps its own payload shape, ordering and pacing
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Outcome-driven** - Dispatch never fails; every channel reports one [`DispatchOutcome`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use radar_notify::{ChannelConfig, ChannelKind, Credential, Dispatcher, NotifyConfig, ReportData};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = NotifyConfig {
//!         channels: vec![ChannelConfig::new(
//!             ChannelKind::Feishu,
//!             Credential::webhook("https://open.feishu.cn/open-apis/bot/v2/hook/xxx"),
//!         )],
//!         utc_offset_minutes: 480,
//!         ..Default::default()
//!     };
//!
//!     let dispatcher = Dispatcher::from_config(config);
//!     let report = ReportData::new("Daily Summary", chrono::Utc::now());
//!
//!     for outcome in dispatcher.dispatch_configured(&report, None).await {
//!         println!(
//!             "{}: {}/{} batches sent",
//!             outcome.channel, outcome.batches_succeeded, outcome.batches_total
//!         );
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Header injection and batch assembly
pub mod batch;
/// Channel kinds and per-platform payload strategies
pub mod channel;
/// Configuration types
pub mod config;
/// Per-channel credential lookup
pub mod credentials;
/// Per-channel dispatch state machine
pub mod dispatcher;
/// Error types
pub mod error;
/// Byte-size helpers and markup conversion
pub mod format;
/// Report rendering into per-format fragments
pub mod render;
/// Retry logic with exponential backoff
pub mod retry;
/// Size-bounded splitting of rendered reports
pub mod splitter;
/// HTTP transport abstraction
pub mod transport;
/// Core report and outcome types
pub mod types;

// Re-export commonly used types
pub use channel::{ChannelKind, Platform};
pub use config::{
    ChannelConfig, ChannelProfile, ChannelTarget, NotifyConfig, OrderingPolicy, ProfileOverrides,
    RetryPolicy, SideContentConfig, TextFormat,
};
pub use credentials::{Credential, CredentialProvider, EnvCredentials, StaticCredentials};
pub use dispatcher::Dispatcher;
pub use error::{Error, Result, TransportError};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, RequestBody, Transport};
pub use types::{
    Batch, DispatchOutcome, DispatchStatus, ReportData, ReportItem, ReportMode, SideData,
    SideEntry, TopicGroup, UpdateNotice,
};
