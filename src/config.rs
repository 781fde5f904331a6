//! Configuration types for radar-notify
//!
//! Channel behaviour is described by immutable [`ChannelProfile`] records.
//! Each channel has a built-in default profile; [`ProfileOverrides`] adjust it
//! and [`NotifyConfig::targets`] resolves the final targets once at startup.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::channel::ChannelKind;
use crate::credentials::Credential;

/// Text dialect a channel renders its batches in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    /// Common markdown (DingTalk, WeCom, ntfy, Bark)
    Markdown,
    /// Common markdown converted to Slack mrkdwn at payload time
    Mrkdwn,
    /// Telegram's HTML subset
    PlainHtml,
    /// Lark markdown embedded in an interactive JSON card
    JsonCard,
    /// No markup at all (WeCom text messages)
    PlainText,
}

/// Order in which batches are sent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// Batch 1 first
    #[default]
    Forward,
    /// Last batch first, for platforms that show the newest message on top
    ReverseForDisplay,
}

/// What to do when a platform signals rate limiting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RetryPolicy {
    /// A rate-limited batch fails immediately
    #[default]
    None,
    /// Wait `backoff`, then retry the batch exactly once
    RateLimitRetry {
        /// Fixed wait before the single retry
        #[serde(with = "duration_serde")]
        backoff: Duration,
    },
}

/// Static per-channel behaviour
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelProfile {
    /// Largest batch the channel accepts, header included, in bytes
    pub max_batch_bytes: usize,

    /// Send order
    #[serde(default)]
    pub ordering: OrderingPolicy,

    /// Pause after each successful batch when more remain (default: 1 second)
    #[serde(default = "default_inter_batch_delay", with = "duration_serde")]
    pub inter_batch_delay: Duration,

    /// Longer pause used instead when the endpoint is a shared public server
    #[serde(default, with = "optional_duration_serde")]
    pub public_server_delay: Option<Duration>,

    /// Rate-limit handling
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Best-effort channel: keep going after a failed batch, succeed if any batch did
    #[serde(default)]
    pub partial_success_allowed: bool,

    /// Text dialect batches are rendered in
    pub format: TextFormat,
}

/// Per-channel adjustments on top of the default profile
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileOverrides {
    /// Replace the batch size limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_batch_bytes: Option<usize>,

    /// Replace the inter-batch delay
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_duration_serde"
    )]
    pub inter_batch_delay: Option<Duration>,
}

impl ProfileOverrides {
    /// Apply the overrides to a profile
    pub fn apply(&self, mut profile: ChannelProfile) -> ChannelProfile {
        if let Some(max) = self.max_batch_bytes {
            profile.max_batch_bytes = max;
        }
        if let Some(delay) = self.inter_batch_delay {
            profile.inter_batch_delay = delay;
        }
        profile
    }
}

/// Limits for side content (generated audio links and summaries)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideContentConfig {
    /// Show listen buttons (default: true)
    #[serde(default = "default_true")]
    pub include_buttons: bool,

    /// Show generated summaries; long, so off by default
    #[serde(default)]
    pub include_summaries: bool,

    /// Character cap per summary (default: 600)
    #[serde(default = "default_max_summary_chars")]
    pub max_summary_chars: usize,

    /// Maximum number of topics shown (default: 10, 0 = no cap)
    #[serde(default = "default_max_side_entries")]
    pub max_entries: usize,
}

impl Default for SideContentConfig {
    fn default() -> Self {
        Self {
            include_buttons: true,
            include_summaries: false,
            max_summary_chars: default_max_summary_chars(),
            max_entries: default_max_side_entries(),
        }
    }
}

/// One configured destination
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Which platform
    pub kind: ChannelKind,

    /// Account label, when several accounts of one platform are configured
    #[serde(default)]
    pub label: Option<String>,

    /// Secret needed to reach the platform
    #[serde(default)]
    pub credential: Option<Credential>,

    /// Adjustments to the default profile
    #[serde(default)]
    pub overrides: ProfileOverrides,
}

impl ChannelConfig {
    /// Channel with a credential and default profile
    pub fn new(kind: ChannelKind, credential: Credential) -> Self {
        Self {
            kind,
            label: None,
            credential: Some(credential),
            overrides: ProfileOverrides::default(),
        }
    }

    /// Resolved profile: channel defaults plus overrides
    pub fn profile(&self) -> ChannelProfile {
        self.overrides.apply(self.kind.default_profile())
    }

    /// The dispatch target for this channel
    pub fn target(&self) -> ChannelTarget {
        ChannelTarget {
            kind: self.kind,
            label: self.label.clone(),
            profile: self.profile(),
        }
    }
}

/// A resolved destination: channel, account label and final profile
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelTarget {
    /// Which platform
    pub kind: ChannelKind,
    /// Account label
    pub label: Option<String>,
    /// Final profile
    pub profile: ChannelProfile,
}

impl ChannelTarget {
    /// Target with the channel's default profile
    pub fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            label: None,
            profile: kind.default_profile(),
        }
    }

    /// Log-friendly name, e.g. `feishu[ops]`
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) if !label.is_empty() => format!("{}[{}]", self.kind, label),
            _ => self.kind.to_string(),
        }
    }
}

/// Main configuration for the dispatcher
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Proxy for every request (None = direct)
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Hard timeout per HTTP request (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Base URL of the Telegram Bot API (default: "https://api.telegram.org")
    #[serde(default = "default_telegram_api_base")]
    pub telegram_api_base: String,

    /// Side content limits
    #[serde(default)]
    pub side_content: SideContentConfig,

    /// Clock offset from UTC, in minutes, for batch header timestamps
    /// (default: 0, China Standard Time is 480)
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Configured destinations
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            proxy_url: None,
            request_timeout: default_request_timeout(),
            telegram_api_base: default_telegram_api_base(),
            side_content: SideContentConfig::default(),
            utc_offset_minutes: 0,
            channels: Vec::new(),
        }
    }
}

impl NotifyConfig {
    /// Resolve every configured channel into a dispatch target
    pub fn targets(&self) -> Vec<ChannelTarget> {
        self.channels.iter().map(ChannelConfig::target).collect()
    }

    /// Offset header timestamps are shown in; UTC when out of range
    pub fn display_offset(&self) -> FixedOffset {
        let offset = self
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt);
        match offset {
            Some(offset) => offset,
            None => {
                tracing::warn!(
                    utc_offset_minutes = self.utc_offset_minutes,
                    "utc offset out of range, showing UTC"
                );
                Utc.fix()
            }
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_inter_batch_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_max_summary_chars() -> usize {
    600
}

fn default_max_side_entries() -> usize {
    10
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<f64>::deserialize(deserializer)?;
        secs.map(Duration::try_from_secs_f64)
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}
