//! Notification platforms
//!
//! Every supported destination is one variant of [`ChannelKind`] backed by a
//! stateless [`Platform`] implementation that knows the destination's
//! default profile, how to derive its endpoint from a credential, how to
//! build the wire payload for a batch, and how to read the platform's
//! acknowledgement.
//!
//! - [`feishu`] - Feishu/Lark interactive cards (plus the podcast card)
//! - [`dingtalk`] - DingTalk markdown robot
//! - [`wework`] - WeCom group robot, markdown and text modes
//! - [`telegram`] - Telegram Bot API `sendMessage`
//! - [`ntfy`] - ntfy topics (public or self-hosted)
//! - [`bark`] - Bark iOS push
//! - [`slack`] - Slack incoming webhooks

pub mod bark;
pub mod dingtalk;
pub mod feishu;
pub mod ntfy;
pub mod slack;
pub mod telegram;
pub mod wework;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{ChannelProfile, SideContentConfig};
use crate::credentials::Credential;
use crate::error::{Error, Result};
use crate::transport::{HttpResponse, RequestBody};
use crate::types::{Batch, ReportData, SideData};

/// Supported notification channels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Feishu/Lark custom bot (interactive card)
    Feishu,
    /// DingTalk custom robot (markdown)
    #[serde(rename = "dingtalk")]
    DingTalk,
    /// WeCom group robot, markdown message type
    #[serde(rename = "wework")]
    WeWork,
    /// WeCom group robot, text message type (readable in personal WeChat)
    #[serde(rename = "wework_text")]
    WeWorkText,
    /// Telegram bot
    Telegram,
    /// ntfy topic
    Ntfy,
    /// Bark push
    Bark,
    /// Slack incoming webhook
    Slack,
}

impl ChannelKind {
    /// Every supported channel
    pub const ALL: [ChannelKind; 8] = [
        ChannelKind::Feishu,
        ChannelKind::DingTalk,
        ChannelKind::WeWork,
        ChannelKind::WeWorkText,
        ChannelKind::Telegram,
        ChannelKind::Ntfy,
        ChannelKind::Bark,
        ChannelKind::Slack,
    ];

    /// Stable lowercase name, used in logs and config
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Feishu => "feishu",
            ChannelKind::DingTalk => "dingtalk",
            ChannelKind::WeWork => "wework",
            ChannelKind::WeWorkText => "wework_text",
            ChannelKind::Telegram => "telegram",
            ChannelKind::Ntfy => "ntfy",
            ChannelKind::Bark => "bark",
            ChannelKind::Slack => "slack",
        }
    }

    /// The strategy implementing this channel
    pub fn platform(&self) -> &'static dyn Platform {
        match self {
            ChannelKind::Feishu => &feishu::Feishu,
            ChannelKind::DingTalk => &dingtalk::DingTalk,
            ChannelKind::WeWork => &wework::MARKDOWN,
            ChannelKind::WeWorkText => &wework::TEXT,
            ChannelKind::Telegram => &telegram::Telegram,
            ChannelKind::Ntfy => &ntfy::Ntfy,
            ChannelKind::Bark => &bark::Bark,
            ChannelKind::Slack => &slack::Slack,
        }
    }

    /// Default profile for this channel
    pub fn default_profile(&self) -> ChannelProfile {
        self.platform().default_profile()
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how to reach a platform, derived from a credential
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// URL every batch is POSTed to
    pub url: String,
    /// Headers sent with every batch (authentication, content hints)
    pub headers: Vec<(String, String)>,
    /// Recipient identifier carried in the body (Telegram chat id, Bark device key)
    pub recipient: Option<String>,
    /// Whether the endpoint is a shared public server that wants gentler pacing
    pub public_server: bool,
}

impl Endpoint {
    /// Endpoint with no extra headers or recipient
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            recipient: None,
            public_server: false,
        }
    }
}

/// Settings that influence endpoint derivation
#[derive(Clone, Copy, Debug)]
pub struct EndpointSettings<'a> {
    /// Base URL of the Telegram Bot API
    pub telegram_api_base: &'a str,
}

/// Read-only inputs available to a payload builder
#[derive(Clone, Copy, Debug)]
pub struct PayloadContext<'a> {
    /// The report being sent
    pub report: &'a ReportData,
    /// Optional side content (generated audio and summaries)
    pub side: Option<&'a SideData>,
    /// Limits for side content
    pub side_config: &'a SideContentConfig,
    /// Resolved endpoint
    pub endpoint: &'a Endpoint,
}

/// Wire payload for one batch
#[derive(Clone, Debug, PartialEq)]
pub struct Payload {
    /// Headers specific to this batch
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: RequestBody,
}

impl Payload {
    /// JSON payload with no extra headers
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            headers: Vec::new(),
            body: RequestBody::Json(value),
        }
    }
}

/// Capability interface shared by all channels
///
/// Implementations are stateless and never perform I/O; the dispatcher owns
/// the transport, pacing and failure policy.
pub trait Platform: Send + Sync {
    /// Which channel this is
    fn kind(&self) -> ChannelKind;

    /// Budget, ordering, pacing and retry defaults
    fn default_profile(&self) -> ChannelProfile;

    /// Derive the endpoint from a credential
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the credential has the wrong shape for
    /// this channel or cannot be turned into a usable URL.
    fn endpoint(&self, credential: &Credential, settings: &EndpointSettings<'_>)
    -> Result<Endpoint>;

    /// Convert a batch into the platform's wire payload
    fn build_payload(&self, batch: &Batch, ctx: &PayloadContext<'_>) -> Payload;

    /// Check a 2xx response for the platform's own success marker
    ///
    /// Returns the platform's error message on mismatch.
    fn acknowledged(&self, response: &HttpResponse) -> std::result::Result<(), String>;

    /// Size the platform enforces regardless of configuration, if known
    fn hard_limit_bytes(&self) -> Option<usize> {
        None
    }

    /// Pause between consecutive successful batches
    fn inter_batch_delay(&self, profile: &ChannelProfile, endpoint: &Endpoint) -> Duration {
        match profile.public_server_delay {
            Some(delay) if endpoint.public_server => delay,
            _ => profile.inter_batch_delay,
        }
    }

    /// Classify a response as batch success or one of the batch errors
    ///
    /// HTTP 429 is a rate-limit signal, 413 means the platform enforces a
    /// stricter size limit than configured, any other non-2xx status or a
    /// 2xx without the platform's success marker is a rejection.
    fn interpret_response(&self, response: &HttpResponse, sent_bytes: usize) -> Result<()> {
        match response.status {
            429 => Err(Error::RateLimited {
                status: response.status,
            }),
            413 => Err(Error::OversizeRejected {
                status: response.status,
                size: sent_bytes,
            }),
            status if !(200..300).contains(&status) => Err(Error::PlatformRejected {
                status,
                message: response_excerpt(&response.body),
            }),
            status => self
                .acknowledged(response)
                .map_err(|message| Error::PlatformRejected { status, message }),
        }
    }
}

/// Error for a credential whose shape does not match the channel
pub(crate) fn wrong_credential(kind: ChannelKind, credential: &Credential) -> Error {
    Error::config(
        format!(
            "{} credential cannot be used for {kind}",
            credential.type_name()
        ),
        kind.as_str(),
    )
}

/// Endpoint for channels addressed by a plain webhook URL
pub(crate) fn webhook_endpoint(kind: ChannelKind, credential: &Credential) -> Result<Endpoint> {
    let Credential::Webhook { url } = credential else {
        return Err(wrong_credential(kind, credential));
    };
    let url = url.trim();
    let parsed = url::Url::parse(url)
        .map_err(|e| Error::config(format!("invalid {kind} webhook url: {e}"), kind.as_str()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::config(
            format!("{kind} webhook url must use http or https"),
            kind.as_str(),
        ));
    }
    Ok(Endpoint::url(url))
}

/// First part of a response body, for error messages
pub(crate) fn response_excerpt(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    let body = body.trim();
    if body.is_empty() {
        return "empty response body".to_string();
    }
    crate::format::truncate_chars(body, MAX_CHARS)
}

/// Read a JSON field from a response as a string, whatever its JSON type
pub(crate) fn json_message(json: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match json.get(*key) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(serde_json::Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}
