//! Feishu/Lark custom bot
//!
//! Batches travel as interactive cards. The first batch optionally carries a
//! side section with listen buttons (three per row) and generated summaries.
//! [`build_podcast_card`] builds the standalone card used by
//! [`Dispatcher::dispatch_podcast_card`](crate::Dispatcher::dispatch_podcast_card).

use serde_json::{Value, json};
use std::time::Duration;

use super::{
    ChannelKind, Endpoint, EndpointSettings, Payload, PayloadContext, Platform, json_message,
    response_excerpt, webhook_endpoint,
};
use crate::config::{ChannelProfile, OrderingPolicy, RetryPolicy, SideContentConfig, TextFormat};
use crate::credentials::Credential;
use crate::error::Result;
use crate::format::truncate_chars;
use crate::transport::HttpResponse;
use crate::types::{Batch, SideData, SideEntry};

const BUTTONS_PER_ROW: usize = 3;
const PODCAST_PREVIEW_CHARS: usize = 150;

/// Feishu interactive-card webhook
#[derive(Clone, Copy, Debug, Default)]
pub struct Feishu;

impl Platform for Feishu {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Feishu
    }

    fn default_profile(&self) -> ChannelProfile {
        ChannelProfile {
            max_batch_bytes: 29_000,
            ordering: OrderingPolicy::Forward,
            inter_batch_delay: Duration::from_secs(1),
            public_server_delay: None,
            retry: RetryPolicy::None,
            partial_success_allowed: false,
            format: TextFormat::JsonCard,
        }
    }

    fn endpoint(&self, credential: &Credential, _: &EndpointSettings<'_>) -> Result<Endpoint> {
        webhook_endpoint(self.kind(), credential)
    }

    fn build_payload(&self, batch: &Batch, ctx: &PayloadContext<'_>) -> Payload {
        let mut elements = vec![json!({"tag": "markdown", "content": batch.with_header})];

        // Only the first batch carries side content
        if batch.is_first() {
            if let Some(side) = ctx.side {
                elements.extend(side_section(side, ctx.side_config));
            }
        }

        Payload::json(card(
            &format!("📊 TrendRadar - {}", ctx.report.report_type),
            "blue",
            elements,
        ))
    }

    fn acknowledged(&self, response: &HttpResponse) -> std::result::Result<(), String> {
        let Some(json) = response.json() else {
            return Err(response_excerpt(&response.body));
        };
        let code_is_zero = |key: &str| json.get(key).and_then(Value::as_i64) == Some(0);
        if code_is_zero("StatusCode") || code_is_zero("code") {
            Ok(())
        } else {
            Err(json_message(&json, &["msg", "StatusMessage"])
                .unwrap_or_else(|| response_excerpt(&response.body)))
        }
    }
}

fn card(title: &str, template: &str, elements: Vec<Value>) -> Value {
    json!({
        "msg_type": "interactive",
        "card": {
            "config": {"wide_screen_mode": true, "enable_forward": true},
            "header": {
                "title": {"tag": "plain_text", "content": title},
                "template": template,
            },
            "elements": elements,
        }
    })
}

fn note(text: &str) -> Value {
    json!({"tag": "note", "elements": [{"tag": "plain_text", "content": text}]})
}

fn listen_button(audio_url: &str, label: String) -> Value {
    json!({
        "tag": "button",
        "text": {"tag": "plain_text", "content": label},
        "type": "primary",
        "multi_url": {
            "url": audio_url,
            "pc_url": audio_url,
            "android_url": audio_url,
            "ios_url": audio_url,
        }
    })
}

/// Card elements for the side section of the first batch
///
/// Provided side data always produces a visible section: when no entry has
/// an audio link, a placeholder note stands in for the buttons.
fn side_section(side: &SideData, config: &SideContentConfig) -> Vec<Value> {
    if !config.include_buttons && !config.include_summaries {
        return Vec::new();
    }

    let entries = side.usable(config.max_entries);
    let mut elements = vec![json!({"tag": "hr"})];

    if config.include_buttons {
        elements.push(json!({"tag": "markdown", "content": "🎙️ **Trend podcasts** (tap to listen)"}));

        let buttons: Vec<Value> = entries
            .iter()
            .filter_map(|entry| {
                let url = entry.audio_url()?;
                Some(listen_button(url, format!("Listen: {}", entry.topic)))
            })
            .collect();

        for row in buttons.chunks(BUTTONS_PER_ROW) {
            elements.push(json!({"tag": "action", "actions": row}));
        }

        if buttons.is_empty() {
            elements.push(note(
                "⚠️ No podcast audio was generated this run (check the podcast settings, keys and upload storage)",
            ));
        }
        elements.push(note("💡 Audio links are usually valid for 24 hours"));
    }

    if config.include_summaries && !entries.is_empty() {
        elements.push(json!({"tag": "hr"}));
        elements.push(json!({"tag": "markdown", "content": "📝 **Generated summaries**"}));

        for entry in &entries {
            let mut body = format!("**📌 {}**", entry.topic);
            if entry.item_count > 0 {
                body.push_str(&format!(" ({} items)", entry.item_count));
            }
            body.push_str("\n\n");
            body.push_str(&truncate_chars(
                entry.summary().unwrap_or_default(),
                config.max_summary_chars,
            ));
            if let Some(url) = entry.audio_url() {
                body.push_str(&format!("\n\n[🎧 Podcast audio]({url})"));
            }
            elements.push(json!({"tag": "markdown", "content": body}));
        }
    }

    elements
}

/// Standalone podcast card: one section and listen button per entry with audio
///
/// Returns `None` when no entry has an audio link, so there is nothing to send.
pub fn build_podcast_card(side: &SideData, config: &SideContentConfig) -> Option<Value> {
    let entries: Vec<&SideEntry> = side
        .usable(config.max_entries)
        .into_iter()
        .filter(|e| e.audio_url().is_some())
        .collect();
    if entries.is_empty() {
        return None;
    }

    let mut elements = vec![
        json!({"tag": "markdown", "content": "🎙️ **Trend news podcast** - tap a button to listen to the generated summary\n"}),
        json!({"tag": "hr"}),
    ];

    for (i, entry) in entries.iter().enumerate() {
        let Some(audio_url) = entry.audio_url() else {
            continue;
        };
        let mut content = format!("**📌 {}**", entry.topic);
        if entry.item_count > 0 {
            content.push_str(&format!(" ({} related reports)", entry.item_count));
        }
        content.push_str("\n\n");
        if let Some(summary) = entry.summary() {
            let preview = truncate_chars(summary, PODCAST_PREVIEW_CHARS);
            content.push_str(&format!("<font color='grey'>{preview}</font>"));
        }

        elements.push(json!({"tag": "markdown", "content": content}));
        elements.push(json!({
            "tag": "action",
            "actions": [listen_button(audio_url, format!("🎧 Listen: {}", entry.topic))],
        }));
        if i + 1 < entries.len() {
            elements.push(json!({"tag": "hr"}));
        }
    }

    elements.push(note(
        "🤖 Generated by TrendRadar | audio links are valid for 24 hours",
    ));
    Some(card("🎙️ TrendRadar podcast", "purple", elements))
}
