//! Telegram Bot API

use serde_json::{Value, json};
use std::time::Duration;

use super::{
    ChannelKind, Endpoint, EndpointSettings, Payload, PayloadContext, Platform, json_message,
    response_excerpt, wrong_credential,
};
use crate::config::{ChannelProfile, OrderingPolicy, RetryPolicy, TextFormat};
use crate::credentials::Credential;
use crate::error::{Error, Result};
use crate::transport::HttpResponse;
use crate::types::Batch;

/// Telegram `sendMessage` with HTML parse mode
#[derive(Clone, Copy, Debug, Default)]
pub struct Telegram;

impl Platform for Telegram {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Telegram
    }

    fn default_profile(&self) -> ChannelProfile {
        ChannelProfile {
            max_batch_bytes: 4000,
            ordering: OrderingPolicy::Forward,
            inter_batch_delay: Duration::from_secs(1),
            public_server_delay: None,
            retry: RetryPolicy::None,
            partial_success_allowed: false,
            format: TextFormat::PlainHtml,
        }
    }

    fn endpoint(&self, credential: &Credential, settings: &EndpointSettings<'_>) -> Result<Endpoint> {
        let Credential::Telegram { bot_token, chat_id } = credential else {
            return Err(wrong_credential(self.kind(), credential));
        };
        let bot_token = bot_token.trim();
        if bot_token.contains('/') || bot_token.chars().any(char::is_whitespace) {
            return Err(Error::config(
                "telegram bot token must not contain '/' or whitespace",
                "telegram_bot_token",
            ));
        }

        let base = settings.telegram_api_base.trim_end_matches('/');
        let mut endpoint = Endpoint::url(format!("{base}/bot{bot_token}/sendMessage"));
        endpoint.recipient = Some(chat_id.trim().to_string());
        Ok(endpoint)
    }

    fn build_payload(&self, batch: &Batch, ctx: &PayloadContext<'_>) -> Payload {
        Payload::json(json!({
            "chat_id": ctx.endpoint.recipient.as_deref().unwrap_or_default(),
            "text": batch.with_header,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        }))
    }

    fn acknowledged(&self, response: &HttpResponse) -> std::result::Result<(), String> {
        let Some(json) = response.json() else {
            return Err(response_excerpt(&response.body));
        };
        if json.get("ok").and_then(Value::as_bool) == Some(true) {
            Ok(())
        } else {
            Err(json_message(&json, &["description"])
                .unwrap_or_else(|| response_excerpt(&response.body)))
        }
    }
}
