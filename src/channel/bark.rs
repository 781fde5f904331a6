//! Bark iOS push
//!
//! The configured URL looks like `https://api.day.app/<device_key>`; pushes
//! go to the server's `/push` endpoint with the key in the JSON body.

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

/// APNs payload limit
const HARD_LIMIT_BYTES: usize = 4096;

/// Bark push server
#[derive(Clone, Copy, Debug, Default)]
pub struct Bark;

impl Platform for Bark {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Bark
    }

    fn default_profile(&self) -> ChannelProfile {
        ChannelProfile {
            max_batch_bytes: 3600,
            ordering: OrderingPolicy::ReverseForDisplay,
            inter_batch_delay: Duration::from_secs(1),
            public_server_delay: None,
            retry: RetryPolicy::None,
            partial_success_allowed: true,
            format: TextFormat::Markdown,
        }
    }

    fn endpoint(&self, credential: &Credential, _: &EndpointSettings<'_>) -> Result<Endpoint> {
        let Credential::Bark { url } = credential else {
            return Err(wrong_credential(self.kind(), credential));
        };
        let parsed = url::Url::parse(url.trim())
            .map_err(|e| Error::config(format!("invalid bark url: {e}"), "bark_url"))?;

        let device_key = parsed
            .path_segments()
            .and_then(|mut segments| segments.find(|s| !s.is_empty()))
            .map(str::to_string)
            .ok_or_else(|| Error::config("bark url has no device key", "bark_url"))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::config("bark url has no host", "bark_url"))?;

        let authority = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let mut endpoint = Endpoint::url(format!("{}://{authority}/push", parsed.scheme()));
        endpoint.recipient = Some(device_key);
        Ok(endpoint)
    }

    fn build_payload(&self, batch: &Batch, ctx: &PayloadContext<'_>) -> Payload {
        Payload::json(json!({
            "title": ctx.report.report_type,
            "markdown": batch.with_header,
            "device_key": ctx.endpoint.recipient.as_deref().unwrap_or_default(),
            "sound": "default",
            "group": "TrendRadar",
            // open the app directly instead of showing an alert
            "action": "none",
        }))
    }

    fn acknowledged(&self, response: &HttpResponse) -> std::result::Result<(), String> {
        let Some(json) = response.json() else {
            return Err(response_excerpt(&response.body));
        };
        if json.get("code").and_then(Value::as_i64) == Some(200) {
            Ok(())
        } else {
            Err(json_message(&json, &["message"]).unwrap_or_else(|| response_excerpt(&response.body)))
        }
    }

    fn hard_limit_bytes(&self) -> Option<usize> {
        Some(HARD_LIMIT_BYTES)
    }
}
