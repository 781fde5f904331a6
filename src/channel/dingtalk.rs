//! DingTalk custom robot (markdown messages)

use serde_json::{Value, json};
use std::time::Duration;

use super::{
    ChannelKind, Endpoint, EndpointSettings, Payload, PayloadContext, Platform, json_message,
    response_excerpt, webhook_endpoint,
};
use crate::config::{ChannelProfile, OrderingPolicy, RetryPolicy, TextFormat};
use crate::credentials::Credential;
use crate::error::Result;
use crate::transport::HttpResponse;
use crate::types::Batch;

/// DingTalk markdown webhook
#[derive(Clone, Copy, Debug, Default)]
pub struct DingTalk;

impl Platform for DingTalk {
    fn kind(&self) -> ChannelKind {
        ChannelKind::DingTalk
    }

    fn default_profile(&self) -> ChannelProfile {
        ChannelProfile {
            max_batch_bytes: 20_000,
            ordering: OrderingPolicy::Forward,
            inter_batch_delay: Duration::from_secs(1),
            public_server_delay: None,
            retry: RetryPolicy::None,
            partial_success_allowed: false,
            format: TextFormat::Markdown,
        }
    }

    fn endpoint(&self, credential: &Credential, _: &EndpointSettings<'_>) -> Result<Endpoint> {
        webhook_endpoint(self.kind(), credential)
    }

    fn build_payload(&self, batch: &Batch, ctx: &PayloadContext<'_>) -> Payload {
        Payload::json(json!({
            "msgtype": "markdown",
            "markdown": {
                "title": format!("TrendRadar trend report - {}", ctx.report.report_type),
                "text": batch.with_header,
            }
        }))
    }

    fn acknowledged(&self, response: &HttpResponse) -> std::result::Result<(), String> {
        errcode_zero(response)
    }
}

/// `errcode == 0` acknowledgement shared by DingTalk and WeCom
pub(super) fn errcode_zero(response: &HttpResponse) -> std::result::Result<(), String> {
    let Some(json) = response.json() else {
        return Err(response_excerpt(&response.body));
    };
    if json.get("errcode").and_then(Value::as_i64) == Some(0) {
        Ok(())
    } else {
        Err(json_message(&json, &["errmsg"]).unwrap_or_else(|| response_excerpt(&response.body)))
    }
}
