//! WeCom (WeChat Work) group robot
//!
//! The robot accepts two message types. Markdown renders in the WeCom app;
//! text is the only type personal WeChat shows, so that mode strips all
//! markup.

use serde_json::json;
use std::time::Duration;

use super::dingtalk::errcode_zero;
use super::{
    ChannelKind, Endpoint, EndpointSettings, Payload, PayloadContext, Platform, webhook_endpoint,
};
use crate::config::{ChannelProfile, OrderingPolicy, RetryPolicy, TextFormat};
use crate::credentials::Credential;
use crate::error::Result;
use crate::format::strip_markdown;
use crate::transport::HttpResponse;
use crate::types::Batch;

/// WeCom robot in markdown mode
pub static MARKDOWN: WeWork = WeWork { text_mode: false };

/// WeCom robot in text mode
pub static TEXT: WeWork = WeWork { text_mode: true };

/// WeCom group robot webhook
#[derive(Clone, Copy, Debug)]
pub struct WeWork {
    text_mode: bool,
}

impl Platform for WeWork {
    fn kind(&self) -> ChannelKind {
        if self.text_mode {
            ChannelKind::WeWorkText
        } else {
            ChannelKind::WeWork
        }
    }

    fn default_profile(&self) -> ChannelProfile {
        ChannelProfile {
            max_batch_bytes: 4000,
            ordering: OrderingPolicy::Forward,
            inter_batch_delay: Duration::from_secs(1),
            public_server_delay: None,
            retry: RetryPolicy::None,
            partial_success_allowed: false,
            format: if self.text_mode {
                TextFormat::PlainText
            } else {
                TextFormat::Markdown
            },
        }
    }

    fn endpoint(&self, credential: &Credential, _: &EndpointSettings<'_>) -> Result<Endpoint> {
        webhook_endpoint(self.kind(), credential)
    }

    fn build_payload(&self, batch: &Batch, _: &PayloadContext<'_>) -> Payload {
        if self.text_mode {
            Payload::json(json!({
                "msgtype": "text",
                "text": {"content": strip_markdown(&batch.with_header)},
            }))
        } else {
            Payload::json(json!({
                "msgtype": "markdown",
                "markdown": {"content": batch.with_header},
            }))
        }
    }

    fn acknowledged(&self, response: &HttpResponse) -> std::result::Result<(), String> {
        errcode_zero(response)
    }
}
