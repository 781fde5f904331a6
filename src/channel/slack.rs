//! Slack incoming webhooks

use serde_json::json;
use std::time::Duration;

use super::{
    ChannelKind, Endpoint, EndpointSettings, Payload, PayloadContext, Platform, response_excerpt,
    webhook_endpoint,
};
use crate::config::{ChannelProfile, OrderingPolicy, RetryPolicy, TextFormat};
use crate::credentials::Credential;
use crate::error::Result;
use crate::format::markdown_to_mrkdwn;
use crate::transport::HttpResponse;
use crate::types::Batch;

/// Slack incoming webhook
#[derive(Clone, Copy, Debug, Default)]
pub struct Slack;

impl Platform for Slack {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Slack
    }

    fn default_profile(&self) -> ChannelProfile {
        ChannelProfile {
            max_batch_bytes: 4000,
            ordering: OrderingPolicy::Forward,
            inter_batch_delay: Duration::from_secs(1),
            public_server_delay: None,
            retry: RetryPolicy::None,
            partial_success_allowed: false,
            format: TextFormat::Mrkdwn,
        }
    }

    fn endpoint(&self, credential: &Credential, _: &EndpointSettings<'_>) -> Result<Endpoint> {
        webhook_endpoint(self.kind(), credential)
    }

    fn build_payload(&self, batch: &Batch, _: &PayloadContext<'_>) -> Payload {
        Payload::json(json!({"text": markdown_to_mrkdwn(&batch.with_header)}))
    }

    // Incoming webhooks answer with the literal text "ok"
    fn acknowledged(&self, response: &HttpResponse) -> std::result::Result<(), String> {
        if response.body.trim() == "ok" {
            Ok(())
        } else {
            Err(response_excerpt(&response.body))
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SideContentConfig;
    use crate::error::Error;
    use crate::transport::RequestBody;
    use crate::types::ReportData;
    use chrono::Utc;

    #[test]
    fn payload_is_converted_to_mrkdwn() {
        let report = ReportData::new("Daily Summary", Utc::now());
        let endpoint = Endpoint::url("https://hooks.slack.com/services/T/B/X");
        let ctx = PayloadContext {
            report: &report,
            side: None,
            side_config: &SideContentConfig::default(),
            endpoint: &endpoint,
        };
        let batch = Batch {
            sequence_number: 1,
            total_batches: 1,
            raw_content: "[news](https://a.b)".into(),
            with_header: "**[1/1] Daily Summary**\n\n[news](https://a.b)".into(),
        };

        assert_eq!(
            Slack.build_payload(&batch, &ctx).body,
            RequestBody::Json(json!({
                "text": "*[1/1] Daily Summary*\n\n<https://a.b|news>"
            }))
        );
    }

    #[test]
    fn only_literal_ok_is_success() {
        assert!(Slack.interpret_response(&HttpResponse::new(200, "ok"), 1).is_ok());
        assert_eq!(
            Slack
                .interpret_response(&HttpResponse::new(200, "invalid_payload"), 1)
                .unwrap_err(),
            Error::PlatformRejected {
                status: 200,
                message: "invalid_payload".into()
            }
        );
        assert_eq!(
            Slack
                .interpret_response(&HttpResponse::new(404, "no_team"), 1)
                .unwrap_err(),
            Error::PlatformRejected {
                status: 404,
                message: "no_team".into()
            }
        );
    }
}
