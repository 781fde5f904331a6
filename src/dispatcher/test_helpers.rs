//! Shared test helpers for dispatcher tests: a scripted transport and
//! report builders.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::Dispatcher;
use crate::channel::ChannelKind;
use crate::config::{ChannelTarget, NotifyConfig, RetryPolicy};
use crate::credentials::{Credential, StaticCredentials};
use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::types::{ReportData, ReportItem, TopicGroup};

/// Transport double: replays scripted responses in order, then a default
/// response, and records every request it sees.
pub(crate) struct MockTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    fallback: HttpResponse,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    /// Always answers with `fallback`
    pub(crate) fn replying(fallback: HttpResponse) -> Arc<Self> {
        Self::scripted(Vec::new(), fallback)
    }

    /// Answers with `script` first, then `fallback`
    pub(crate) fn scripted(
        script: Vec<Result<HttpResponse, TransportError>>,
        fallback: HttpResponse,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// Response each platform treats as success
pub(crate) fn ok_response(kind: ChannelKind) -> HttpResponse {
    let body = match kind {
        ChannelKind::Feishu => r#"{"StatusCode":0,"StatusMessage":"success","code":0}"#,
        ChannelKind::DingTalk | ChannelKind::WeWork | ChannelKind::WeWorkText => {
            r#"{"errcode":0,"errmsg":"ok"}"#
        }
        ChannelKind::Telegram => r#"{"ok":true,"result":{}}"#,
        ChannelKind::Ntfy => r#"{"id":"abc","event":"message"}"#,
        ChannelKind::Bark => r#"{"code":200,"message":"success"}"#,
        ChannelKind::Slack => "ok",
    };
    HttpResponse::new(200, body)
}

/// A credential of the right shape for `kind`
pub(crate) fn credential_for(kind: ChannelKind) -> Credential {
    match kind {
        ChannelKind::Telegram => Credential::Telegram {
            bot_token: "123456:test-token".into(),
            chat_id: "-100987".into(),
        },
        ChannelKind::Ntfy => Credential::Ntfy {
            server_url: "https://ntfy.example.org".into(),
            topic: "trends".into(),
            token: None,
        },
        ChannelKind::Bark => Credential::Bark {
            url: "https://api.day.app/device-key".into(),
        },
        _ => Credential::webhook(format!("https://hooks.example.com/{kind}")),
    }
}

/// Credentials for every channel
pub(crate) fn all_credentials() -> StaticCredentials {
    ChannelKind::ALL
        .into_iter()
        .fold(StaticCredentials::new(), |creds, kind| {
            creds.with(kind, credential_for(kind))
        })
}

/// Dispatcher with every credential present
pub(crate) fn dispatcher(transport: Arc<MockTransport>) -> Dispatcher {
    Dispatcher::new(
        NotifyConfig::default(),
        transport,
        Arc::new(all_credentials()),
    )
}

/// Default target for `kind` with no pacing and an instant retry backoff
pub(crate) fn fast_target(kind: ChannelKind) -> ChannelTarget {
    let mut target = ChannelTarget::new(kind);
    target.profile.inter_batch_delay = Duration::ZERO;
    target.profile.public_server_delay = None;
    if let RetryPolicy::RateLimitRetry { .. } = target.profile.retry {
        target.profile.retry = RetryPolicy::RateLimitRetry {
            backoff: Duration::from_millis(1),
        };
    }
    target
}

/// Target whose batch size yields exactly `batches` batches for
/// [`report_for_batches`]
pub(crate) fn target_with_batches(kind: ChannelKind, batches: usize) -> (ChannelTarget, ReportData) {
    let mut target = fast_target(kind);
    let report = report_for_batches(batches);
    let reserve = crate::batch::header_reserve_bytes(target.profile.format);
    let fragments = crate::render::render_fragments(&report, target.profile.format);
    // One topic fragment per batch: the intro rides with the first one
    let largest = fragments[0].len() + fragments[1].len();
    target.profile.max_batch_bytes = reserve + largest;
    (target, report)
}

/// A report of `topics` one-item topics with deterministic content
pub(crate) fn report_for_batches(topics: usize) -> ReportData {
    let mut report = ReportData::new(
        "Daily Summary",
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap(),
    );
    report.topics = (0..topics)
        .map(|t| TopicGroup {
            keyword: format!("topic-{t}"),
            items: vec![
                ReportItem::new(format!("Headline number {t} with padding text"), "hackernews")
                    .with_url(format!("https://news.example.com/{t}")),
            ],
        })
        .collect();
    report
}
