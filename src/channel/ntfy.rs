//! ntfy topics
//!
//! The body is the batch text itself; metadata travels in HTTP headers,
//! which must stay ASCII. ntfy shows the newest message on top, so batches
//! go out last-first. Batches are independent notifications, which makes the
//! channel best-effort.

use std::time::Duration;

use super::{ChannelKind, Endpoint, EndpointSettings, Payload, PayloadContext, Platform, wrong_credential};
use crate::config::{ChannelProfile, OrderingPolicy, RetryPolicy, TextFormat};
use crate::credentials::Credential;
use crate::error::{Error, Result};
use crate::transport::{HttpResponse, RequestBody};
use crate::types::Batch;

/// Messages above this size are rejected or truncated by ntfy
const HARD_LIMIT_BYTES: usize = 4096;

const PUBLIC_HOST: &str = "ntfy.sh";

/// ntfy publisher
#[derive(Clone, Copy, Debug, Default)]
pub struct Ntfy;

/// Normalize a server URL: default to https, drop trailing slashes
fn normalize_server(server_url: &str) -> String {
    let trimmed = server_url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

impl Platform for Ntfy {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Ntfy
    }

    fn default_profile(&self) -> ChannelProfile {
        ChannelProfile {
            max_batch_bytes: 3800,
            ordering: OrderingPolicy::ReverseForDisplay,
            inter_batch_delay: Duration::from_secs(1),
            public_server_delay: Some(Duration::from_secs(2)),
            retry: RetryPolicy::RateLimitRetry {
                backoff: Duration::from_secs(10),
            },
            partial_success_allowed: true,
            format: TextFormat::Markdown,
        }
    }

    fn endpoint(&self, credential: &Credential, _: &EndpointSettings<'_>) -> Result<Endpoint> {
        let Credential::Ntfy {
            server_url,
            topic,
            token,
        } = credential
        else {
            return Err(wrong_credential(self.kind(), credential));
        };

        let server = normalize_server(server_url);
        let parsed = url::Url::parse(&server).map_err(|e| {
            Error::config(format!("invalid ntfy server url {server}: {e}"), "ntfy_server_url")
        })?;
        let host = parsed.host_str().unwrap_or_default();

        let mut endpoint = Endpoint::url(format!(
            "{server}/{}",
            urlencoding::encode(topic.trim())
        ));
        endpoint.public_server = host == PUBLIC_HOST || host.ends_with(".ntfy.sh");
        endpoint.headers = vec![
            ("Content-Type".into(), "text/plain; charset=utf-8".into()),
            ("Markdown".into(), "yes".into()),
            ("Priority".into(), "default".into()),
            ("Tags".into(), "news".into()),
        ];
        if let Some(token) = token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            endpoint
                .headers
                .push(("Authorization".into(), format!("Bearer {token}")));
        }
        Ok(endpoint)
    }

    fn build_payload(&self, batch: &Batch, ctx: &PayloadContext<'_>) -> Payload {
        let mut title = ctx.report.mode.ascii_title().to_string();
        if batch.total_batches > 1 {
            title.push_str(&format!(
                " ({}/{})",
                batch.sequence_number, batch.total_batches
            ));
        }
        Payload {
            headers: vec![("Title".into(), title)],
            body: RequestBody::Text(batch.with_header.clone()),
        }
    }

    fn acknowledged(&self, _: &HttpResponse) -> std::result::Result<(), String> {
        Ok(())
    }

    fn hard_limit_bytes(&self) -> Option<usize> {
        Some(HARD_LIMIT_BYTES)
    }
}
