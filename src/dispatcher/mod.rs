//! Channel dispatcher
//!
//! One [`Dispatcher::dispatch`] call drives a report through
//! split → header → payload → transport for a single channel and reduces the
//! per-batch results to one [`DispatchOutcome`].
//!
//! Per call the dispatcher moves through
//! `Idle → Splitting → Sending(i) → {Succeeded | PartialSuccess | Failed}`:
//!
//! - a missing credential or unusable endpoint fails before any request;
//! - batches go out strictly one at a time, in the profile's order, with the
//!   inter-batch delay after every successful batch that is not the last;
//! - strict channels stop at the first failed batch, best-effort channels
//!   send every batch and succeed if any batch got through.
//!
//! Channels share nothing but read-only configuration, so
//! [`Dispatcher::dispatch_all`] runs one future per channel concurrently.

use futures::future::join_all;
use std::sync::Arc;

use crate::batch::prepare_batches;
use crate::channel::{ChannelKind, Endpoint, EndpointSettings, PayloadContext, Platform, feishu};
use crate::config::{ChannelTarget, NotifyConfig, OrderingPolicy};
use crate::credentials::{CredentialProvider, StaticCredentials};
use crate::error::{Error, Result};
use crate::retry::send_with_retry;
use crate::transport::{HttpRequest, ReqwestTransport, RequestBody, Transport};
use crate::types::{Batch, DispatchOutcome, DispatchStatus, ReportData, SideData};

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

/// Progress of one channel dispatch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DispatchState {
    Idle,
    Splitting,
    Sending { batch: usize, send_index: usize },
    Finished(DispatchStatus),
}

impl std::fmt::Display for DispatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchState::Idle => f.write_str("idle"),
            DispatchState::Splitting => f.write_str("splitting"),
            DispatchState::Sending { batch, send_index } => {
                write!(f, "sending(batch {batch}, send {send_index})")
            }
            DispatchState::Finished(DispatchStatus::Succeeded) => f.write_str("succeeded"),
            DispatchState::Finished(DispatchStatus::PartialSuccess) => {
                f.write_str("partial_success")
            }
            DispatchState::Finished(DispatchStatus::Failed) => f.write_str("failed"),
        }
    }
}

/// Tracks the state of one dispatch and logs every transition
struct Progress<'a> {
    channel: &'a str,
    state: DispatchState,
}

impl<'a> Progress<'a> {
    fn new(channel: &'a str) -> Self {
        Self {
            channel,
            state: DispatchState::Idle,
        }
    }

    fn enter(&mut self, next: DispatchState) {
        tracing::trace!(channel = self.channel, from = %self.state, to = %next, "dispatch state");
        self.state = next;
    }
}

/// Sends reports to notification channels
///
/// Holds read-only configuration plus the transport and credential source;
/// cheap to share behind an `Arc` and safe to call concurrently.
#[derive(Clone)]
pub struct Dispatcher {
    config: NotifyConfig,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher from its collaborators
    pub fn new(
        config: NotifyConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            config,
            transport,
            credentials,
        }
    }

    /// Dispatcher using `reqwest` and the credentials embedded in `config`
    pub fn from_config(config: NotifyConfig) -> Self {
        let credentials = StaticCredentials::from_config(&config);
        Self::new(
            config,
            Arc::new(ReqwestTransport::new()),
            Arc::new(credentials),
        )
    }

    /// The configuration this dispatcher was built with
    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    /// Send a report to one channel
    ///
    /// Never fails: every error ends up in the returned outcome.
    pub async fn dispatch(
        &self,
        target: &ChannelTarget,
        report: &ReportData,
        side: Option<&SideData>,
    ) -> DispatchOutcome {
        let channel = target.display_name();
        let mut progress = Progress::new(&channel);
        let platform = target.kind.platform();
        let profile = &target.profile;

        let endpoint = match self.resolve_endpoint(target, platform) {
            Ok(endpoint) => endpoint,
            Err(e) => return self.fail_early(target, &mut progress, e),
        };

        progress.enter(DispatchState::Splitting);
        let batches = match prepare_batches(report, profile, self.config.display_offset()) {
            Ok(batches) => batches,
            Err(e) => return self.fail_early(target, &mut progress, e),
        };

        let total = batches.len();
        if total == 0 {
            tracing::info!(channel = %channel, "report has no items, nothing to send");
            progress.enter(DispatchState::Finished(DispatchStatus::Succeeded));
            return DispatchOutcome {
                channel: target.kind,
                label: target.label.clone(),
                batches_total: 0,
                batches_succeeded: 0,
                overall_success: true,
                status: DispatchStatus::Succeeded,
                last_error: None,
            };
        }

        tracing::info!(
            channel = %channel,
            total,
            report_type = %report.report_type,
            reversed = profile.ordering == OrderingPolicy::ReverseForDisplay,
            "sending report"
        );

        let ctx = PayloadContext {
            report,
            side,
            side_config: &self.config.side_content,
            endpoint: &endpoint,
        };
        let delay = platform.inter_batch_delay(profile, &endpoint);

        let mut succeeded = 0;
        let mut last_error = None;

        for (send_index, batch) in send_order(&batches, profile.ordering).into_iter().enumerate() {
            let send_index = send_index + 1;
            progress.enter(DispatchState::Sending {
                batch: batch.sequence_number,
                send_index,
            });

            tracing::debug!(
                channel = %channel,
                batch = batch.sequence_number,
                send_index,
                total,
                bytes = batch.byte_len(),
                "sending batch"
            );
            if let Some(limit) = platform.hard_limit_bytes() {
                if batch.byte_len() > limit {
                    tracing::warn!(
                        channel = %channel,
                        batch = batch.sequence_number,
                        bytes = batch.byte_len(),
                        limit,
                        "batch exceeds the platform's hard limit and may be rejected"
                    );
                }
            }

            match self.send_batch(target, platform, &endpoint, batch, &ctx).await {
                Ok(()) => {
                    succeeded += 1;
                    tracing::debug!(
                        channel = %channel,
                        batch = batch.sequence_number,
                        send_index,
                        total,
                        "batch accepted"
                    );
                    if send_index < total && !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => {
                    log_batch_failure(&channel, batch, send_index, &e);
                    last_error = Some(e);
                    if !profile.partial_success_allowed {
                        tracing::warn!(
                            channel = %channel,
                            skipped = total - send_index,
                            "stopping after failed batch"
                        );
                        break;
                    }
                }
            }
        }

        let status = if succeeded == total {
            DispatchStatus::Succeeded
        } else if profile.partial_success_allowed && succeeded > 0 {
            DispatchStatus::PartialSuccess
        } else {
            DispatchStatus::Failed
        };
        progress.enter(DispatchState::Finished(status));

        match status {
            DispatchStatus::Succeeded => {
                tracing::info!(channel = %channel, total, "all batches sent")
            }
            DispatchStatus::PartialSuccess => {
                tracing::warn!(channel = %channel, succeeded, total, "report partially sent")
            }
            DispatchStatus::Failed => {
                tracing::error!(channel = %channel, succeeded, total, "report not sent")
            }
        }

        DispatchOutcome {
            channel: target.kind,
            label: target.label.clone(),
            batches_total: total,
            batches_succeeded: succeeded,
            overall_success: status != DispatchStatus::Failed,
            status,
            last_error,
        }
    }

    /// Send a report to every target concurrently, one outcome per target in
    /// the same order
    pub async fn dispatch_all(
        &self,
        targets: &[ChannelTarget],
        report: &ReportData,
        side: Option<&SideData>,
    ) -> Vec<DispatchOutcome> {
        join_all(
            targets
                .iter()
                .map(|target| self.dispatch(target, report, side)),
        )
        .await
    }

    /// Send a report to every channel in the configuration
    pub async fn dispatch_configured(
        &self,
        report: &ReportData,
        side: Option<&SideData>,
    ) -> Vec<DispatchOutcome> {
        self.dispatch_all(&self.config.targets(), report, side)
            .await
    }

    /// Send the standalone podcast card to a Feishu channel
    ///
    /// Other channels and side data without audio links fail without any
    /// request being made.
    pub async fn dispatch_podcast_card(
        &self,
        target: &ChannelTarget,
        side: &SideData,
    ) -> DispatchOutcome {
        let channel = target.display_name();
        let mut progress = Progress::new(&channel);

        if target.kind != ChannelKind::Feishu {
            let e = Error::config(
                format!("podcast cards are only supported on feishu, not {}", target.kind),
                "kind",
            );
            return self.fail_early(target, &mut progress, e);
        }

        progress.enter(DispatchState::Splitting);
        let Some(card) = feishu::build_podcast_card(side, &self.config.side_content) else {
            let e = Error::config("no side entry has an audio url", "side_content");
            return self.fail_early(target, &mut progress, e);
        };

        let platform = target.kind.platform();
        let endpoint = match self.resolve_endpoint(target, platform) {
            Ok(endpoint) => endpoint,
            Err(e) => return self.fail_early(target, &mut progress, e),
        };

        progress.enter(DispatchState::Sending {
            batch: 1,
            send_index: 1,
        });
        let request = HttpRequest {
            url: endpoint.url.clone(),
            headers: endpoint.headers.clone(),
            body: RequestBody::Json(card),
            proxy: self.config.proxy_url.clone(),
            timeout: self.config.request_timeout,
        };
        let sent_bytes = request.body.byte_len();
        let result = self
            .send_request(target, platform, &request, sent_bytes)
            .await;

        let (succeeded, status, last_error) = match result {
            Ok(()) => {
                tracing::info!(channel = %channel, "podcast card sent");
                (1, DispatchStatus::Succeeded, None)
            }
            Err(e) => {
                tracing::error!(channel = %channel, error = %e, "podcast card not sent");
                (0, DispatchStatus::Failed, Some(e))
            }
        };
        progress.enter(DispatchState::Finished(status));

        DispatchOutcome {
            channel: target.kind,
            label: target.label.clone(),
            batches_total: 1,
            batches_succeeded: succeeded,
            overall_success: succeeded == 1,
            status,
            last_error,
        }
    }

    fn endpoint_settings(&self) -> EndpointSettings<'_> {
        EndpointSettings {
            telegram_api_base: &self.config.telegram_api_base,
        }
    }

    /// Look up the credential and derive the endpoint, without any I/O
    fn resolve_endpoint(&self, target: &ChannelTarget, platform: &dyn Platform) -> Result<Endpoint> {
        let credential = self
            .credentials
            .credential(target.kind, target.label.as_deref())
            .ok_or(Error::MissingCredential {
                channel: target.kind,
            })?;
        platform.endpoint(&credential, &self.endpoint_settings())
    }

    fn fail_early(
        &self,
        target: &ChannelTarget,
        progress: &mut Progress<'_>,
        error: Error,
    ) -> DispatchOutcome {
        match &error {
            Error::MissingCredential { .. } => {
                tracing::warn!(channel = progress.channel, "no credential configured, skipping")
            }
            e => tracing::error!(channel = progress.channel, error = %e, code = e.error_code(), "channel cannot be dispatched"),
        }
        progress.enter(DispatchState::Finished(DispatchStatus::Failed));
        DispatchOutcome::failed_early(target.kind, target.label.clone(), error)
    }

    async fn send_batch(
        &self,
        target: &ChannelTarget,
        platform: &dyn Platform,
        endpoint: &Endpoint,
        batch: &Batch,
        ctx: &PayloadContext<'_>,
    ) -> Result<()> {
        let payload = platform.build_payload(batch, ctx);
        let mut headers = endpoint.headers.clone();
        headers.extend(payload.headers);

        let request = HttpRequest {
            url: endpoint.url.clone(),
            headers,
            body: payload.body,
            proxy: self.config.proxy_url.clone(),
            timeout: self.config.request_timeout,
        };
        self.send_request(target, platform, &request, batch.byte_len())
            .await
    }

    /// Send one request under the target's retry policy
    async fn send_request(
        &self,
        target: &ChannelTarget,
        platform: &dyn Platform,
        request: &HttpRequest,
        sent_bytes: usize,
    ) -> Result<()> {
        let transport = self.transport.as_ref();
        send_with_retry(&target.profile.retry, move || async move {
            let response = transport.send(request).await?;
            platform.interpret_response(&response, sent_bytes)
        })
        .await
    }
}

/// Batches in the order they go on the wire
fn send_order(batches: &[Batch], ordering: OrderingPolicy) -> Vec<&Batch> {
    match ordering {
        OrderingPolicy::Forward => batches.iter().collect(),
        OrderingPolicy::ReverseForDisplay => batches.iter().rev().collect(),
    }
}

fn log_batch_failure(channel: &str, batch: &Batch, send_index: usize, error: &Error) {
    match error {
        Error::OversizeRejected { status, size } => tracing::error!(
            channel,
            batch = batch.sequence_number,
            send_index,
            status,
            bytes = size,
            "platform enforces a smaller size limit than configured, lower max_batch_bytes"
        ),
        Error::RateLimited { status } => tracing::warn!(
            channel,
            batch = batch.sequence_number,
            send_index,
            status,
            "batch rate limited"
        ),
        e => tracing::warn!(
            channel,
            batch = batch.sequence_number,
            send_index,
            error = %e,
            code = e.error_code(),
            "batch failed"
        ),
    }
}
