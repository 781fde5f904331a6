//! Configuration helpers: mock-server channel configs and live credentials from .env

use radar_notify::{
    ChannelConfig, ChannelKind, ChannelTarget, Credential, CredentialProvider, EnvCredentials,
    NotifyConfig, ProfileOverrides,
};
use std::time::Duration;

/// Bot token used for Telegram against the mock server
pub const TEST_BOT_TOKEN: &str = "123456:test-token";

/// Chat id used for Telegram against the mock server
pub const TEST_CHAT_ID: &str = "-100987";

/// Credential for `kind` that points at the mock server at `base`
pub fn mock_credential(kind: ChannelKind, base: &str) -> Credential {
    match kind {
        ChannelKind::Telegram => Credential::Telegram {
            bot_token: TEST_BOT_TOKEN.into(),
            chat_id: TEST_CHAT_ID.into(),
        },
        ChannelKind::Ntfy => Credential::Ntfy {
            server_url: base.into(),
            topic: "trends".into(),
            token: Some("tk_secret".into()),
        },
        ChannelKind::Bark => Credential::Bark {
            url: format!("{base}/device-key"),
        },
        _ => Credential::webhook(format!("{base}/{kind}")),
    }
}

/// Channel config against the mock server, with pacing disabled
pub fn mock_channel(kind: ChannelKind, base: &str) -> ChannelConfig {
    ChannelConfig {
        overrides: ProfileOverrides {
            inter_batch_delay: Some(Duration::ZERO),
            ..Default::default()
        },
        ..ChannelConfig::new(kind, mock_credential(kind, base))
    }
}

/// Config routing every listed channel (and the Telegram API) to `base`
pub fn mock_config(base: &str, kinds: &[ChannelKind]) -> NotifyConfig {
    NotifyConfig {
        telegram_api_base: base.to_string(),
        request_timeout: Duration::from_secs(5),
        channels: kinds.iter().map(|&kind| mock_channel(kind, base)).collect(),
        ..Default::default()
    }
}

/// Target from a config entry with a short retry backoff
pub fn fast_target(channel: &ChannelConfig) -> ChannelTarget {
    let mut target = channel.target();
    target.profile.public_server_delay = None;
    if let radar_notify::RetryPolicy::RateLimitRetry { .. } = target.profile.retry {
        target.profile.retry = radar_notify::RetryPolicy::RateLimitRetry {
            backoff: Duration::from_millis(10),
        };
    }
    target
}

/// Channels with credentials in the environment (after loading .env)
pub fn live_channels() -> Vec<ChannelKind> {
    dotenvy::dotenv().ok();
    ChannelKind::ALL
        .into_iter()
        .filter(|&kind| EnvCredentials.credential(kind, None).is_some())
        .collect()
}

/// Check if any live channel credentials are available
pub fn has_live_credentials() -> bool {
    !live_channels().is_empty()
}

/// Skip test if no live credentials are available
#[macro_export]
macro_rules! skip_if_no_credentials {
    () => {
        if !$crate::common::has_live_credentials() {
            eprintln!("Skipping test: no channel credentials found in .env");
            return;
        }
    };
}
