//! Per-channel secrets
//!
//! A [`CredentialProvider`] answers "what secret reaches this channel?"
//! without touching the network, so a missing credential is detected before
//! any request is built.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::channel::ChannelKind;
use crate::config::NotifyConfig;

/// Secret material for one channel
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    /// Webhook URL (Feishu, DingTalk, WeCom, Slack)
    Webhook {
        /// Full webhook URL including its token
        url: String,
    },
    /// Telegram bot
    Telegram {
        /// Bot token from BotFather
        bot_token: String,
        /// Target chat
        chat_id: String,
    },
    /// ntfy topic
    Ntfy {
        /// Server URL, scheme optional
        server_url: String,
        /// Topic name
        topic: String,
        /// Access token for protected topics
        #[serde(default)]
        token: Option<String>,
    },
    /// Bark push URL (`https://api.day.app/<device_key>`)
    Bark {
        /// URL containing the device key as its first path segment
        url: String,
    },
}

impl Credential {
    /// Webhook credential
    pub fn webhook(url: impl Into<String>) -> Self {
        Credential::Webhook { url: url.into() }
    }

    /// Short name of the credential shape
    pub fn type_name(&self) -> &'static str {
        match self {
            Credential::Webhook { .. } => "webhook",
            Credential::Telegram { .. } => "telegram",
            Credential::Ntfy { .. } => "ntfy",
            Credential::Bark { .. } => "bark",
        }
    }

    /// Whether every required field is non-blank
    pub fn is_present(&self) -> bool {
        let filled = |s: &str| !s.trim().is_empty();
        match self {
            Credential::Webhook { url } | Credential::Bark { url } => filled(url),
            Credential::Telegram { bot_token, chat_id } => filled(bot_token) && filled(chat_id),
            Credential::Ntfy {
                server_url, topic, ..
            } => filled(server_url) && filled(topic),
        }
    }
}

/// Source of per-channel secrets
///
/// Implementations must answer from local state only; absence is reported
/// as `None` and never requires a network call.
pub trait CredentialProvider: Send + Sync {
    /// Credential for a channel and optional account label
    fn credential(&self, kind: ChannelKind, label: Option<&str>) -> Option<Credential>;
}

/// Credentials held in memory, usually taken from [`NotifyConfig`]
#[derive(Clone, Debug, Default)]
pub struct StaticCredentials {
    entries: HashMap<(ChannelKind, Option<String>), Credential>,
}

impl StaticCredentials {
    /// Empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the credentials embedded in a config
    pub fn from_config(config: &NotifyConfig) -> Self {
        let mut credentials = Self::new();
        for channel in &config.channels {
            if let Some(credential) = &channel.credential {
                credentials.insert(channel.kind, channel.label.clone(), credential.clone());
            }
        }
        credentials
    }

    /// Add or replace a credential
    pub fn insert(&mut self, kind: ChannelKind, label: Option<String>, credential: Credential) {
        self.entries.insert((kind, label), credential);
    }

    /// Builder-style [`insert`](Self::insert) for an unlabelled channel
    pub fn with(mut self, kind: ChannelKind, credential: Credential) -> Self {
        self.insert(kind, None, credential);
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn credential(&self, kind: ChannelKind, label: Option<&str>) -> Option<Credential> {
        self.entries
            .get(&(kind, label.map(str::to_string)))
            .filter(|c| c.is_present())
            .cloned()
    }
}

/// Credentials read from environment variables at lookup time
///
/// | Channel | Variables |
/// |---|---|
/// | feishu | `FEISHU_WEBHOOK_URL` |
/// | dingtalk | `DINGTALK_WEBHOOK_URL` |
/// | wework, wework_text | `WEWORK_WEBHOOK_URL` |
/// | telegram | `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID` |
/// | ntfy | `NTFY_SERVER_URL` (default `https://ntfy.sh`), `NTFY_TOPIC`, optional `NTFY_TOKEN` |
/// | bark | `BARK_URL` |
/// | slack | `SLACK_WEBHOOK_URL` |
///
/// With an account label, `<VAR>_<LABEL>` (label upper-cased) is tried first.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    fn var(name: &str, label: Option<&str>) -> Option<String> {
        let read = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        label
            .filter(|l| !l.is_empty())
            .and_then(|l| read(&format!("{name}_{}", l.to_ascii_uppercase())))
            .or_else(|| read(name))
    }
}

impl CredentialProvider for EnvCredentials {
    fn credential(&self, kind: ChannelKind, label: Option<&str>) -> Option<Credential> {
        let var = |name: &str| Self::var(name, label);
        let credential = match kind {
            ChannelKind::Feishu => Credential::webhook(var("FEISHU_WEBHOOK_URL")?),
            ChannelKind::DingTalk => Credential::webhook(var("DINGTALK_WEBHOOK_URL")?),
            ChannelKind::WeWork | ChannelKind::WeWorkText => {
                Credential::webhook(var("WEWORK_WEBHOOK_URL")?)
            }
            ChannelKind::Telegram => Credential::Telegram {
                bot_token: var("TELEGRAM_BOT_TOKEN")?,
                chat_id: var("TELEGRAM_CHAT_ID")?,
            },
            ChannelKind::Ntfy => Credential::Ntfy {
                server_url: var("NTFY_SERVER_URL").unwrap_or_else(|| "https://ntfy.sh".into()),
                topic: var("NTFY_TOPIC")?,
                token: var("NTFY_TOKEN"),
            },
            ChannelKind::Bark => Credential::Bark {
                url: var("BARK_URL")?,
            },
            ChannelKind::Slack => Credential::webhook(var("SLACK_WEBHOOK_URL")?),
        };
        Some(credential)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "FEISHU_WEBHOOK_URL",
            "FEISHU_WEBHOOK_URL_OPS",
            "TELEGRAM_BOT_TOKEN",
            "TELEGRAM_CHAT_ID",
            "NTFY_SERVER_URL",
            "NTFY_TOPIC",
            "NTFY_TOKEN",
        ] {
            // SAFETY: tests touching the environment are serialized with #[serial]
            unsafe { std::env::remove_var(key) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: tests touching the environment are serialized with #[serial]
        unsafe { std::env::set_var(key, value) };
    }

    #[test]
    fn blank_credentials_count_as_missing() {
        let credentials = StaticCredentials::new()
            .with(ChannelKind::Slack, Credential::webhook("  "))
            .with(
                ChannelKind::Telegram,
                Credential::Telegram {
                    bot_token: "123:abc".into(),
                    chat_id: "".into(),
                },
            );

        assert!(credentials.credential(ChannelKind::Slack, None).is_none());
        assert!(credentials.credential(ChannelKind::Telegram, None).is_none());
        assert!(credentials.credential(ChannelKind::Bark, None).is_none());
    }

    #[test]
    fn static_credentials_are_keyed_by_label() {
        let mut config = NotifyConfig::default();
        let mut ops = ChannelConfig::new(
            ChannelKind::Feishu,
            Credential::webhook("https://open.feishu.cn/hook/ops"),
        );
        ops.label = Some("ops".into());
        config.channels = vec![
            ChannelConfig::new(
                ChannelKind::Feishu,
                Credential::webhook("https://open.feishu.cn/hook/main"),
            ),
            ops,
        ];

        let credentials = StaticCredentials::from_config(&config);

        assert_eq!(
            credentials.credential(ChannelKind::Feishu, Some("ops")),
            Some(Credential::webhook("https://open.feishu.cn/hook/ops"))
        );
        assert_eq!(
            credentials.credential(ChannelKind::Feishu, None),
            Some(Credential::webhook("https://open.feishu.cn/hook/main"))
        );
        assert!(
            credentials
                .credential(ChannelKind::Feishu, Some("other"))
                .is_none()
        );
    }

    #[test]
    #[serial]
    fn env_credentials_prefer_labelled_variables() {
        clear_env();
        set_env("FEISHU_WEBHOOK_URL", "https://open.feishu.cn/hook/main");
        set_env("FEISHU_WEBHOOK_URL_OPS", "https://open.feishu.cn/hook/ops");

        let env = EnvCredentials;
        assert_eq!(
            env.credential(ChannelKind::Feishu, Some("ops")),
            Some(Credential::webhook("https://open.feishu.cn/hook/ops"))
        );
        assert_eq!(
            env.credential(ChannelKind::Feishu, Some("unknown")),
            Some(Credential::webhook("https://open.feishu.cn/hook/main"))
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn env_credentials_require_every_mandatory_variable() {
        clear_env();
        set_env("TELEGRAM_BOT_TOKEN", "123:abc");

        let env = EnvCredentials;
        assert!(env.credential(ChannelKind::Telegram, None).is_none());

        set_env("TELEGRAM_CHAT_ID", "-100200300");
        assert_eq!(
            env.credential(ChannelKind::Telegram, None),
            Some(Credential::Telegram {
                bot_token: "123:abc".into(),
                chat_id: "-100200300".into(),
            })
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn env_ntfy_defaults_to_public_server() {
        clear_env();
        set_env("NTFY_TOPIC", "trends");

        let credential = EnvCredentials.credential(ChannelKind::Ntfy, None).unwrap();
        assert_eq!(
            credential,
            Credential::Ntfy {
                server_url: "https://ntfy.sh".into(),
                topic: "trends".into(),
                token: None,
            }
        );
        clear_env();
    }
}
