//! Error types for radar-notify
//!
//! Errors fall into two groups:
//! - Channel-fatal errors (missing credential, exhausted budget, bad endpoint
//!   configuration) stop a channel before any network call is made.
//! - Batch-level errors (transport failure, platform rejection, oversize,
//!   rate limiting) fail a single batch; the dispatcher's failure policy
//!   decides whether the channel continues.
//!
//! No error escapes [`Dispatcher::dispatch`](crate::Dispatcher::dispatch):
//! everything is folded into a [`DispatchOutcome`](crate::DispatchOutcome).

use crate::channel::ChannelKind;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for radar-notify operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for radar-notify
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No credential configured for the channel; no network call attempted
    #[error("missing credential for {channel}")]
    MissingCredential {
        /// The channel whose credential is absent
        channel: ChannelKind,
    },

    /// Header reserve leaves no room for content
    #[error(
        "batch budget exhausted: header reserve of {header_reserve} bytes leaves nothing of {max_batch_bytes} bytes"
    )]
    BudgetExhausted {
        /// Configured maximum batch size in bytes
        max_batch_bytes: usize,
        /// Bytes reserved for the per-batch header
        header_reserve: usize,
    },

    /// A header pushed a batch over its budget (the reserve step was bypassed)
    #[error("batch {batch} is {size} bytes after header injection, limit is {max} bytes")]
    HeaderOverflow {
        /// Logical batch number (1-indexed)
        batch: usize,
        /// Size of header plus content in bytes
        size: usize,
        /// Configured maximum batch size in bytes
        max: usize,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "bark_url")
        key: Option<String>,
    },

    /// Connection, timeout or other transport-level failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The platform answered but did not accept the message
    #[error("platform rejected message (HTTP {status}): {message}")]
    PlatformRejected {
        /// HTTP status code of the response
        status: u16,
        /// Platform-provided error message, or the raw response body
        message: String,
    },

    /// The platform enforces a stricter size limit than configured
    #[error("platform rejected {size}-byte message as too large (HTTP {status})")]
    OversizeRejected {
        /// HTTP status code of the response (usually 413)
        status: u16,
        /// Size of the rejected batch in bytes
        size: usize,
    },

    /// The platform asked us to slow down
    #[error("rate limited by platform (HTTP {status})")]
    RateLimited {
        /// HTTP status code of the response (usually 429)
        status: u16,
    },
}

/// Transport-level failures reported by a [`Transport`](crate::transport::Transport)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request did not complete within its timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// The proxy URL could not be used
    #[error("invalid proxy {proxy}: {reason}")]
    InvalidProxy {
        /// The rejected proxy URL
        proxy: String,
        /// Why it was rejected
        reason: String,
    },

    /// Any other request failure (TLS, body, redirect, ...)
    #[error("request failed: {0}")]
    Request(String),
}

impl Error {
    /// Build a configuration error tied to a config key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Machine-readable error code, stable across releases
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::MissingCredential { .. } => "missing_credential",
            Error::BudgetExhausted { .. } => "budget_exhausted",
            Error::HeaderOverflow { .. } => "header_overflow",
            Error::Config { .. } => "config_error",
            Error::Transport(TransportError::Timeout(_)) => "transport_timeout",
            Error::Transport(_) => "transport_error",
            Error::PlatformRejected { .. } => "platform_rejected",
            Error::OversizeRejected { .. } => "oversize_rejected",
            Error::RateLimited { .. } => "rate_limited",
        }
    }
}
