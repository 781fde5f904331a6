//! Rate-limit retry
//!
//! A channel's [`RetryPolicy`] decides whether a failed request gets a second
//! chance. [`RetryPolicy::RateLimitRetry`] waits its fixed backoff and tries
//! exactly once more, and only for errors that report themselves retryable.
//!
//! # Example
//!
//! ```no_run
//! use radar_notify::retry::{IsRetryable, send_with_retry};
//! use radar_notify::config::RetryPolicy;
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Busy,
//!     Fatal,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{:?}", self)
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Busy)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let policy = RetryPolicy::RateLimitRetry {
//!     backoff: Duration::from_secs(10),
//! };
//! send_with_retry(&policy, || async {
//!     // Your request here
//!     Ok::<_, MyError>(())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryPolicy;
use crate::error::Error;
use std::future::Future;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the operation should be retried after this error
    fn is_retryable(&self) -> bool;
}

/// Only a rate-limit signal earns a retry.
///
/// Timeouts and connection errors fail the batch outright; re-running the
/// whole dispatch is the caller's decision.
impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }
}

/// Run `operation`, repeating it once after the policy's backoff if it fails
/// with a retryable error
///
/// With [`RetryPolicy::None`] the operation runs exactly once. The result of
/// the last call is returned as-is.
pub async fn send_with_retry<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let first = operation().await;
    let RetryPolicy::RateLimitRetry { backoff } = *policy else {
        return first;
    };

    match first {
        Err(e) if e.is_retryable() => {
            tracing::warn!(
                error = %e,
                backoff_ms = backoff.as_millis(),
                "request rate limited, retrying once after backoff"
            );
            tokio::time::sleep(backoff).await;

            let second = operation().await;
            match &second {
                Ok(_) => tracing::info!("request succeeded after retry"),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(error = %e, "request still rate limited after retry")
                }
                Err(_) => {}
            }
            second
        }
        other => other,
    }
}
