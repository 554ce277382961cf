use std::time::Duration;

use reqwest::StatusCode;

use crate::config::{ClientConfig, RetryInterval};

/// Result of a failed attempt, as seen by a [`RetryPolicy`].
#[derive(Debug)]
pub enum AttemptFailure<'a> {
    /// The transport raised before a response arrived.
    Transport(&'a reqwest::Error),
    /// The server answered with a non-success status.
    Status(StatusCode),
}

/// Decides whether and when a failed attempt is retried.
pub trait RetryPolicy: Send + Sync {
    /// Maximum number of retries after the initial attempt.
    fn max_retries(&self) -> usize;

    fn should_retry(&self, failure: &AttemptFailure<'_>) -> bool;

    /// Wait before retry number `attempt` (zero-based).
    fn delay(&self, attempt: usize) -> Duration;
}

/// Retries connection failures and HTTP 404 on a configurable schedule.
#[derive(Clone)]
pub struct NotFoundOrConnectRetry {
    retry_count: usize,
    interval: RetryInterval,
}

impl NotFoundOrConnectRetry {
    pub fn new(retry_count: usize, interval: RetryInterval) -> Self {
        Self {
            retry_count,
            interval,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.retry_count, config.retry_interval.clone())
    }
}

impl std::fmt::Debug for NotFoundOrConnectRetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotFoundOrConnectRetry")
            .field("retry_count", &self.retry_count)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy for NotFoundOrConnectRetry {
    fn max_retries(&self) -> usize {
        self.retry_count
    }

    fn should_retry(&self, failure: &AttemptFailure<'_>) -> bool {
        match failure {
            AttemptFailure::Transport(err) => is_connection_error(err),
            AttemptFailure::Status(status) => *status == StatusCode::NOT_FOUND,
        }
    }

    fn delay(&self, attempt: usize) -> Duration {
        (self.interval)(attempt)
    }
}

/// Never retries.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn max_retries(&self) -> usize {
        0
    }

    fn should_retry(&self, _failure: &AttemptFailure<'_>) -> bool {
        false
    }

    fn delay(&self, _attempt: usize) -> Duration {
        Duration::ZERO
    }
}

pub(crate) fn is_connection_error(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request() || err.is_body()
}
