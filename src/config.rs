use std::{fmt, sync::Arc, time::Duration};

/// Maps a zero-based retry index to the wait before that retry.
pub type RetryInterval = Arc<dyn Fn(usize) -> Duration + Send + Sync>;

/// Construction-time client settings.
#[derive(Clone)]
pub struct ClientConfig {
    /// Prefix for every request URL.
    pub base_url: String,
    /// Headers applied to every request unless overridden per call.
    pub default_headers: Vec<(String, String)>,
    /// Number of retries after the initial attempt.
    pub retry_count: usize,
    /// Wait before each retry, computed fresh per attempt.
    pub retry_interval: RetryInterval,
    /// Optional per-attempt transport timeout.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .default_headers
            .iter()
            .map(|(name, value)| {
                let shown = if name.eq_ignore_ascii_case("authorization") {
                    "<redacted>"
                } else {
                    value.as_str()
                };
                (name.as_str(), shown)
            })
            .collect();
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("default_headers", &headers)
            .field("retry_count", &self.retry_count)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            default_headers: Vec::new(),
            retry_count: 3,
            retry_interval: Arc::new(exponential_seconds),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Config for `base_url` with 3 retries, the [`exponential_seconds`] schedule and no
    /// timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Creates a config from environment variables.
    ///
    /// Reads:
    /// - `EFETCH_BASE_URL` — required base URL
    /// - `EFETCH_RETRY_COUNT` — optional retry count (default 3)
    /// - `EFETCH_TIMEOUT_MS` — optional per-attempt timeout in milliseconds
    pub fn from_env() -> std::result::Result<Self, String> {
        let base_url = std::env::var("EFETCH_BASE_URL")
            .map_err(|_| "missing EFETCH_BASE_URL environment variable".to_owned())?;
        if base_url.trim().is_empty() {
            return Err("EFETCH_BASE_URL is set but empty".to_owned());
        }
        let mut config = Self::new(base_url.trim());

        if let Ok(raw) = std::env::var("EFETCH_RETRY_COUNT") {
            config.retry_count = raw
                .trim()
                .parse()
                .map_err(|err| format!("invalid EFETCH_RETRY_COUNT '{raw}': {err}"))?;
        }
        if let Ok(raw) = std::env::var("EFETCH_TIMEOUT_MS") {
            let millis: u64 = raw
                .trim()
                .parse()
                .map_err(|err| format!("invalid EFETCH_TIMEOUT_MS '{raw}': {err}"))?;
            config.timeout = Some(Duration::from_millis(millis));
        }
        Ok(config)
    }

    /// Adds a header sent with every request. Blank names or values are skipped when the
    /// client is built.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Number of retries after the first attempt; `0` disables retrying.
    pub fn with_retry_count(mut self, retry_count: usize) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_retry_interval<F>(mut self, interval: F) -> Self
    where
        F: Fn(usize) -> Duration + Send + Sync + 'static,
    {
        self.retry_interval = Arc::new(interval);
        self
    }

    /// Per-attempt timeout. Expiry counts as a connection error and is retried.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Default schedule: `2^attempt` seconds.
///
/// Saturates at [`Duration::MAX`] once `2^attempt` no longer fits in `u64` seconds.
pub fn exponential_seconds(attempt: usize) -> Duration {
    u32::try_from(attempt)
        .ok()
        .and_then(|exp| 1u64.checked_shl(exp))
        .map(Duration::from_secs)
        .unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::exponential_seconds;
    use crate::ClientConfig;

    #[test]
    fn defaults_match_documented_values() {
        let config = ClientConfig::default();
        assert_eq!(config.retry_count, 3);
        assert!(config.default_headers.is_empty());
        assert_eq!((config.retry_interval)(0), Duration::from_secs(1));
        assert_eq!((config.retry_interval)(2), Duration::from_secs(4));
    }

    #[test]
    fn new_keeps_base_url_and_documented_defaults() {
        let config = ClientConfig::new("http://h/api");
        assert_eq!(config.base_url, "http://h/api");
        assert_eq!(config.retry_count, 3);
        assert!(config.timeout.is_none());
        assert_eq!((config.retry_interval)(1), Duration::from_secs(2));
    }

    #[test]
    fn exponential_schedule_doubles_without_a_ceiling() {
        assert_eq!(exponential_seconds(3), Duration::from_secs(8));
        assert_eq!(exponential_seconds(17), Duration::from_secs(131_072));
        assert_eq!(exponential_seconds(40), Duration::from_secs(1 << 40));
        assert_eq!(exponential_seconds(63), Duration::from_secs(1 << 63));
        assert_eq!(exponential_seconds(64), Duration::MAX);
        assert_eq!(exponential_seconds(usize::MAX), Duration::MAX);
    }

    #[test]
    fn builder_overrides_retry_settings() {
        let config = ClientConfig::new("http://h")
            .with_retry_count(1)
            .with_retry_interval(|_| Duration::ZERO)
            .with_timeout(Duration::from_millis(50));
        assert_eq!(config.retry_count, 1);
        assert_eq!((config.retry_interval)(5), Duration::ZERO);
        assert_eq!(config.timeout, Some(Duration::from_millis(50)));
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let config =
            ClientConfig::new("http://h").with_header("Authorization", "Bearer secret-token");
        let debug = format!("{config:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }
}
