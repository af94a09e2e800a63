//! Bounded retry for transient fetch failures

use crate::config::CrawlerConfig;
use std::time::Duration;

/// Retry policy for retryable fetch outcomes
///
/// With `max_retries == 0` a transient failure is logged and the URL is
/// skipped straight away.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Backoff before the first retry
    pub initial_backoff: Duration,
    /// Growth factor applied for every further retry
    pub backoff_multiplier: f64,
    /// Upper bound for a single backoff
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds the policy from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::try_from_secs_f64(config.retry_backoff_seconds)
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Whether another retry is allowed after `retries_done` retries
    pub fn should_retry(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }

    /// Backoff before retry number `retry` (1-based)
    pub fn calculate_backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let backoff_secs =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped = backoff_secs.min(self.max_backoff.as_secs_f64());

        Duration::try_from_secs_f64(capped).unwrap_or(self.max_backoff)
    }
}
