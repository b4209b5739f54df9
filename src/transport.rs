//! Retrying HTTP transport shared by every external-API client.
//!
//! All outbound requests go through [`Transport::execute`] instead of
//! calling `reqwest` directly, so each GET gets the same bounded retry
//! schedule no matter which provider it targets. The schedule is
//! deterministic: no jitter, a fixed attempt cap, and an exponential wait
//! clamped between a floor and a ceiling.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Per-request timeout fixed at client construction.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Transport failures, classified for callers that care which kind they got.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request exceeded the per-request timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP status {0}")]
    Status(StatusCode),

    /// Connection-level failure, or a body that could not be read as JSON.
    #[error("network error: {0}")]
    Network(String),
}

/// Retry schedule for one logical request.
///
/// The wait before retry attempt `k` is `2^(k-1)` seconds clamped to
/// `[min_delay, max_delay]`, which with the defaults gives 2s, 4s, and
/// would cap at 10s if more attempts were allowed.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Floor for the wait between attempts.
    pub min_delay: Duration,
    /// Ceiling for the wait between attempts.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Wait before the given attempt. The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exponential = Duration::from_secs(1u64 << (attempt - 1).min(32));
        exponential.clamp(self.min_delay, self.max_delay)
    }

    /// Same attempt count, but no waiting between attempts.
    pub fn immediate() -> Self {
        Self {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Shared HTTP GET transport with retry and backoff.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct Transport {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl Transport {
    /// Create a transport with the default retry policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_policy(RetryPolicy::default())
    }

    /// Create a transport with an explicit retry policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_policy(policy: RetryPolicy) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self { client, policy })
    }

    /// Perform a GET with query parameters and parse the body as JSON.
    ///
    /// Any failure (connection error, timeout, non-2xx status, undecodable
    /// body) is retried up to the policy's attempt cap; exhausting the cap
    /// surfaces the last failure.
    ///
    /// # Errors
    ///
    /// Returns the final [`TransportError`] once all attempts are spent.
    pub async fn execute(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Value, TransportError> {
        let mut last_error = None;

        for attempt in 1..=self.policy.max_attempts.max(1) {
            if attempt > 1 {
                let delay = self.policy.delay_before(attempt);
                warn!(url, attempt, ?delay, "retrying request");
                tokio::time::sleep(delay).await;
            }

            debug!(url, attempt, "requesting");

            match self.try_get(url, params).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    warn!(url, attempt, error = %e, "request attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| TransportError::Network("no attempt made".to_string())))
    }

    async fn try_get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Value, TransportError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }

        response.json::<Value>().await.map_err(classify)
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.min_delay, Duration::from_secs(2));
        assert_eq!(policy.max_delay, Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_secs(2));
        assert_eq!(policy.delay_before(3), Duration::from_secs(4));
        assert_eq!(policy.delay_before(4), Duration::from_secs(8));
        assert_eq!(policy.delay_before(5), Duration::from_secs(10));
        assert_eq!(policy.delay_before(6), Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_is_monotonic() {
        let policy = RetryPolicy::default();
        let mut previous = Duration::ZERO;
        for attempt in 1..=10 {
            let delay = policy.delay_before(attempt);
            assert!(delay >= previous);
            assert!(delay <= policy.max_delay);
            previous = delay;
        }
    }

    #[test]
    fn test_small_attempts_hit_the_floor() {
        // The floor applies even where 2^(k-1) would be below it.
        let policy = RetryPolicy {
            min_delay: Duration::from_secs(5),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_before(2), Duration::from_secs(5));
    }

    #[test]
    fn test_immediate_policy_never_waits() {
        let policy = RetryPolicy::immediate();
        assert_eq!(policy.max_attempts, 3);
        for attempt in 1..=5 {
            assert_eq!(policy.delay_before(attempt), Duration::ZERO);
        }
    }
}
