//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failed attempt may be retried
//! - Compute the delay before the next attempt
//! - Stop after `max_retries` additional attempts
//!
//! # Design Decisions
//! - 401, 403 and 404 are terminal; 401 must reach session cleanup at once
//! - Decode failures and `code != 0` envelopes are answers, not transport
//!   failures, and are never retried

use std::time::Duration;

use crate::config::ApiConfig;
use crate::http::error::{ApiError, ErrorKind};
use crate::resilience::backoff::calculate_backoff;

/// Whether a failed attempt may be re-issued.
pub fn is_retryable(err: &ApiError) -> bool {
    if matches!(err.status, Some(401 | 403 | 404)) {
        return false;
    }
    !matches!(err.kind, ErrorKind::Decode | ErrorKind::Rejected)
}

/// Retry budget for one logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }

    /// Same backoff with a different retry count.
    pub fn with_max_retries(self, max_retries: Option<u32>) -> Self {
        Self {
            max_retries: max_retries.unwrap_or(self.max_retries),
            ..self
        }
    }

    /// Delay before retry number `attempt` (1-based), or `None` to give up.
    pub fn next_delay(&self, err: &ApiError, attempt: u32) -> Option<Duration> {
        if !is_retryable(err) {
            tracing::debug!(
                kind = %err.kind,
                status = ?err.status,
                attempt,
                "Not retrying terminal error"
            );
            return None;
        }
        if attempt > self.max_retries {
            tracing::warn!(
                max_retries = self.max_retries,
                kind = %err.kind,
                url = %err.url,
                "Max retry attempts reached"
            );
            return None;
        }
        Some(calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ApiConfig::default())
    }
}
