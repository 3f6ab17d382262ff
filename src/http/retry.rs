//! Retry policy and backoff
//!
//! A failed attempt is retried when it never got a status (network fault,
//! local timeout) or got 408, 429 or any 5xx. The wait before retry `n` is
//! `base_delay * 2^(n-1)`, saturating on overflow. An explicit `max_delay`
//! caps it; without one the formula is followed as is.

use crate::config::ClientConfig;
use crate::error::{ApiError, ErrorKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::time::Duration;

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait, then try again
    Retry(Duration),
    /// Surface the error
    Fail,
}

/// Retry bounds and backoff settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap for any single delay, if configured
    pub max_delay: Option<Duration>,
    /// Prefer the server's `Retry-After` on 429
    pub respect_retry_after: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

impl RetryPolicy {
    /// Policy described by a client config
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay,
            max_delay: config.max_delay,
            respect_retry_after: config.respect_retry_after,
        }
    }

    /// Check if an HTTP status is worth retrying
    pub fn is_retryable_status(status: u16) -> bool {
        matches!(status, 408 | 429 | 500..=599)
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1);
        let delay = 2u32
            .checked_pow(exp)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX);

        self.capped(delay)
    }

    fn capped(&self, delay: Duration) -> Duration {
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }

    /// Decide what follows failed attempt number `attempt` (1-based)
    pub fn decide(
        &self,
        attempt: u32,
        error: &ApiError,
        retry_after: Option<Duration>,
    ) -> RetryDecision {
        if !error.is_retryable() || attempt >= self.max_attempts {
            return RetryDecision::Fail;
        }

        let delay = match retry_after {
            Some(wait) if self.respect_retry_after && error.kind == ErrorKind::RateLimited => {
                self.capped(wait)
            }
            _ => self.delay_for_retry(attempt),
        };

        RetryDecision::Retry(delay)
    }
}

/// Read a `Retry-After` header given as seconds or as an HTTP date
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?;
    let wait = at.with_timezone(&Utc) - Utc::now();
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}

/// Non-blocking wait between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend the current call for `delay`
    async fn sleep(&self, delay: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
