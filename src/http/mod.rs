//! HTTP client module
//!
//! Provides the resilient API client used by every endpoint wrapper.
//!
//! # Features
//!
//! - **Authentication**: Bearer token read from the session provider per call
//! - **Automatic Retries**: Network faults, timeouts, 408, 429 and 5xx
//! - **Exponential Backoff**: `base * 2^(n-1)` before retry `n`
//! - **Session Invalidation**: 401 clears the session and redirects to login
//! - **Throttling**: Optional token bucket using governor

mod client;
mod rate_limit;
mod request;
mod retry;

pub use client::ApiClient;
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use request::{ApiRequest, RequestBody};
pub use retry::{parse_retry_after, RetryDecision, RetryPolicy, Sleeper, TokioSleeper};
