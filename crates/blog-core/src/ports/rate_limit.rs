//! Rate limiting port.

use std::time::Duration;

/// Per-key request throttle.
///
/// Checks are synchronous so middleware can decide before the request
/// reaches a handler.
pub trait RateLimiter: Send + Sync {
    /// Record a request for `key` and report whether it may proceed.
    fn check(&self, key: &str) -> RateLimitResult;
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// How long until the key may retry; zero when allowed.
    pub retry_after: Duration,
}
