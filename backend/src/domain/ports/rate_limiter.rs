//! Port for submission rate limiting.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by rate limiter adapters.
    pub enum RateLimiterError {
        /// The counter store failed.
        Store { message: String } =>
            "rate limiter store failed: {message}",
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The attempt is within the window's budget.
    Allowed,
    /// The window's budget is exhausted.
    Denied,
}

impl RateLimitDecision {
    /// True when the attempt may proceed.
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Port deciding whether a client may submit again.
///
/// Counting is advisory: counters may be lost (resetting the window
/// silently) and are not coordinated across instances. Callers with no
/// resolvable client key must not consult the limiter at all — absence of a
/// key fail-opens in the pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record one attempt for `client_key` and decide whether it may proceed.
    async fn check(&self, client_key: &str) -> Result<RateLimitDecision, RateLimiterError>;
}

/// Fixture limiter that always allows.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRateLimiter;

#[async_trait]
impl RateLimiter for FixtureRateLimiter {
    async fn check(&self, _client_key: &str) -> Result<RateLimitDecision, RateLimiterError> {
        Ok(RateLimitDecision::Allowed)
    }
}
