//! Fixed-window submission rate limiter.
//!
//! Implements the `RateLimiter` port with per-key counters held in process
//! memory. The window is anchored at the first attempt: later attempts in
//! the same window increment the counter, and once the limit is reached
//! further attempts are denied without incrementing. Counters are advisory —
//! a restart resets every window silently, and windows are not coordinated
//! across instances. A boundary burst can therefore reach twice the limit;
//! that is accepted, not a bug to fix here.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};

use crate::domain::ports::{RateLimitDecision, RateLimiter, RateLimiterError};

#[derive(Debug, Clone)]
struct Counter {
    count: u32,
    window_started_at: DateTime<Utc>,
}

/// Per-client fixed-window counter implementing the rate limiter port.
pub struct FixedWindowRateLimiter {
    clock: Arc<dyn Clock>,
    limit: u32,
    window: chrono::Duration,
    counters: Mutex<HashMap<String, Counter>>,
}

impl FixedWindowRateLimiter {
    /// Default attempts allowed per window.
    pub const DEFAULT_LIMIT: u32 = 25;
    /// Default window length.
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(3600);

    /// Create a limiter with the default 25-per-hour budget.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_limits(clock, Self::DEFAULT_LIMIT, Self::DEFAULT_WINDOW)
    }

    /// Create a limiter on the system clock with the default budget.
    pub fn with_default_clock() -> Self {
        Self::new(Arc::new(DefaultClock))
    }

    /// Create a limiter with a custom budget.
    pub fn with_limits(clock: Arc<dyn Clock>, limit: u32, window: Duration) -> Self {
        Self {
            clock,
            limit,
            window: chrono::Duration::from_std(window)
                .unwrap_or_else(|_| chrono::Duration::seconds(3600)),
            counters: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateLimiter for FixedWindowRateLimiter {
    async fn check(&self, client_key: &str) -> Result<RateLimitDecision, RateLimiterError> {
        let now = self.clock.utc();
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| RateLimiterError::store("counter lock poisoned"))?;

        if let Some(counter) = counters.get_mut(client_key) {
            if now - counter.window_started_at < self.window {
                if counter.count >= self.limit {
                    return Ok(RateLimitDecision::Denied);
                }
                counter.count += 1;
                return Ok(RateLimitDecision::Allowed);
            }
        }

        // New window for this key; drop every expired counter while here so
        // the map does not grow with one-off clients.
        let window = self.window;
        counters.retain(|_, counter| now - counter.window_started_at < window);
        counters.insert(
            client_key.to_owned(),
            Counter {
                count: 1,
                window_started_at: now,
            },
        );
        Ok(RateLimitDecision::Allowed)
    }
}
