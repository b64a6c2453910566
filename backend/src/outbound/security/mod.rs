//! Action-scoped form tokens derived from a process secret.
//!
//! Implements the `FormTokenService` port without per-token storage: a token
//! is the truncated SHA-256 of `secret ‖ action ‖ tick`, where the tick is a
//! coarse time bucket of half the configured lifetime. Verification accepts
//! the current and previous tick, so a token stays valid for between half
//! the lifetime and the full lifetime.

use std::sync::Arc;
use std::time::Duration;

use mockable::{Clock, DefaultClock};
use sha2::{Digest, Sha256};

use crate::domain::ports::FormTokenService;

/// Stateless token service implementing the anti-forgery port.
pub struct Sha256FormTokenService {
    secret: Vec<u8>,
    half_life_secs: i64,
    clock: Arc<dyn Clock>,
}

impl Sha256FormTokenService {
    /// Default full validity horizon of a token.
    pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(24 * 3600);

    /// Create a service with the default 24-hour lifetime.
    pub fn new(secret: impl Into<Vec<u8>>, clock: Arc<dyn Clock>) -> Self {
        Self::with_lifetime(secret, Self::DEFAULT_LIFETIME, clock)
    }

    /// Create a service on the system clock.
    pub fn with_default_clock(secret: impl Into<Vec<u8>>) -> Self {
        Self::new(secret, Arc::new(DefaultClock))
    }

    /// Create a service with a custom token lifetime.
    pub fn with_lifetime(
        secret: impl Into<Vec<u8>>,
        lifetime: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let half_life_secs = i64::try_from(lifetime.as_secs() / 2).unwrap_or(i64::MAX).max(1);
        Self {
            secret: secret.into(),
            half_life_secs,
            clock,
        }
    }

    fn current_tick(&self) -> i64 {
        self.clock.utc().timestamp().div_euclid(self.half_life_secs)
    }

    fn derive(&self, action: &str, tick: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(action.as_bytes());
        hasher.update(tick.to_be_bytes());
        let digest = hasher.finalize();
        // Ten bytes of digest keep the query strings short while leaving
        // an 80-bit forgery target.
        hex::encode(digest.iter().take(10).copied().collect::<Vec<u8>>())
    }
}

impl FormTokenService for Sha256FormTokenService {
    fn issue(&self, action: &str) -> String {
        self.derive(action, self.current_tick())
    }

    fn verify(&self, token: &str, action: &str) -> bool {
        let tick = self.current_tick();
        token == self.derive(action, tick) || token == self.derive(action, tick - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{delete_action, SUBMIT_FEEDBACK_ACTION};
    use crate::outbound::test_clock::TestClock;

    const LIFETIME: Duration = Duration::from_secs(24 * 3600);

    fn service(clock: Arc<TestClock>) -> Sha256FormTokenService {
        Sha256FormTokenService::with_lifetime(b"test-secret".to_vec(), LIFETIME, clock)
    }

    #[test]
    fn issued_tokens_verify_for_their_action() {
        let service = service(Arc::new(TestClock::new()));
        let token = service.issue(SUBMIT_FEEDBACK_ACTION);
        assert!(service.verify(&token, SUBMIT_FEEDBACK_ACTION));
    }

    #[test]
    fn tokens_are_action_scoped() {
        let service = service(Arc::new(TestClock::new()));
        let token = service.issue(&delete_action("3"));
        assert!(service.verify(&token, &delete_action("3")));
        assert!(!service.verify(&token, &delete_action("4")));
        assert!(!service.verify(&token, SUBMIT_FEEDBACK_ACTION));
    }

    #[test]
    fn tokens_survive_one_tick_rollover_but_not_two() {
        let clock = Arc::new(TestClock::new());
        let service = service(clock.clone());
        let token = service.issue(SUBMIT_FEEDBACK_ACTION);

        // Into the next tick: previous-tick grace still accepts it.
        clock.advance(LIFETIME / 2);
        assert!(service.verify(&token, SUBMIT_FEEDBACK_ACTION));

        // Two ticks on, the token is dead.
        clock.advance(LIFETIME / 2);
        assert!(!service.verify(&token, SUBMIT_FEEDBACK_ACTION));
    }

    #[test]
    fn different_secrets_produce_unrelated_tokens() {
        let clock = Arc::new(TestClock::new());
        let first = Sha256FormTokenService::with_lifetime(
            b"secret-a".to_vec(),
            LIFETIME,
            clock.clone(),
        );
        let second =
            Sha256FormTokenService::with_lifetime(b"secret-b".to_vec(), LIFETIME, clock);

        let token = first.issue(SUBMIT_FEEDBACK_ACTION);
        assert!(!second.verify(&token, SUBMIT_FEEDBACK_ACTION));
    }

    #[test]
    fn tokens_are_twenty_hex_characters() {
        let service = service(Arc::new(TestClock::new()));
        let token = service.issue(SUBMIT_FEEDBACK_ACTION);
        assert_eq!(token.len(), 20);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
