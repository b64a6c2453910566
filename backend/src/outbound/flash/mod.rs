//! In-process one-time flash message store.
//!
//! Implements the `FlashStore` port: messages live under an opaque token for
//! a short TTL and are deleted on first read, so a redirect token can be
//! consumed at most once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};

use crate::domain::ports::{FlashStore, FlashStoreError};
use crate::domain::{FlashMessage, FlashToken};

#[derive(Debug, Clone)]
struct Entry {
    message: FlashMessage,
    expires_at: DateTime<Utc>,
}

/// Mutex-guarded map implementing the read-once flash store port.
pub struct MemoryFlashStore {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<FlashToken, Entry>>,
}

impl MemoryFlashStore {
    /// Create a store reading time from the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Create a store on the system clock.
    pub fn with_default_clock() -> Self {
        Self::new(Arc::new(DefaultClock))
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<FlashToken, Entry>>, FlashStoreError> {
        self.entries
            .lock()
            .map_err(|_| FlashStoreError::store("flash lock poisoned"))
    }
}

#[async_trait]
impl FlashStore for MemoryFlashStore {
    async fn put(
        &self,
        token: &FlashToken,
        message: &FlashMessage,
        ttl: Duration,
    ) -> Result<(), FlashStoreError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| FlashStoreError::store(format!("ttl out of range: {e}")))?;
        let expires_at = self.clock.utc() + ttl;
        let mut entries = self.lock()?;
        entries.insert(
            token.clone(),
            Entry {
                message: message.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn take(&self, token: &FlashToken) -> Result<Option<FlashMessage>, FlashStoreError> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        // Read-once: the entry goes away whether it was fresh or expired.
        Ok(entries
            .remove(token)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::flash::{ERROR_TTL, SUCCESS_TTL};
    use crate::domain::OldInput;
    use crate::outbound::test_clock::TestClock;

    #[tokio::test]
    async fn messages_are_read_once() {
        let store = MemoryFlashStore::with_default_clock();
        let token = FlashToken::generate();
        store
            .put(&token, &FlashMessage::Success, SUCCESS_TTL)
            .await
            .expect("put succeeds");

        let first = store.take(&token).await.expect("take succeeds");
        assert_eq!(first, Some(FlashMessage::Success));

        let second = store.take(&token).await.expect("take succeeds");
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn expired_messages_are_absent() {
        let clock = Arc::new(TestClock::new());
        let store = MemoryFlashStore::new(clock.clone());
        let token = FlashToken::generate();
        store
            .put(&token, &FlashMessage::Success, SUCCESS_TTL)
            .await
            .expect("put succeeds");

        clock.advance(SUCCESS_TTL + Duration::from_secs(1));
        assert_eq!(store.take(&token).await.expect("take succeeds"), None);
    }

    #[tokio::test]
    async fn validation_payloads_round_trip() {
        let store = MemoryFlashStore::with_default_clock();
        let token = FlashToken::generate();
        let message = FlashMessage::ValidationFailure {
            errors: vec!["Please provide a valid name.".to_owned()],
            old_input: OldInput {
                name: "  ".to_owned(),
                email: "jane@example.com".to_owned(),
                message: "hi".to_owned(),
            },
        };
        store
            .put(&token, &message, ERROR_TTL)
            .await
            .expect("put succeeds");

        assert_eq!(store.take(&token).await.expect("take succeeds"), Some(message));
    }
}
