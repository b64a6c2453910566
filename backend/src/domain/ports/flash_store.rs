//! Port for the one-time flash message store.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{FlashMessage, FlashToken};

use super::define_port_error;

define_port_error! {
    /// Errors raised by flash store adapters.
    pub enum FlashStoreError {
        /// The backing store failed.
        Store { message: String } =>
            "flash store failed: {message}",
        /// A stored payload could not be encoded or decoded.
        Serialization { message: String } =>
            "flash payload serialization failed: {message}",
    }
}

/// Port for short-lived, read-once messages keyed by an opaque token.
///
/// `take` deletes on read: a token yields its message at most once. Expired
/// entries behave as absent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FlashStore: Send + Sync {
    /// Store `message` under `token` for `ttl`.
    async fn put(
        &self,
        token: &FlashToken,
        message: &FlashMessage,
        ttl: Duration,
    ) -> Result<(), FlashStoreError>;

    /// Read and delete the message under `token`, if present and fresh.
    async fn take(&self, token: &FlashToken) -> Result<Option<FlashMessage>, FlashStoreError>;
}

/// Fixture store that accepts writes and never yields a message.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureFlashStore;

#[async_trait]
impl FlashStore for FixtureFlashStore {
    async fn put(
        &self,
        _token: &FlashToken,
        _message: &FlashMessage,
        _ttl: Duration,
    ) -> Result<(), FlashStoreError> {
        Ok(())
    }

    async fn take(&self, _token: &FlashToken) -> Result<Option<FlashMessage>, FlashStoreError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_store_discards_writes() {
        let store = FixtureFlashStore;
        let token = FlashToken::generate();
        store
            .put(&token, &FlashMessage::Success, FlashMessage::Success.ttl())
            .await
            .expect("put succeeds");
        assert!(store.take(&token).await.expect("take succeeds").is_none());
    }
}
