//! Port for the grouped read-through cache.
//!
//! Entries live in named groups so a write can invalidate a whole family of
//! keys (every cached list page, for example) with one `flush_group` call.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;

/// Cache group names used by the query layer.
pub mod cache_groups {
    /// Single-submission detail entries, keyed `submission_{id}`.
    pub const DETAIL: &str = "feedback_submissions";
    /// List pages and counts, keyed `page_{n}_per_{size}`, `total_count`,
    /// `unread_count`.
    pub const LIST: &str = "feedback_submissions_list";
}

define_port_error! {
    /// Errors raised by cache store adapters.
    pub enum CacheStoreError {
        /// The backing store failed.
        Store { message: String } =>
            "cache store failed: {message}",
        /// A cached payload could not be encoded or decoded.
        Serialization { message: String } =>
            "cache payload serialization failed: {message}",
    }
}

/// Port for a TTL cache with group-level invalidation.
///
/// The cache is advisory: staleness within an entry's TTL is acceptable, and
/// entries may vanish at any time. Values are JSON so adapters stay agnostic
/// of what the query layer stores.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the value under `group`/`key`, if present and fresh.
    async fn get(&self, group: &str, key: &str) -> Result<Option<Value>, CacheStoreError>;

    /// Store `value` under `group`/`key` for `ttl`.
    async fn set(
        &self,
        group: &str,
        key: &str,
        value: Value,
        ttl: Duration,
    ) -> Result<(), CacheStoreError>;

    /// Drop the entry under `group`/`key`, if any.
    async fn delete(&self, group: &str, key: &str) -> Result<(), CacheStoreError>;

    /// Drop every entry in `group`.
    async fn flush_group(&self, group: &str) -> Result<(), CacheStoreError>;
}

/// Fixture cache that always misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCacheStore;

#[async_trait]
impl CacheStore for FixtureCacheStore {
    async fn get(&self, _group: &str, _key: &str) -> Result<Option<Value>, CacheStoreError> {
        Ok(None)
    }

    async fn set(
        &self,
        _group: &str,
        _key: &str,
        _value: Value,
        _ttl: Duration,
    ) -> Result<(), CacheStoreError> {
        Ok(())
    }

    async fn delete(&self, _group: &str, _key: &str) -> Result<(), CacheStoreError> {
        Ok(())
    }

    async fn flush_group(&self, _group: &str) -> Result<(), CacheStoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fixture_cache_always_misses() {
        let cache = FixtureCacheStore;
        cache
            .set(cache_groups::LIST, "total_count", json!(5), Duration::from_secs(60))
            .await
            .expect("set succeeds");
        assert!(cache
            .get(cache_groups::LIST, "total_count")
            .await
            .expect("get succeeds")
            .is_none());
    }
}
