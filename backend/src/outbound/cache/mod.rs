//! In-process grouped TTL cache.
//!
//! Implements the `CacheStore` port over a mutex-guarded map. The cached
//! state is advisory and per-process: losing it costs a repository read, not
//! correctness, so no external cache service is involved. Expiry is lazy —
//! stale entries are dropped when they are next read.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use serde_json::Value;

use crate::domain::ports::{CacheStore, CacheStoreError};

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: DateTime<Utc>,
}

/// Mutex-guarded map implementing the grouped TTL cache port.
pub struct MemoryCacheStore {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<(String, String), Entry>>,
}

impl MemoryCacheStore {
    /// Create a cache reading time from the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Create a cache on the system clock.
    pub fn with_default_clock() -> Self {
        Self::new(Arc::new(DefaultClock))
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), Entry>>, CacheStoreError> {
        self.entries
            .lock()
            .map_err(|_| CacheStoreError::store("cache lock poisoned"))
    }
}

fn expiry(
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<DateTime<Utc>, CacheStoreError> {
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| CacheStoreError::store(format!("ttl out of range: {e}")))?;
    Ok(now + ttl)
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, group: &str, key: &str) -> Result<Option<Value>, CacheStoreError> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        let map_key = (group.to_owned(), key.to_owned());
        match entries.get(&map_key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(&map_key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        group: &str,
        key: &str,
        value: Value,
        ttl: Duration,
    ) -> Result<(), CacheStoreError> {
        let expires_at = expiry(self.clock.utc(), ttl)?;
        let mut entries = self.lock()?;
        entries.insert((group.to_owned(), key.to_owned()), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, group: &str, key: &str) -> Result<(), CacheStoreError> {
        let mut entries = self.lock()?;
        entries.remove(&(group.to_owned(), key.to_owned()));
        Ok(())
    }

    async fn flush_group(&self, group: &str) -> Result<(), CacheStoreError> {
        let mut entries = self.lock()?;
        entries.retain(|(entry_group, _), _| entry_group != group);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::cache_groups;
    use crate::outbound::test_clock::TestClock;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = MemoryCacheStore::with_default_clock();
        cache
            .set(cache_groups::LIST, "total_count", json!(7), TTL)
            .await
            .expect("set succeeds");

        let value = cache
            .get(cache_groups::LIST, "total_count")
            .await
            .expect("get succeeds");
        assert_eq!(value, Some(json!(7)));
    }

    #[tokio::test]
    async fn entries_expire_after_their_ttl() {
        let clock = Arc::new(TestClock::new());
        let cache = MemoryCacheStore::new(clock.clone());
        cache
            .set(cache_groups::LIST, "total_count", json!(7), TTL)
            .await
            .expect("set succeeds");

        clock.advance(TTL + Duration::from_secs(1));
        let value = cache
            .get(cache_groups::LIST, "total_count")
            .await
            .expect("get succeeds");
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn flush_group_leaves_other_groups_intact() {
        let cache = MemoryCacheStore::with_default_clock();
        cache
            .set(cache_groups::LIST, "page_1_per_15", json!([1]), TTL)
            .await
            .expect("set succeeds");
        cache
            .set(cache_groups::LIST, "total_count", json!(1), TTL)
            .await
            .expect("set succeeds");
        cache
            .set(cache_groups::DETAIL, "submission_1", json!({"id": 1}), TTL)
            .await
            .expect("set succeeds");

        cache
            .flush_group(cache_groups::LIST)
            .await
            .expect("flush succeeds");

        assert_eq!(
            cache
                .get(cache_groups::LIST, "page_1_per_15")
                .await
                .expect("get succeeds"),
            None
        );
        assert_eq!(
            cache
                .get(cache_groups::LIST, "total_count")
                .await
                .expect("get succeeds"),
            None
        );
        assert!(cache
            .get(cache_groups::DETAIL, "submission_1")
            .await
            .expect("get succeeds")
            .is_some());
    }

    #[tokio::test]
    async fn delete_drops_a_single_entry() {
        let cache = MemoryCacheStore::with_default_clock();
        cache
            .set(cache_groups::DETAIL, "submission_2", json!({"id": 2}), TTL)
            .await
            .expect("set succeeds");

        cache
            .delete(cache_groups::DETAIL, "submission_2")
            .await
            .expect("delete succeeds");

        assert!(cache
            .get(cache_groups::DETAIL, "submission_2")
            .await
            .expect("get succeeds")
            .is_none());
    }
}
