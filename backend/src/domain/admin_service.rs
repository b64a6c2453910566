//! Admin list/detail/delete service with read-through caching.
//!
//! Query results are cached per page (plus separately cached totals) and per
//! submission id; any write invalidates the whole list group rather than
//! individual pages. The cache is advisory, so cache failures degrade to
//! repository reads instead of failing the request.

use std::sync::Arc;
use std::time::Duration;

use pagination::{PageEnvelope, PageRequest};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use crate::domain::ports::{cache_groups, CacheStore, FeedbackRepository, FeedbackRepositoryError};
use crate::domain::{Error, FeedbackId, FeedbackSubmission, ReadStatus};

/// Lifetime of cached list pages and the total count.
const LIST_TTL: Duration = Duration::from_secs(3600);
/// Lifetime of cached detail rows.
const DETAIL_TTL: Duration = Duration::from_secs(3600);
/// Lifetime of the cached unread count backing the admin badge.
const UNREAD_TTL: Duration = Duration::from_secs(300);

const TOTAL_COUNT_KEY: &str = "total_count";
const UNREAD_COUNT_KEY: &str = "unread_count";

fn page_key(request: PageRequest) -> String {
    format!("page_{}_per_{}", request.page(), request.per_page())
}

fn submission_key(id: FeedbackId) -> String {
    format!("submission_{id}")
}

fn map_repository_error(error: FeedbackRepositoryError) -> Error {
    Error::internal(format!("feedback repository error: {error}"))
}

/// Driving service for the admin review surface.
#[derive(Clone)]
pub struct AdminFeedbackService {
    repository: Arc<dyn FeedbackRepository>,
    cache: Arc<dyn CacheStore>,
}

impl AdminFeedbackService {
    /// Create the service over its collaborators.
    pub fn new(repository: Arc<dyn FeedbackRepository>, cache: Arc<dyn CacheStore>) -> Self {
        Self { repository, cache }
    }

    /// Fetch one page of submissions, newest first, with totals.
    ///
    /// # Errors
    ///
    /// Fails with an internal error when the repository is unavailable.
    pub async fn list_page(
        &self,
        request: PageRequest,
    ) -> Result<PageEnvelope<FeedbackSubmission>, Error> {
        let total = self.total_count().await?;
        let key = page_key(request);

        if let Some(rows) = self
            .cache_get::<Vec<FeedbackSubmission>>(cache_groups::LIST, &key)
            .await
        {
            return Ok(PageEnvelope::new(rows, request, total));
        }

        let rows = self
            .repository
            .list_page(request.offset(), request.limit())
            .await
            .map_err(map_repository_error)?;
        self.cache_set(cache_groups::LIST, &key, &rows, LIST_TTL).await;
        Ok(PageEnvelope::new(rows, request, total))
    }

    /// Number of submissions still unread, cached briefly for the admin
    /// badge.
    ///
    /// # Errors
    ///
    /// Fails with an internal error when the repository is unavailable.
    pub async fn unread_count(&self) -> Result<u64, Error> {
        if let Some(count) = self.cache_get::<u64>(cache_groups::LIST, UNREAD_COUNT_KEY).await {
            return Ok(count);
        }
        let count = self
            .repository
            .unread_count()
            .await
            .map_err(map_repository_error)?;
        self.cache_set(cache_groups::LIST, UNREAD_COUNT_KEY, &count, UNREAD_TTL)
            .await;
        Ok(count)
    }

    /// Fetch a single submission, marking it read on first view.
    ///
    /// The read flag only ever flips unread → read; later views are no-ops
    /// on it. Marking read drops the row's detail cache entry and flushes
    /// the list group so status columns refresh.
    ///
    /// # Errors
    ///
    /// - [`ErrorCode::NotFound`](crate::domain::ErrorCode::NotFound) when
    ///   the id matches nothing.
    /// - Internal error when the repository is unavailable.
    pub async fn get_and_mark_read(&self, id: FeedbackId) -> Result<FeedbackSubmission, Error> {
        let key = submission_key(id);
        let mut submission = match self
            .cache_get::<FeedbackSubmission>(cache_groups::DETAIL, &key)
            .await
        {
            Some(found) => found,
            None => {
                let found = self
                    .repository
                    .find_by_id(id)
                    .await
                    .map_err(map_repository_error)?
                    .ok_or_else(|| Error::not_found("Feedback submission not found"))?;
                self.cache_set(cache_groups::DETAIL, &key, &found, DETAIL_TTL)
                    .await;
                found
            }
        };

        if submission.read_status.is_unread() {
            self.repository
                .mark_read(id)
                .await
                .map_err(map_repository_error)?;
            submission.read_status = ReadStatus::Read;
            self.cache_delete(cache_groups::DETAIL, &key).await;
            self.cache_flush(cache_groups::LIST).await;
        }

        Ok(submission)
    }

    /// Delete a submission and renumber the survivors, then invalidate the
    /// deleted id's detail entry and the whole list group.
    ///
    /// # Errors
    ///
    /// Fails with an internal error when the transaction rolls back; no
    /// partial renumbering is observable.
    pub async fn delete(&self, id: FeedbackId) -> Result<(), Error> {
        self.repository.delete_and_reindex(id).await.map_err(|e| {
            error!(error = %e, %id, "delete/reindex failed");
            map_repository_error(e)
        })?;
        self.cache_delete(cache_groups::DETAIL, &submission_key(id)).await;
        self.cache_flush(cache_groups::LIST).await;
        Ok(())
    }

    async fn total_count(&self) -> Result<u64, Error> {
        if let Some(count) = self.cache_get::<u64>(cache_groups::LIST, TOTAL_COUNT_KEY).await {
            return Ok(count);
        }
        let count = self.repository.count().await.map_err(map_repository_error)?;
        self.cache_set(cache_groups::LIST, TOTAL_COUNT_KEY, &count, LIST_TTL)
            .await;
        Ok(count)
    }

    async fn cache_get<T: DeserializeOwned>(&self, group: &str, key: &str) -> Option<T> {
        match self.cache.get(group, key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!(error = %e, group, key, "discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, group, key, "cache read failed");
                None
            }
        }
    }

    async fn cache_set<T: Serialize>(&self, group: &str, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_value(value) {
            Ok(encoded) => {
                if let Err(e) = self.cache.set(group, key, encoded, ttl).await {
                    warn!(error = %e, group, key, "cache write failed");
                }
            }
            Err(e) => warn!(error = %e, group, key, "cache payload not serializable"),
        }
    }

    async fn cache_delete(&self, group: &str, key: &str) {
        if let Err(e) = self.cache.delete(group, key).await {
            warn!(error = %e, group, key, "cache delete failed");
        }
    }

    async fn cache_flush(&self, group: &str) {
        if let Err(e) = self.cache.flush_group(group).await {
            warn!(error = %e, group, "cache group flush failed");
        }
    }
}
