//! Port for feedback submission persistence.
//!
//! The [`FeedbackRepository`] trait is the contract for the single
//! `feedback_submissions` table, including the reindexing delete that keeps
//! ids densely sequential.

use async_trait::async_trait;

use crate::domain::{FeedbackId, FeedbackSubmission, NewFeedbackSubmission};

use super::define_port_error;

define_port_error! {
    /// Errors raised by feedback repository adapters.
    pub enum FeedbackRepositoryError {
        /// Connection could not be established or checked out.
        Connection { message: String } =>
            "feedback repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "feedback repository query failed: {message}",
        /// The delete/reindex transaction failed and was rolled back.
        Transaction { message: String } =>
            "feedback repository transaction rolled back: {message}",
    }
}

/// Port for feedback submission storage.
///
/// # Id semantics
///
/// Inserts take the next sequence value; [`delete_and_reindex`] renumbers
/// every surviving row to a dense `1..N` sequence in creation order and
/// resets the sequence to `N + 1`. Immediately after a delete the ids are
/// therefore contiguous. Two concurrent deletes are serialized by the storage
/// engine, not by this contract.
///
/// [`delete_and_reindex`]: FeedbackRepository::delete_and_reindex
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    /// Insert a validated submission and return the stored row.
    async fn insert(
        &self,
        submission: &NewFeedbackSubmission,
    ) -> Result<FeedbackSubmission, FeedbackRepositoryError>;

    /// Fetch a single row, or `None` when the id matches nothing.
    async fn find_by_id(
        &self,
        id: FeedbackId,
    ) -> Result<Option<FeedbackSubmission>, FeedbackRepositoryError>;

    /// Fetch one page of rows ordered newest first.
    async fn list_page(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<FeedbackSubmission>, FeedbackRepositoryError>;

    /// Total number of stored rows.
    async fn count(&self) -> Result<u64, FeedbackRepositoryError>;

    /// Number of rows still unread.
    async fn unread_count(&self) -> Result<u64, FeedbackRepositoryError>;

    /// Flip the read flag to read. A no-op for already-read or missing rows.
    async fn mark_read(&self, id: FeedbackId) -> Result<(), FeedbackRepositoryError>;

    /// Delete `id` and renumber all surviving rows to `1..N` in creation
    /// order, atomically; the id sequence is reset to `N + 1`.
    ///
    /// Succeeds even when `id` matches no row (the survivors are still
    /// renumbered).
    async fn delete_and_reindex(&self, id: FeedbackId) -> Result<(), FeedbackRepositoryError>;
}

/// Fixture implementation behaving like an empty table.
///
/// Lookups miss, counts are zero, and mutations succeed without effect. Use
/// it in tests and wiring where repository behaviour is not under test.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureFeedbackRepository;

#[async_trait]
impl FeedbackRepository for FixtureFeedbackRepository {
    async fn insert(
        &self,
        submission: &NewFeedbackSubmission,
    ) -> Result<FeedbackSubmission, FeedbackRepositoryError> {
        Ok(FeedbackSubmission {
            id: FeedbackId::new(1).map_err(|e| FeedbackRepositoryError::query(e.to_string()))?,
            name: submission.name.clone(),
            email: submission.email.clone(),
            message: submission.message.clone(),
            created_at: chrono::Utc::now(),
            read_status: crate::domain::ReadStatus::Unread,
        })
    }

    async fn find_by_id(
        &self,
        _id: FeedbackId,
    ) -> Result<Option<FeedbackSubmission>, FeedbackRepositoryError> {
        Ok(None)
    }

    async fn list_page(
        &self,
        _offset: i64,
        _limit: i64,
    ) -> Result<Vec<FeedbackSubmission>, FeedbackRepositoryError> {
        Ok(Vec::new())
    }

    async fn count(&self) -> Result<u64, FeedbackRepositoryError> {
        Ok(0)
    }

    async fn unread_count(&self) -> Result<u64, FeedbackRepositoryError> {
        Ok(0)
    }

    async fn mark_read(&self, _id: FeedbackId) -> Result<(), FeedbackRepositoryError> {
        Ok(())
    }

    async fn delete_and_reindex(&self, _id: FeedbackId) -> Result<(), FeedbackRepositoryError> {
        Ok(())
    }
}

/// In-memory repository with the full table semantics, including the
/// reindexing delete. Test-only: behaviour tests for the services and
/// handlers run against it instead of PostgreSQL.
#[cfg(test)]
#[derive(Debug)]
pub struct MemoryFeedbackRepository {
    state: std::sync::Mutex<MemoryState>,
}

#[cfg(test)]
#[derive(Debug)]
struct MemoryState {
    rows: Vec<FeedbackSubmission>,
    next_id: i32,
}

#[cfg(test)]
impl MemoryFeedbackRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            state: std::sync::Mutex::new(MemoryState {
                rows: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Snapshot the ids currently stored, in creation order.
    pub fn ids_in_creation_order(&self) -> Vec<i32> {
        let state = self.state.lock().expect("repository lock");
        let mut rows: Vec<_> = state
            .rows
            .iter()
            .map(|row| (row.created_at, row.id.get()))
            .collect();
        rows.sort();
        rows.into_iter().map(|(_, id)| id).collect()
    }
}

#[cfg(test)]
#[async_trait]
impl FeedbackRepository for MemoryFeedbackRepository {
    async fn insert(
        &self,
        submission: &NewFeedbackSubmission,
    ) -> Result<FeedbackSubmission, FeedbackRepositoryError> {
        let mut state = self.state.lock().expect("repository lock");
        let id = FeedbackId::new(state.next_id)
            .map_err(|e| FeedbackRepositoryError::query(e.to_string()))?;
        state.next_id += 1;
        let row = FeedbackSubmission {
            id,
            name: submission.name.clone(),
            email: submission.email.clone(),
            message: submission.message.clone(),
            // Creation order must be strictly increasing even within one
            // clock tick, so derive the timestamp from the insert sequence.
            created_at: chrono::DateTime::from_timestamp(1_700_000_000 + i64::from(id.get()), 0)
                .expect("valid timestamp"),
            read_status: crate::domain::ReadStatus::Unread,
        };
        state.rows.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(
        &self,
        id: FeedbackId,
    ) -> Result<Option<FeedbackSubmission>, FeedbackRepositoryError> {
        let state = self.state.lock().expect("repository lock");
        Ok(state.rows.iter().find(|row| row.id == id).cloned())
    }

    async fn list_page(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<FeedbackSubmission>, FeedbackRepositoryError> {
        let state = self.state.lock().expect("repository lock");
        let mut rows = state.rows.clone();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn count(&self) -> Result<u64, FeedbackRepositoryError> {
        let state = self.state.lock().expect("repository lock");
        Ok(state.rows.len() as u64)
    }

    async fn unread_count(&self) -> Result<u64, FeedbackRepositoryError> {
        let state = self.state.lock().expect("repository lock");
        Ok(state
            .rows
            .iter()
            .filter(|row| row.read_status.is_unread())
            .count() as u64)
    }

    async fn mark_read(&self, id: FeedbackId) -> Result<(), FeedbackRepositoryError> {
        let mut state = self.state.lock().expect("repository lock");
        if let Some(row) = state.rows.iter_mut().find(|row| row.id == id) {
            row.read_status = crate::domain::ReadStatus::Read;
        }
        Ok(())
    }

    async fn delete_and_reindex(&self, id: FeedbackId) -> Result<(), FeedbackRepositoryError> {
        let mut state = self.state.lock().expect("repository lock");
        state.rows.retain(|row| row.id != id);
        state.rows.sort_by_key(|row| (row.created_at, row.id));
        for (index, row) in state.rows.iter_mut().enumerate() {
            let new_id = i32::try_from(index + 1)
                .map_err(|e| FeedbackRepositoryError::transaction(e.to_string()))?;
            row.id = FeedbackId::new(new_id)
                .map_err(|e| FeedbackRepositoryError::transaction(e.to_string()))?;
        }
        state.next_id = i32::try_from(state.rows.len() + 1)
            .map_err(|e| FeedbackRepositoryError::transaction(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn submission(n: u32) -> NewFeedbackSubmission {
        NewFeedbackSubmission {
            name: format!("Visitor {n}"),
            email: format!("visitor{n}@example.com"),
            message: format!("message {n}"),
        }
    }

    #[tokio::test]
    async fn fixture_repository_behaves_like_an_empty_table() {
        let repo = FixtureFeedbackRepository;
        assert!(repo
            .find_by_id(FeedbackId::new(1).expect("positive"))
            .await
            .expect("lookup succeeds")
            .is_none());
        assert_eq!(repo.count().await.expect("count succeeds"), 0);
    }

    #[tokio::test]
    async fn inserts_assign_sequential_ids() {
        let repo = MemoryFeedbackRepository::new();
        for n in 1..=3 {
            let row = repo.insert(&submission(n)).await.expect("insert succeeds");
            assert_eq!(row.id.get(), i32::try_from(n).expect("small"));
            assert!(row.read_status.is_unread());
        }
    }

    #[rstest]
    #[case(3, vec![1, 2, 3, 4])]
    #[case(1, vec![1, 2, 3, 4])]
    #[case(5, vec![1, 2, 3, 4])]
    #[tokio::test]
    async fn delete_renumbers_survivors_densely(
        #[case] deleted: i32,
        #[case] expected_ids: Vec<i32>,
    ) {
        let repo = MemoryFeedbackRepository::new();
        for n in 1..=5 {
            repo.insert(&submission(n)).await.expect("insert succeeds");
        }

        repo.delete_and_reindex(FeedbackId::new(deleted).expect("positive"))
            .await
            .expect("delete succeeds");

        assert_eq!(repo.ids_in_creation_order(), expected_ids);

        // The next insert receives N, closing the sequence back up.
        let next = repo.insert(&submission(6)).await.expect("insert succeeds");
        assert_eq!(next.id.get(), 5);
    }

    #[tokio::test]
    async fn delete_preserves_creation_order_of_survivors() {
        let repo = MemoryFeedbackRepository::new();
        for n in 1..=4 {
            repo.insert(&submission(n)).await.expect("insert succeeds");
        }

        repo.delete_and_reindex(FeedbackId::new(2).expect("positive"))
            .await
            .expect("delete succeeds");

        let id1 = repo
            .find_by_id(FeedbackId::new(2).expect("positive"))
            .await
            .expect("lookup succeeds")
            .expect("row exists");
        // The row created third now sits at id 2.
        assert_eq!(id1.name, "Visitor 3");
    }

    #[tokio::test]
    async fn deleting_a_missing_id_still_succeeds() {
        let repo = MemoryFeedbackRepository::new();
        repo.insert(&submission(1)).await.expect("insert succeeds");
        repo.delete_and_reindex(FeedbackId::new(42).expect("positive"))
            .await
            .expect("delete succeeds");
        assert_eq!(repo.count().await.expect("count succeeds"), 1);
    }
}
